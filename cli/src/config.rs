//! Configuration management

use containeye_core::{Error, HostAuth, HostCredential, Result, ScoringConfig};
use serde::{Deserialize, Serialize};

/// How commands reach remote hosts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// In-process SSH client with session reuse
    #[default]
    Native,
    /// The system `ssh` binary
    Openssh,
}

/// A host entry from the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub name: String,
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    /// Private key file; `~/` is expanded
    pub key_path: Option<String>,
    /// Secret holding the key passphrase (`VAR` or `VAR_FILE`)
    pub key_passphrase_env: Option<String>,
    /// Secret holding the login password (`VAR` or `VAR_FILE`)
    pub password_env: Option<String>,
}

fn default_port() -> u16 {
    22
}

impl HostConfig {
    /// Resolve secrets and build the credential
    pub fn to_credential(&self) -> Result<HostCredential> {
        let auth = if let Some(var) = &self.password_env {
            let password = get_secret(var).ok_or_else(|| {
                Error::ConfigError(format!(
                    "Host {}: password secret {} is not set",
                    self.name, var
                ))
            })?;
            HostAuth::Password { password }
        } else if let Some(path) = &self.key_path {
            let passphrase = match &self.key_passphrase_env {
                Some(var) => Some(get_secret(var).ok_or_else(|| {
                    Error::ConfigError(format!(
                        "Host {}: passphrase secret {} is not set",
                        self.name, var
                    ))
                })?),
                None => None,
            };
            HostAuth::KeyFile {
                path: expand_home(path),
                passphrase,
            }
        } else {
            HostAuth::DefaultKeys
        };

        Ok(HostCredential::new(&self.name, &self.address, self.port, &self.username).with_auth(auth))
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database URL
    pub database_url: String,

    pub transport: Transport,

    pub connect_timeout_secs: u64,

    pub strict_host_key_checking: bool,

    /// Cached paths loaded per host when the index bootstraps
    pub max_loaded_paths: usize,

    /// History entries kept per host and fed to suggestions
    pub history_limit: i64,

    pub hosts: Vec<HostConfig>,

    /// Suggestion ranking weights
    pub suggestions: ScoringConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/containeye.db".to_string(),
            transport: Transport::default(),
            connect_timeout_secs: 15,
            strict_host_key_checking: false,
            max_loaded_paths: 5000,
            history_limit: 200,
            hosts: Vec::new(),
            suggestions: ScoringConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            Self::load_from_file(p)
        } else {
            Self::load_from_env()
        }
    }

    /// Load from configuration file
    fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Load from environment variables
    fn load_from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(transport) = std::env::var("CONTAINEYE_TRANSPORT") {
            config.transport = match transport.to_lowercase().as_str() {
                "native" => Transport::Native,
                "openssh" => Transport::Openssh,
                other => {
                    return Err(Error::ConfigError(format!("Unknown transport: {}", other)));
                }
            };
        }

        if let Ok(hosts) = std::env::var("CONTAINEYE_HOSTS") {
            config.hosts = Self::parse_hosts(&hosts)?;
        }

        Ok(config)
    }

    /// Parse `name=user@address[:port]` entries separated by commas
    fn parse_hosts(input: &str) -> Result<Vec<HostConfig>> {
        input
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                let invalid = || Error::ConfigError(format!("Invalid host format: {}", s));

                let (name, target) = s.split_once('=').ok_or_else(invalid)?;
                let (username, endpoint) = target.split_once('@').ok_or_else(invalid)?;
                let (address, port) = match endpoint.rsplit_once(':') {
                    Some((address, port)) => {
                        (address, port.parse::<u16>().map_err(|_| invalid())?)
                    }
                    None => (endpoint, default_port()),
                };

                if name.is_empty() || username.is_empty() || address.is_empty() {
                    return Err(invalid());
                }

                Ok(HostConfig {
                    name: name.to_string(),
                    address: address.to_string(),
                    port,
                    username: username.to_string(),
                    key_path: None,
                    key_passphrase_env: None,
                    password_env: None,
                })
            })
            .collect()
    }

    /// Look up a configured host by name
    pub fn host(&self, name: &str) -> Result<HostCredential> {
        self.hosts
            .iter()
            .find(|h| h.name == name)
            .ok_or_else(|| Error::ConfigError(format!("Unknown host: {}", name)))?
            .to_credential()
    }
}

/// Get secret from environment variable or file
///
/// If `VAR_NAME` is not set, tries `VAR_NAME_FILE`, which should point to a
/// file containing the secret.
pub fn get_secret(var_name: &str) -> Option<String> {
    if let Ok(value) = std::env::var(var_name) {
        return Some(value);
    }

    let file_var = format!("{}_FILE", var_name);
    if let Ok(path) = std::env::var(&file_var) {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            return Some(contents.trim().to_string());
        }
    }

    None
}

fn expand_home(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => match std::env::var("HOME") {
            Ok(home) => format!("{}/{}", home.trim_end_matches('/'), rest),
            Err(_) => path.to_string(),
        },
        None => path.to_string(),
    }
}
