//! SSH session pool for remote command execution
//!
//! Keeps one authenticated session per host and reuses it across commands.
//! A command that fails on a cached session is retried once over a fresh
//! connection, which covers sessions dropped by the server or the network.

use async_ssh2_tokio::{client::Client, AuthMethod, ServerCheckMethod};
use async_trait::async_trait;
use containeye_core::{CommandRunner, Error, HostAuth, HostCredential, HostKey, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Cache of live SSH sessions keyed by host identity
pub struct SshSessionPool {
    sessions: Mutex<HashMap<HostKey, Arc<Client>>>,
    connect_timeout: Duration,
    strict_host_key_checking: bool,
}

impl SshSessionPool {
    pub fn new(connect_timeout: Duration, strict_host_key_checking: bool) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            connect_timeout,
            strict_host_key_checking,
        }
    }

    /// Get the cached session for a host or open a new one
    ///
    /// The map is not locked while connecting, so a slow host never stalls
    /// commands to other hosts. If two tasks race to connect the same host,
    /// the first session stored is kept.
    async fn session(&self, host: &HostCredential) -> Result<Arc<Client>> {
        let key = host.key();
        if let Some(client) = self.sessions.lock().await.get(&key) {
            return Ok(client.clone());
        }

        let client = Arc::new(self.connect(host).await?);
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.entry(key).or_insert(client).clone())
    }

    async fn invalidate(&self, key: &HostKey) {
        if self.sessions.lock().await.remove(key).is_some() {
            debug!(host = %key, "Dropped cached SSH session");
        }
    }

    async fn connect(&self, host: &HostCredential) -> Result<Client> {
        match tokio::time::timeout(self.connect_timeout, self.connect_any(host)).await {
            Err(_) => Err(Error::RemoteExecutionError(format!(
                "Connection to {} timed out after {} seconds",
                host.key(),
                self.connect_timeout.as_secs()
            ))),
            Ok(result) => result,
        }
    }

    async fn connect_any(&self, host: &HostCredential) -> Result<Client> {
        match &host.auth {
            HostAuth::Password { password } => {
                self.connect_with_auth(host, AuthMethod::with_password(password))
                    .await
            }
            HostAuth::KeyFile { path, passphrase } => {
                if !std::path::Path::new(path).exists() {
                    return Err(Error::RemoteExecutionError(format!(
                        "SSH key not found: {}",
                        path
                    )));
                }
                self.connect_with_auth(host, AuthMethod::with_key_file(path, passphrase.as_deref()))
                    .await
            }
            HostAuth::DefaultKeys => self.connect_with_default_keys(host).await,
        }
    }

    /// Try each key under `~/.ssh` until one is accepted
    async fn connect_with_default_keys(&self, host: &HostCredential) -> Result<Client> {
        let keys = list_available_keys();
        if keys.is_empty() {
            return Err(Error::RemoteExecutionError(
                "No SSH keys found in ~/.ssh and no credential configured".into(),
            ));
        }

        let mut last_error = None;
        for key_path in &keys {
            match self
                .connect_with_auth(host, AuthMethod::with_key_file(key_path, None))
                .await
            {
                Ok(client) => {
                    info!(host = %host.key(), key = %key_path, "Connected with default key");
                    return Ok(client);
                }
                Err(e) => {
                    debug!(host = %host.key(), key = %key_path, error = %e, "Key rejected");
                    last_error = Some(e);
                }
            }
        }

        Err(Error::RemoteExecutionError(format!(
            "Connection failed with all available SSH keys. Tried: {}. Last error: {}",
            keys.join(", "),
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown".to_string())
        )))
    }

    async fn connect_with_auth(&self, host: &HostCredential, auth: AuthMethod) -> Result<Client> {
        let check = if self.strict_host_key_checking {
            ServerCheckMethod::DefaultKnownHostsFile
        } else {
            ServerCheckMethod::NoCheck
        };

        Client::connect((host.address.clone(), host.port), &host.username, auth, check)
            .await
            .map_err(|e| {
                Error::RemoteExecutionError(format!("Failed to connect to {}: {}", host.key(), e))
            })
    }
}

#[async_trait]
impl CommandRunner for SshSessionPool {
    #[instrument(skip(self, host), fields(host = %host.key()))]
    async fn execute(&self, host: &HostCredential, command: &str) -> Result<String> {
        let client = self.session(host).await?;

        let result = match client.execute(command).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Cached SSH session failed, reconnecting");
                self.invalidate(&host.key()).await;
                let client = self.session(host).await?;
                client.execute(command).await.map_err(|e| {
                    Error::RemoteExecutionError(format!("Failed to execute command: {}", e))
                })?
            }
        };

        debug!(exit_status = result.exit_status, "Command execution completed");

        if result.exit_status != 0 {
            return Err(Error::RemoteExecutionError(format!(
                "Command exited with status {}: {}",
                result.exit_status,
                result.stderr.trim()
            )));
        }

        Ok(result.stdout)
    }
}

/// SSH private keys present in the usual locations
pub fn list_available_keys() -> Vec<String> {
    let Some(home) = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
    else {
        return Vec::new();
    };

    ["id_ed25519", "id_rsa", "id_ecdsa"]
        .iter()
        .map(|name| format!("{}/.ssh/{}", home, name))
        .filter(|path| std::path::Path::new(path).exists())
        .collect()
}
