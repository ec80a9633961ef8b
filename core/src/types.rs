//! Shared types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a remote host, derived from its credential
///
/// Every per-host structure (path index partitions, SSH sessions, stored
/// rows) is keyed by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostKey(String);

impl HostKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How to authenticate against a host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum HostAuth {
    /// Try the usual keys under `~/.ssh`
    DefaultKeys,
    Password {
        password: String,
    },
    KeyFile {
        path: String,
        passphrase: Option<String>,
    },
}

/// Connection details for a remote server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostCredential {
    /// Display name
    pub name: String,
    /// Hostname or IP address
    pub address: String,
    pub port: u16,
    pub username: String,
    pub auth: HostAuth,
}

impl HostCredential {
    /// Create a credential that authenticates with the default keys
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            username: username.into(),
            auth: HostAuth::DefaultKeys,
        }
    }

    pub fn with_auth(mut self, auth: HostAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Identity used for caching: `username@address:port`
    pub fn key(&self) -> HostKey {
        HostKey(format!("{}@{}:{}", self.username, self.address, self.port))
    }

    /// `user@host` destination for the ssh command line
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.address)
    }
}

/// A remembered filesystem entry on a specific remote host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePathNode {
    pub host_key: HostKey,
    /// Normalized absolute path
    pub path: String,
    pub is_directory: bool,
    pub last_seen: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_includes_user_address_and_port() {
        let host = HostCredential::new("nas", "10.0.0.5", 2222, "admin");
        assert_eq!(host.key().as_str(), "admin@10.0.0.5:2222");
        assert_eq!(host.destination(), "admin@10.0.0.5");
    }

    #[test]
    fn test_host_key_ignores_name_and_auth() {
        let a = HostCredential::new("one", "example.org", 22, "root");
        let b = HostCredential::new("two", "example.org", 22, "root").with_auth(
            HostAuth::Password {
                password: "secret".to_string(),
            },
        );
        assert_eq!(a.key(), b.key());
    }
}
