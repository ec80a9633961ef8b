//! Remote execution via SSH

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{Error, HostAuth, HostCredential, Result};

/// Runs a shell command on a host and returns its stdout
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, host: &HostCredential, command: &str) -> Result<String>;
}

/// Command runner that shells out to the system `ssh` binary
///
/// Password credentials are not supported here since OpenSSH only reads
/// passwords from a TTY; use the native session pool for those hosts.
pub struct OpenSshRunner {
    connect_timeout_secs: u64,
    strict_host_key_checking: bool,
}

impl OpenSshRunner {
    /// Create a new runner
    pub fn new(connect_timeout_secs: u64, strict_host_key_checking: bool) -> Self {
        Self {
            connect_timeout_secs,
            strict_host_key_checking,
        }
    }

    fn build_command(&self, host: &HostCredential, command: &str) -> Result<tokio::process::Command> {
        let mut ssh_cmd = tokio::process::Command::new("ssh");
        ssh_cmd
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout_secs))
            .arg("-o")
            .arg("LogLevel=ERROR")
            .arg("-o")
            .arg(if self.strict_host_key_checking {
                "StrictHostKeyChecking=yes"
            } else {
                "StrictHostKeyChecking=accept-new"
            })
            .arg("-p")
            .arg(host.port.to_string());

        match &host.auth {
            HostAuth::DefaultKeys => {}
            HostAuth::KeyFile { path, .. } => {
                ssh_cmd.arg("-i").arg(path);
            }
            HostAuth::Password { .. } => {
                return Err(Error::RemoteExecutionError(format!(
                    "Host {} uses password auth, which the openssh transport cannot provide",
                    host.name
                )));
            }
        }

        ssh_cmd.arg(host.destination()).arg(command);
        Ok(ssh_cmd)
    }
}

impl Default for OpenSshRunner {
    fn default() -> Self {
        Self::new(15, false)
    }
}

#[async_trait]
impl CommandRunner for OpenSshRunner {
    #[instrument(skip(self, host), fields(host = %host.key()))]
    async fn execute(&self, host: &HostCredential, command: &str) -> Result<String> {
        debug!(command = %command, "Executing remotely via ssh binary");

        let output = self
            .build_command(host, command)?
            .output()
            .await
            .map_err(|e| Error::RemoteExecutionError(format!("SSH failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::RemoteExecutionError(format!(
                "Remote command failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hosts_are_rejected() {
        let runner = OpenSshRunner::default();
        let host = HostCredential::new("db", "db.internal", 22, "ops").with_auth(HostAuth::Password {
            password: "hunter2".to_string(),
        });

        let err = runner.build_command(&host, "uptime").unwrap_err();
        assert!(matches!(err, Error::RemoteExecutionError(_)));
    }

    #[test]
    fn test_key_file_hosts_build() {
        let runner = OpenSshRunner::new(5, true);
        let host = HostCredential::new("db", "db.internal", 2200, "ops").with_auth(HostAuth::KeyFile {
            path: "/keys/ops".to_string(),
            passphrase: None,
        });

        let cmd = runner.build_command(&host, "uptime").unwrap();
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert!(args.contains(&"StrictHostKeyChecking=yes".to_string()));
        assert!(args.contains(&"/keys/ops".to_string()));
        assert!(args.contains(&"2200".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("uptime"));
    }
}
