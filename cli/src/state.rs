//! Application state

use containeye_core::{
    CommandRunner, CommandSuggestionEngine, DocumentTreeIndex, HostCredential, OpenSshRunner,
    Result,
};
use containeye_database::Database;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, Transport};
use crate::ssh::SshSessionPool;

/// Shared services, built once per process and passed to each command
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Database,
    pub runner: Arc<dyn CommandRunner>,
    pub index: DocumentTreeIndex,
}

impl AppState {
    /// Connect storage and build the configured transport
    pub async fn new(config: Config) -> Result<Self> {
        let database = Database::new(&config.database_url).await?;
        database.migrate().await?;

        let runner: Arc<dyn CommandRunner> = match config.transport {
            Transport::Native => Arc::new(SshSessionPool::new(
                Duration::from_secs(config.connect_timeout_secs),
                config.strict_host_key_checking,
            )),
            Transport::Openssh => Arc::new(OpenSshRunner::new(
                config.connect_timeout_secs,
                config.strict_host_key_checking,
            )),
        };
        info!(transport = ?config.transport, "Remote transport ready");

        let index = DocumentTreeIndex::with_load_limit(
            Arc::new(database.store()),
            config.max_loaded_paths,
        );

        Ok(Self {
            config: Arc::new(config),
            database,
            runner,
            index,
        })
    }

    pub fn host(&self, name: &str) -> Result<HostCredential> {
        self.config.host(name)
    }

    pub fn engine(&self) -> CommandSuggestionEngine {
        CommandSuggestionEngine::new(
            self.index.clone(),
            self.runner.clone(),
            Arc::new(self.database.store()),
        )
        .with_scoring(self.config.suggestions.clone())
    }

    /// Persist pending index writes and close the pool
    pub async fn shutdown(self) -> Result<()> {
        self.index.flush().await?;
        self.database.close().await
    }
}
