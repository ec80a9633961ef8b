//! SQLite-backed implementations of the suggestion storage traits

use async_trait::async_trait;
use containeye_core::{HostKey, PathStore, RemotePathNode, Result, SnippetSource};
use sqlx::{Pool, Sqlite};

use crate::queries;

/// Path and snippet storage over a shared pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PathStore for SqliteStore {
    async fn load_paths(&self, host: &HostKey, limit: usize) -> Result<Vec<RemotePathNode>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = queries::list_remote_paths(&self.pool, host.as_str(), limit).await?;
        Ok(rows.into_iter().map(RemotePathNode::from).collect())
    }

    async fn save_path(&self, node: &RemotePathNode) -> Result<()> {
        queries::upsert_remote_path(&self.pool, node).await
    }
}

#[async_trait]
impl SnippetSource for SqliteStore {
    async fn snippet_commands(&self, host: &HostKey) -> Result<Vec<String>> {
        let snippets = queries::list_snippets_for_host(&self.pool, host.as_str()).await?;
        Ok(snippets.into_iter().map(|s| s.command).collect())
    }
}
