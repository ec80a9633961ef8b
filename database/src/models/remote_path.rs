use chrono::{DateTime, Utc};
use containeye_core::{HostKey, RemotePathNode};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored remote path row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RemotePathRow {
    pub host_key: String,
    /// Normalized absolute path
    pub path: String,
    pub is_directory: bool,
    pub last_seen: DateTime<Utc>,
}

impl From<RemotePathRow> for RemotePathNode {
    fn from(row: RemotePathRow) -> Self {
        RemotePathNode {
            host_key: HostKey::new(row.host_key),
            path: row.path,
            is_directory: row.is_directory,
            last_seen: row.last_seen,
        }
    }
}
