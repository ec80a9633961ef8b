//! Remote path queries

use anyhow::Context;
use containeye_core::{Error, RemotePathNode, Result};
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::models::RemotePathRow;

/// Insert or overwrite a remote path; last write wins
#[instrument(skip(pool, node), fields(host = %node.host_key, path = %node.path))]
pub async fn upsert_remote_path(pool: &Pool<Sqlite>, node: &RemotePathNode) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO remote_path_nodes (host_key, path, is_directory, last_seen)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(host_key, path) DO UPDATE SET
            is_directory = excluded.is_directory,
            last_seen = excluded.last_seen
        "#,
    )
    .bind(node.host_key.as_str())
    .bind(&node.path)
    .bind(node.is_directory)
    .bind(node.last_seen)
    .execute(pool)
    .await
    .context("Failed to upsert remote path")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// List a host's remote paths, most recently seen first
#[instrument(skip(pool))]
pub async fn list_remote_paths(
    pool: &Pool<Sqlite>,
    host_key: &str,
    limit: i64,
) -> Result<Vec<RemotePathRow>> {
    sqlx::query_as::<_, RemotePathRow>(
        r#"
        SELECT host_key, path, is_directory, last_seen
        FROM remote_path_nodes
        WHERE host_key = ?
        ORDER BY last_seen DESC, path ASC
        LIMIT ?
        "#,
    )
    .bind(host_key)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list remote paths")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Count cached paths for a host
#[instrument(skip(pool))]
pub async fn count_remote_paths(pool: &Pool<Sqlite>, host_key: &str) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM remote_path_nodes WHERE host_key = ?")
        .bind(host_key)
        .fetch_one(pool)
        .await
        .context("Failed to count remote paths")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(count.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use containeye_core::HostKey;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    fn node(host: &str, path: &str, is_directory: bool, age_secs: i64) -> RemotePathNode {
        RemotePathNode {
            host_key: HostKey::new(host),
            path: path.to_string(),
            is_directory,
            last_seen: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_path() {
        let pool = setup_test_db().await;

        upsert_remote_path(&pool, &node("root@a:22", "/etc/hosts", true, 10))
            .await
            .unwrap();
        upsert_remote_path(&pool, &node("root@a:22", "/etc/hosts", false, 0))
            .await
            .unwrap();

        let rows = list_remote_paths(&pool, "root@a:22", 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_directory);
        assert_eq!(count_remote_paths(&pool, "root@a:22").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_is_scoped_ordered_and_limited() {
        let pool = setup_test_db().await;

        upsert_remote_path(&pool, &node("root@a:22", "/old", true, 300))
            .await
            .unwrap();
        upsert_remote_path(&pool, &node("root@a:22", "/new", true, 1))
            .await
            .unwrap();
        upsert_remote_path(&pool, &node("root@a:22", "/mid", false, 60))
            .await
            .unwrap();
        upsert_remote_path(&pool, &node("root@b:22", "/other", true, 0))
            .await
            .unwrap();

        let rows = list_remote_paths(&pool, "root@a:22", 2).await.unwrap();
        let paths: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/new", "/mid"]);

        let node: RemotePathNode = rows[0].clone().into();
        assert_eq!(node.host_key.as_str(), "root@a:22");
    }
}
