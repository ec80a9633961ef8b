//! Command history queries

use anyhow::Context;
use containeye_core::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::models::HistoryEntry;

/// Record a command executed on a host
#[instrument(skip(pool))]
pub async fn record_command(pool: &Pool<Sqlite>, host_key: &str, command: &str) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO command_history (host_key, command)
        VALUES (?, ?)
        "#,
    )
    .bind(host_key)
    .bind(command)
    .execute(pool)
    .await
    .context("Failed to record command")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// List the latest `limit` history entries for a host, newest first
#[instrument(skip(pool))]
pub async fn list_history(
    pool: &Pool<Sqlite>,
    host_key: &str,
    limit: i64,
) -> Result<Vec<HistoryEntry>> {
    sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT id, host_key, command, executed_at
        FROM command_history
        WHERE host_key = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(host_key)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list history")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Latest `limit` commands for a host, oldest first (shell order)
pub async fn recent_commands(pool: &Pool<Sqlite>, host_key: &str, limit: i64) -> Result<Vec<String>> {
    let mut entries = list_history(pool, host_key, limit).await?;
    entries.reverse();
    Ok(entries.into_iter().map(|e| e.command).collect())
}

/// Drop all but the newest `keep` entries for a host
#[instrument(skip(pool))]
pub async fn prune_history(pool: &Pool<Sqlite>, host_key: &str, keep: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM command_history
        WHERE host_key = ?
          AND id NOT IN (
            SELECT id FROM command_history
            WHERE host_key = ?
            ORDER BY id DESC
            LIMIT ?
          )
        "#,
    )
    .bind(host_key)
    .bind(host_key)
    .bind(keep)
    .execute(pool)
    .await
    .context("Failed to prune history")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[tokio::test]
    async fn test_recent_commands_are_oldest_first() {
        let pool = setup_test_db().await;

        for command in ["ls", "cd /srv", "docker ps", "df -h"] {
            record_command(&pool, "root@a:22", command).await.unwrap();
        }
        record_command(&pool, "root@b:22", "reboot").await.unwrap();

        let recent = recent_commands(&pool, "root@a:22", 3).await.unwrap();
        assert_eq!(recent, vec!["cd /srv", "docker ps", "df -h"]);

        let entries = list_history(&pool, "root@a:22", 10).await.unwrap();
        assert_eq!(entries[0].command, "df -h");
    }

    #[tokio::test]
    async fn test_prune_keeps_newest() {
        let pool = setup_test_db().await;

        for i in 0..5 {
            record_command(&pool, "root@a:22", &format!("echo {}", i)).await.unwrap();
        }
        record_command(&pool, "root@b:22", "echo other").await.unwrap();

        let removed = prune_history(&pool, "root@a:22", 2).await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(
            recent_commands(&pool, "root@a:22", 10).await.unwrap(),
            vec!["echo 3", "echo 4"]
        );
        assert_eq!(recent_commands(&pool, "root@b:22", 10).await.unwrap().len(), 1);
    }
}
