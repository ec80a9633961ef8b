//! Snippet queries

use anyhow::Context;
use containeye_core::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::models::{CreateSnippet, Snippet};

/// List all snippets
#[instrument(skip(pool))]
pub async fn list_snippets(pool: &Pool<Sqlite>) -> Result<Vec<Snippet>> {
    sqlx::query_as::<_, Snippet>(
        r#"
        SELECT id, name, command, host_key, created_at, updated_at
        FROM snippets
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list snippets")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// List global snippets plus those scoped to `host_key`
#[instrument(skip(pool))]
pub async fn list_snippets_for_host(pool: &Pool<Sqlite>, host_key: &str) -> Result<Vec<Snippet>> {
    sqlx::query_as::<_, Snippet>(
        r#"
        SELECT id, name, command, host_key, created_at, updated_at
        FROM snippets
        WHERE host_key IS NULL OR host_key = ?
        ORDER BY name
        "#,
    )
    .bind(host_key)
    .fetch_all(pool)
    .await
    .context("Failed to list snippets for host")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Get snippet by ID
#[instrument(skip(pool))]
pub async fn get_snippet(pool: &Pool<Sqlite>, id: i64) -> Result<Snippet> {
    sqlx::query_as::<_, Snippet>(
        r#"
        SELECT id, name, command, host_key, created_at, updated_at
        FROM snippets
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .context("Failed to get snippet")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Create a new snippet
#[instrument(skip(pool, input))]
pub async fn create_snippet(pool: &Pool<Sqlite>, input: &CreateSnippet) -> Result<i64> {
    input.validate().map_err(Error::Other)?;

    let result = sqlx::query(
        r#"
        INSERT INTO snippets (name, command, host_key)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&input.name)
    .bind(&input.command)
    .bind(&input.host_key)
    .execute(pool)
    .await
    .context("Failed to create snippet")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Delete a snippet
#[instrument(skip(pool))]
pub async fn delete_snippet(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM snippets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete snippet")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(Error::DatabaseError(format!("Snippet {} not found", id)));
    }

    Ok(())
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

    fn input(name: &str, command: &str, host_key: Option<&str>) -> CreateSnippet {
        CreateSnippet {
            name: name.to_string(),
            command: command.to_string(),
            host_key: host_key.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_snippet_lifecycle() {
        let pool = setup_test_db().await;

        let id = create_snippet(&pool, &input("disk", "df -h", None)).await.unwrap();
        assert!(id > 0);

        let snippet = get_snippet(&pool, id).await.unwrap();
        assert_eq!(snippet.command, "df -h");
        assert!(snippet.is_global());

        assert_eq!(list_snippets(&pool).await.unwrap().len(), 1);

        delete_snippet(&pool, id).await.unwrap();
        assert!(get_snippet(&pool, id).await.is_err());
        assert!(delete_snippet(&pool, id).await.is_err());
    }

    #[tokio::test]
    async fn test_host_scoping() {
        let pool = setup_test_db().await;

        create_snippet(&pool, &input("all", "uptime", None)).await.unwrap();
        create_snippet(&pool, &input("nas", "zpool status", Some("root@nas:22")))
            .await
            .unwrap();
        create_snippet(&pool, &input("web", "nginx -t", Some("root@web:22")))
            .await
            .unwrap();

        let snippets = list_snippets_for_host(&pool, "root@nas:22").await.unwrap();
        let names: Vec<&str> = snippets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["all", "nas"]);
    }

    #[tokio::test]
    async fn test_invalid_snippet_is_rejected() {
        let pool = setup_test_db().await;
        assert!(create_snippet(&pool, &input("", "ls", None)).await.is_err());
        assert!(list_snippets(&pool).await.unwrap().is_empty());
    }
}
