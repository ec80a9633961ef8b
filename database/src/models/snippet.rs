use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Saved command snippet
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Snippet {
    pub id: i64,
    pub name: String,
    pub command: String,
    /// Host the snippet is scoped to; `None` for global snippets
    pub host_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    /// Check if this snippet applies to every host
    pub fn is_global(&self) -> bool {
        self.host_key.is_none()
    }
}

/// Input for creating a new snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSnippet {
    pub name: String,
    pub command: String,
    pub host_key: Option<String>,
}

impl CreateSnippet {
    /// Validate the snippet input
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Snippet name cannot be empty".to_string());
        }
        if self.command.trim().is_empty() {
            return Err("Snippet command cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(host_key: Option<&str>) -> Snippet {
        Snippet {
            id: 1,
            name: "logs".to_string(),
            command: "docker compose logs -f".to_string(),
            host_key: host_key.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snippet_scope() {
        assert!(snippet(None).is_global());
        assert!(!snippet(Some("root@a:22")).is_global());
    }

    #[test]
    fn test_create_snippet_validation() {
        let input = CreateSnippet {
            name: " ".to_string(),
            command: "ls".to_string(),
            host_key: None,
        };
        assert!(input.validate().is_err());

        let input = CreateSnippet {
            name: "list".to_string(),
            command: "".to_string(),
            host_key: None,
        };
        assert!(input.validate().is_err());

        let input = CreateSnippet {
            name: "list".to_string(),
            command: "ls -la".to_string(),
            host_key: None,
        };
        assert!(input.validate().is_ok());
    }
}
