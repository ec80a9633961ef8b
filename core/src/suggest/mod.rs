//! Terminal command suggestions
//!
//! Completions for a partially typed command line are drawn from four
//! sources and ranked together:
//! - the per-host remote document tree index (cached paths)
//! - a live directory listing over SSH when the cache is thin
//! - the shell history supplied by the caller
//! - saved snippets, global or scoped to the host

pub mod engine;
pub mod index;
pub mod path;
pub mod scoring;

#[cfg(test)]
mod testing;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{HostCredential, HostKey, RemotePathNode, Result};

pub use engine::CommandSuggestionEngine;
pub use index::DocumentTreeIndex;
pub use scoring::{MatchQuality, ScoringConfig};

/// Where a suggestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    DocumentTree,
    LiveListing,
    History,
    Snippet,
}

impl SuggestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentTree => "document_tree",
            Self::LiveListing => "live_listing",
            Self::History => "history",
            Self::Snippet => "snippet",
        }
    }
}

impl fmt::Display for SuggestionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked completion for a partially typed command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSuggestion {
    /// Full command line to substitute for the input
    pub text: String,
    pub source: SuggestionSource,
    pub score: f64,
}

impl CommandSuggestion {
    /// Stable identity: source plus text
    pub fn id(&self) -> String {
        format!("{}:{}", self.source, self.text)
    }
}

/// Per-request inputs besides the typed text
#[derive(Debug, Clone)]
pub struct CommandSuggestionContext {
    pub host: HostCredential,
    /// Absolute working directory of the remote shell
    pub current_directory: String,
    /// Recent commands, oldest first
    pub history: Vec<String>,
}

impl CommandSuggestionContext {
    pub fn new(host: HostCredential, current_directory: impl Into<String>) -> Self {
        Self {
            host,
            current_directory: current_directory.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }
}

/// Durable storage behind the document tree index
#[async_trait]
pub trait PathStore: Send + Sync {
    /// Nodes for a host, most recently seen first
    async fn load_paths(&self, host: &HostKey, limit: usize) -> Result<Vec<RemotePathNode>>;

    /// Insert or overwrite a node
    async fn save_path(&self, node: &RemotePathNode) -> Result<()>;
}

/// Lookup of saved command snippets
#[async_trait]
pub trait SnippetSource: Send + Sync {
    /// Commands of global snippets plus those scoped to `host`
    async fn snippet_commands(&self, host: &HostKey) -> Result<Vec<String>>;
}
