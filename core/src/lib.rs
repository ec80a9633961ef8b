//! Core library for ContainEye
//!
//! This crate defines the shared host types, the error type, remote command
//! execution, and the terminal command suggestion engine with its remote
//! path index.

pub mod error;
pub mod remote;
pub mod suggest;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use remote::{CommandRunner, OpenSshRunner};
pub use suggest::{
    CommandSuggestion, CommandSuggestionContext, CommandSuggestionEngine, DocumentTreeIndex,
    PathStore, ScoringConfig, SnippetSource, SuggestionSource,
};
pub use types::{HostAuth, HostCredential, HostKey, RemotePathNode};
