//! Database query modules

pub mod command_history;
pub mod remote_paths;
pub mod snippets;

// Re-export commonly used functions for convenience
pub use command_history::*;
pub use remote_paths::*;
pub use snippets::*;
