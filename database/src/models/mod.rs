// Database models

pub mod history;
pub mod remote_path;
pub mod snippet;

pub use history::*;
pub use remote_path::*;
pub use snippet::*;
