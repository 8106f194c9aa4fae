//! Configuration for pageforge
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > config file > built-in defaults.

mod config;

pub use config::*;
pub use pageforge_utils::error;
pub use pageforge_utils::types;
