//! Core utilities and types shared across the taxomerge crates

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{default_config, load_config, save_config, Config};
pub use error::{StructureError, TaxomergeError, TaxomergeResult};
pub use types::{Flag, Flags, QualifiedId, Rank};

/// Version information for the taxomerge project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
