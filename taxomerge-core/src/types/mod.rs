/// Core types shared across all taxomerge modules
pub mod flags;
pub mod qualified_id;
pub mod rank;

// Re-export commonly used types at module level
pub use flags::{Flag, Flags};
pub use qualified_id::QualifiedId;
pub use rank::Rank;
