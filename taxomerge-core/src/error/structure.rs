//! Structural invariant violations
//!
//! These are programming errors: an edit that would corrupt a tree is
//! refused before anything is mutated, and the error carries enough of the
//! surrounding lineage to debug the caller.

use thiserror::Error;

/// A refused structural edit on a taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// Attempt to make a node its own parent
    #[error("cannot make {node} its own parent")]
    SelfParent { node: String },

    /// The proposed parent is a descendant of the node being moved
    #[error("attaching {node} under {parent} would create a cycle (lineage: {})", lineage.join(" < "))]
    Cycle {
        node: String,
        parent: String,
        /// Lineage of the proposed parent, nearest first
        lineage: Vec<String>,
    },

    /// The child already has a parent; it must be detached first
    #[error("{node} is already attached to {parent}")]
    AlreadyAttached { node: String, parent: String },

    /// A node handle from one taxonomy used with another
    #[error("node belongs to taxonomy {found}, not {expected}")]
    ForeignNode { expected: String, found: String },

    /// Operation on a node that has been pruned
    #[error("{node} has been removed from its taxonomy")]
    Removed { node: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_includes_lineage() {
        let err = StructureError::Cycle {
            node: "Mammalia".to_string(),
            parent: "Homo".to_string(),
            lineage: vec![
                "Homo".to_string(),
                "Hominidae".to_string(),
                "Mammalia".to_string(),
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("Mammalia"));
        assert!(msg.contains("Homo < Hominidae < Mammalia"));
    }

    #[test]
    fn test_foreign_node_message() {
        let err = StructureError::ForeignNode {
            expected: "ncbi".to_string(),
            found: "gbif".to_string(),
        };
        assert_eq!(err.to_string(), "node belongs to taxonomy gbif, not ncbi");
    }
}
