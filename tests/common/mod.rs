//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use taxomerge::{Config, Node, Taxonomy, UnionTaxonomy};
use tempfile::TempDir;

/// Parse a nested-notation fixture
pub fn tree(tag: &str, nested: &str) -> Taxonomy {
    Taxonomy::from_nested(tag, nested).expect("fixture should parse")
}

pub fn union() -> UnionTaxonomy {
    UnionTaxonomy::new(Config::default()).expect("default config should build a union")
}

/// Labels of a node's children, in order
pub fn child_labels(taxonomy: &Taxonomy, node: Node) -> Vec<String> {
    taxonomy
        .children(node)
        .iter()
        .map(|&c| taxonomy.label(c))
        .collect()
}

/// Label of the parent of the uniquely named node, or None for roots
pub fn parent_label(taxonomy: &Taxonomy, name: &str) -> Option<String> {
    let node = taxonomy.lookup_unique(name)?;
    taxonomy.parent(node).map(|p| taxonomy.label(p))
}

/// Temporary directory holding test inputs and outputs
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Write a nested-notation file and return its path
    pub fn nested_file(&self, name: &str, nested: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, format!("{};\n", nested)).expect("Failed to write fixture");
        path
    }
}
