//! A single node of a taxonomy arena

use super::Node;
use std::cell::Cell;
use taxomerge_core::{Flag, Flags, QualifiedId, Rank};

/// Taxon data stored in the arena.
///
/// Structure (parent, children) is only changed through [`super::Taxonomy`]
/// edit methods, which keep the cached depth and subtree size consistent.
#[derive(Debug, Clone)]
pub struct Taxon {
    pub(crate) id: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) rank: Rank,
    pub(crate) proper_flags: Flags,
    pub(crate) inherited_flags: Flags,
    pub(crate) sources: Vec<QualifiedId>,
    pub(crate) synonyms: Vec<String>,
    /// Arena index of the parent; roots point at the forest, detached nodes have none
    pub(crate) parent: Option<u32>,
    pub(crate) children: Vec<Node>,
    pub(crate) removed: bool,
    pub(crate) depth: Cell<Option<u32>>,
    pub(crate) count: Cell<Option<u32>>,
}

impl Taxon {
    pub(crate) fn new(name: Option<&str>, rank: Rank, id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            name: name.map(str::to_string),
            rank,
            proper_flags: Flags::NONE,
            inherited_flags: Flags::NONE,
            sources: Vec::new(),
            synonyms: Vec::new(),
            parent: None,
            children: Vec::new(),
            removed: false,
            depth: Cell::new(None),
            count: Cell::new(None),
        }
    }

    /// The forest pseudo-node at index 0
    pub(crate) fn forest() -> Self {
        let forest = Self::new(None, Rank::NoRank, None);
        forest.depth.set(Some(0));
        forest
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn proper_flags(&self) -> Flags {
        self.proper_flags
    }

    pub fn inherited_flags(&self) -> Flags {
        self.inherited_flags
    }

    /// Proper and inherited flags together
    pub fn flags(&self) -> Flags {
        self.proper_flags.union(self.inherited_flags)
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags().contains(flag)
    }

    pub fn is_hidden(&self) -> bool {
        !self.proper_flags.contains(Flag::ForcedVisible) && self.flags().intersects(Flags::hiding())
    }

    pub fn sources(&self) -> &[QualifiedId] {
        &self.sources
    }

    pub fn synonyms(&self) -> &[String] {
        &self.synonyms
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub(crate) fn invalidate(&self) {
        self.depth.set(None);
        self.count.set(None);
    }
}
