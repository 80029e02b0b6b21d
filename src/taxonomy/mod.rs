//! Taxonomy data model.
//!
//! A [`Taxonomy`] is a forest of rooted trees stored as an arena of
//! [`Taxon`] records addressed by [`Node`] handles. Index 0 of every arena is
//! a forest pseudo-node whose children are the roots; it is the MRCA of
//! nodes that share no real ancestor and is never reported as a parent.
//!
//! * [`Taxonomy`] - arena, name index, id index, idspace tag
//! * [`Node`] - handle carrying the key of its owning taxonomy
//! * [`Brackets`] - preorder interval numbering for O(1) containment tests
//!
//! Deep walks (preorder, postorder, pruning, numbering) use explicit stacks
//! so that pathological depths do not exhaust the call stack.

pub mod brackets;
mod edit;
mod mrca;
mod names;
mod nested;
mod taxon;

pub use brackets::{antiwitness, witness, Brackets};
pub use taxon::Taxon;

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::sync::atomic::{AtomicU32, Ordering};
use taxomerge_core::{QualifiedId, Rank, StructureError, TaxomergeError, TaxomergeResult};

static NEXT_KEY: AtomicU32 = AtomicU32::new(1);

/// Arena index of the forest pseudo-node
pub(crate) const FOREST_INDEX: usize = 0;

/// Handle to a taxon inside one particular taxonomy.
///
/// Handles are cheap to copy. Using a handle with a taxonomy other than the
/// one that created it is a structural error for edits and MRCA, and a
/// panic for plain indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    key: u32,
    index: u32,
}

impl Node {
    /// Position in the owning arena
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Key of the owning taxonomy
    pub(crate) fn key(self) -> u32 {
        self.key
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// A forest of taxa with name and id indexes.
#[derive(Debug)]
pub struct Taxonomy {
    key: u32,
    tag: String,
    taxa: Vec<Taxon>,
    /// name -> taxa carrying it as primary name or synonym
    names: IndexMap<String, Vec<Node>>,
    ids: HashMap<String, Node>,
    live: usize,
}

impl Taxonomy {
    /// Create an empty taxonomy for the given idspace tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            key: NEXT_KEY.fetch_add(1, Ordering::Relaxed),
            tag: tag.into(),
            taxa: vec![Taxon::forest()],
            names: IndexMap::new(),
            ids: HashMap::new(),
            live: 0,
        }
    }

    /// Idspace tag, e.g. `ncbi`
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub(crate) fn key(&self) -> u32 {
        self.key
    }

    pub(crate) fn node(&self, index: usize) -> Node {
        Node {
            key: self.key,
            index: index as u32,
        }
    }

    pub fn forest(&self) -> Node {
        self.node(FOREST_INDEX)
    }

    /// True for the forest pseudo-node; `mrca` returns it when two nodes
    /// have no common ancestor.
    pub fn is_forest(&self, node: Node) -> bool {
        node.key == self.key && node.index() == FOREST_INDEX
    }

    /// Alias of [`Taxonomy::is_forest`] that reads better at MRCA call sites
    pub fn no_mrca(&self, node: Node) -> bool {
        self.is_forest(node)
    }

    /// Whether the handle was issued by this taxonomy
    pub fn owns(&self, node: Node) -> bool {
        node.key == self.key && node.index() < self.taxa.len()
    }

    pub(crate) fn check(&self, node: Node) -> Result<usize, StructureError> {
        if self.owns(node) {
            Ok(node.index())
        } else {
            Err(StructureError::ForeignNode {
                expected: self.tag.clone(),
                found: format!("taxonomy #{}", node.key),
            })
        }
    }

    pub(crate) fn check_live(&self, node: Node) -> Result<usize, StructureError> {
        let index = self.check(node)?;
        if self.taxa[index].removed {
            return Err(StructureError::Removed {
                node: self.label(node),
            });
        }
        Ok(index)
    }

    /// Number of live taxa, excluding the forest pseudo-node
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Size of the arena, including removed taxa and the forest
    pub(crate) fn capacity(&self) -> usize {
        self.taxa.len()
    }

    /// All live taxa in arena order
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        (1..self.taxa.len())
            .filter(move |&i| !self.taxa[i].removed)
            .map(move |i| self.node(i))
    }

    /// Create a detached taxon. Attach it with [`Taxonomy::add_root`] or
    /// [`Taxonomy::attach`].
    pub fn new_taxon(
        &mut self,
        name: Option<&str>,
        rank: Rank,
        id: Option<&str>,
    ) -> TaxomergeResult<Node> {
        if let Some(id) = id {
            if self.ids.contains_key(id) {
                return Err(TaxomergeError::InvalidInput(format!(
                    "duplicate id {} in {}",
                    id, self.tag
                )));
            }
        }

        let node = self.node(self.taxa.len());
        self.taxa.push(Taxon::new(name, rank, id));
        self.live += 1;

        if let Some(name) = name {
            self.index_name(name, node);
        }
        if let Some(id) = id {
            self.ids.insert(id.to_string(), node);
        }
        Ok(node)
    }

    /// Human readable label for messages: name, else id, else arena index
    pub fn label(&self, node: Node) -> String {
        if !self.owns(node) {
            return format!("foreign {}", node);
        }
        let taxon = &self.taxa[node.index()];
        if node.index() == FOREST_INDEX {
            return "<forest>".to_string();
        }
        match (&taxon.name, &taxon.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("{}:{}", self.tag, id),
            (None, None) => node.to_string(),
        }
    }

    /// Name of the taxon, empty for nameless taxa
    pub fn name_of(&self, node: Node) -> &str {
        self[node].name().unwrap_or("")
    }

    pub fn children(&self, node: Node) -> &[Node] {
        &self[node].children
    }

    /// Parent of `node`; `None` for roots, detached taxa and the forest
    pub fn parent(&self, node: Node) -> Option<Node> {
        match self[node].parent {
            Some(p) if p as usize != FOREST_INDEX => Some(self.node(p as usize)),
            _ => None,
        }
    }

    /// Parent including the forest pseudo-node
    pub(crate) fn parent_or_forest(&self, node: Node) -> Option<Node> {
        self[node].parent.map(|p| self.node(p as usize))
    }

    pub fn is_root(&self, node: Node) -> bool {
        self[node].parent == Some(FOREST_INDEX as u32)
    }

    pub fn is_tip(&self, node: Node) -> bool {
        self[node].children.is_empty()
    }

    pub fn roots(&self) -> &[Node] {
        &self.taxa[FOREST_INDEX].children
    }

    /// Taxa carrying `name` as primary name or synonym, in insertion order
    pub fn lookup(&self, name: &str) -> &[Node] {
        self.names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Taxa whose primary name is `name`
    pub fn lookup_primary<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Node> + 'a {
        self.lookup(name)
            .iter()
            .copied()
            .filter(move |&n| self[n].name() == Some(name))
    }

    /// Taxa carrying `name` only as a synonym
    pub fn lookup_synonym<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Node> + 'a {
        self.lookup(name)
            .iter()
            .copied()
            .filter(move |&n| self[n].name() != Some(name))
    }

    /// The single taxon with this primary name, if there is exactly one
    pub fn lookup_unique(&self, name: &str) -> Option<Node> {
        let mut found = self.lookup_primary(name);
        let first = found.next()?;
        match found.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    pub fn by_id(&self, id: &str) -> Option<Node> {
        self.ids.get(id).copied()
    }

    /// Qualified references of a taxon: its own `tag:id` first, then the
    /// references it was built from
    pub fn references(&self, node: Node) -> Vec<QualifiedId> {
        let taxon = &self[node];
        let own = taxon.id().map(|id| QualifiedId::new(self.tag.as_str(), id));
        own.into_iter()
            .chain(taxon.sources().iter().cloned())
            .collect()
    }

    /// Names in the index in first-insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names
            .iter()
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Number of edges from the forest: roots have depth 1.
    pub fn depth(&self, node: Node) -> usize {
        let mut pending = Vec::new();
        let mut current = node.index();
        let mut base = loop {
            let taxon = &self.taxa[current];
            if let Some(d) = taxon.depth.get() {
                break d;
            }
            pending.push(current);
            match taxon.parent {
                Some(p) => current = p as usize,
                // detached: behaves like a root
                None => break 0,
            }
        };
        while let Some(index) = pending.pop() {
            base += 1;
            self.taxa[index].depth.set(Some(base));
        }
        self.taxa[node.index()].depth.get().unwrap_or(0) as usize
    }

    /// Number of taxa in the subtree rooted at `node`, itself included
    pub fn count(&self, node: Node) -> usize {
        if let Some(c) = self[node].count.get() {
            return c as usize;
        }
        for n in self.postorder(node) {
            let taxon = &self.taxa[n.index()];
            if taxon.count.get().is_some() {
                continue;
            }
            let total: u32 = 1 + taxon
                .children
                .iter()
                .map(|c| self.taxa[c.index()].count.get().unwrap_or(1))
                .sum::<u32>();
            taxon.count.set(Some(total));
        }
        self[node].count.get().unwrap_or(1) as usize
    }

    /// Strict ancestors of `node`, nearest first, not including the forest
    pub fn ancestors(&self, node: Node) -> Ancestors<'_> {
        Ancestors {
            taxonomy: self,
            next: self.parent(node),
        }
    }

    /// Preorder walk of the subtree at `start`, `start` first
    pub fn preorder(&self, start: Node) -> Preorder<'_> {
        Preorder {
            taxonomy: self,
            stack: vec![start],
        }
    }

    /// Postorder walk of the subtree at `start`, `start` last
    pub fn postorder(&self, start: Node) -> Postorder<'_> {
        Postorder {
            taxonomy: self,
            stack: vec![(start, 0)],
        }
    }

    /// Preorder over every tree of the forest, the forest node excluded
    pub fn walk(&self) -> impl Iterator<Item = Node> + '_ {
        self.preorder(self.forest()).skip(1)
    }

    /// Fresh copy with a new key, so handles of the two never mix
    pub fn duplicate(&self, tag: impl Into<String>) -> Taxonomy {
        let mut copy = Taxonomy::new(tag);
        let key = copy.key;
        let rekey = |n: &Node| Node {
            key,
            index: n.index,
        };

        copy.taxa = self
            .taxa
            .iter()
            .map(|t| {
                let mut t = t.clone();
                t.children = t.children.iter().map(rekey).collect();
                t
            })
            .collect();
        copy.names = self
            .names
            .iter()
            .map(|(name, nodes)| (name.clone(), nodes.iter().map(rekey).collect()))
            .collect();
        copy.ids = self
            .ids
            .iter()
            .map(|(id, n)| (id.clone(), rekey(n)))
            .collect();
        copy.live = self.live;
        copy
    }

    fn index_name(&mut self, name: &str, node: Node) {
        let entry = self.names.entry(name.to_string()).or_default();
        if !entry.contains(&node) {
            entry.push(node);
        }
    }

    fn unindex_name(&mut self, name: &str, node: Node) {
        if let Some(nodes) = self.names.get_mut(name) {
            nodes.retain(|&n| n != node);
        }
    }
}

impl Index<Node> for Taxonomy {
    type Output = Taxon;

    fn index(&self, node: Node) -> &Taxon {
        assert!(
            node.key == self.key,
            "node {} does not belong to taxonomy {}",
            node,
            self.tag
        );
        &self.taxa[node.index()]
    }
}

/// Iterator over strict ancestors
pub struct Ancestors<'a> {
    taxonomy: &'a Taxonomy,
    next: Option<Node>,
}

impl Iterator for Ancestors<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let current = self.next?;
        self.next = self.taxonomy.parent(current);
        Some(current)
    }
}

/// Explicit-stack preorder iterator
pub struct Preorder<'a> {
    taxonomy: &'a Taxonomy,
    stack: Vec<Node>,
}

impl Iterator for Preorder<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let taxonomy = self.taxonomy;
        let node = self.stack.pop()?;
        // reversed so the first child comes out first
        self.stack
            .extend(taxonomy.children(node).iter().rev().copied());
        Some(node)
    }
}

/// Explicit-stack postorder iterator
pub struct Postorder<'a> {
    taxonomy: &'a Taxonomy,
    stack: Vec<(Node, usize)>,
}

impl Iterator for Postorder<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let taxonomy = self.taxonomy;
        loop {
            let (node, next_child) = self.stack.last_mut()?;
            let node = *node;
            let children = taxonomy.children(node);
            if *next_child < children.len() {
                let child = children[*next_child];
                *next_child += 1;
                self.stack.push((child, 0));
            } else {
                self.stack.pop();
                return Some(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(tax: &Taxonomy, nodes: impl Iterator<Item = Node>) -> Vec<String> {
        nodes.map(|n| tax.label(n)).collect()
    }

    #[test]
    fn test_new_taxon_indexes_name_and_id() {
        let mut tax = Taxonomy::new("ncbi");
        let homo = tax.new_taxon(Some("Homo"), Rank::Genus, Some("9605")).unwrap();
        tax.add_root(homo).unwrap();

        assert_eq!(tax.len(), 1);
        assert_eq!(tax.lookup("Homo"), &[homo]);
        assert_eq!(tax.by_id("9605"), Some(homo));
        assert_eq!(tax.lookup_unique("Homo"), Some(homo));
        assert!(tax.is_root(homo));
        assert_eq!(tax.parent(homo), None);
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut tax = Taxonomy::new("ncbi");
        tax.new_taxon(Some("a"), Rank::NoRank, Some("1")).unwrap();
        let err = tax.new_taxon(Some("b"), Rank::NoRank, Some("1")).unwrap_err();
        assert!(matches!(err, TaxomergeError::InvalidInput(_)));
    }

    #[test]
    fn test_walk_orders() {
        let tax = Taxonomy::from_nested("t", "((a,b)ab,(c,d)cd)top").unwrap();
        let top = tax.roots()[0];

        assert_eq!(
            names(&tax, tax.preorder(top)),
            vec!["top", "ab", "a", "b", "cd", "c", "d"]
        );
        assert_eq!(
            names(&tax, tax.postorder(top)),
            vec!["a", "b", "ab", "c", "d", "cd", "top"]
        );
        assert_eq!(tax.walk().count(), 7);
    }

    #[test]
    fn test_depth_and_count() {
        let tax = Taxonomy::from_nested("t", "((a,b)ab,(c,d)cd)top").unwrap();
        let top = tax.roots()[0];
        let a = tax.lookup_unique("a").unwrap();

        assert_eq!(tax.depth(top), 1);
        assert_eq!(tax.depth(a), 3);
        assert_eq!(tax.count(top), 7);
        assert_eq!(tax.count(a), 1);
        assert_eq!(names(&tax, tax.ancestors(a)), vec!["ab", "top"]);
    }

    #[test]
    fn test_duplicate_gets_fresh_handles() {
        let tax = Taxonomy::from_nested("t", "((a,b)ab,c)top").unwrap();
        let copy = tax.duplicate("u");
        let a = tax.lookup_unique("a").unwrap();
        let a2 = copy.lookup_unique("a").unwrap();

        assert_ne!(a, a2);
        assert_eq!(a.index(), a2.index());
        assert!(!copy.owns(a));
        assert_eq!(copy.len(), tax.len());
        assert_eq!(copy.label(copy.parent(a2).unwrap()), "ab");
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn test_foreign_index_panics() {
        let tax = Taxonomy::from_nested("t", "(a)top").unwrap();
        let other = Taxonomy::from_nested("u", "(a)top").unwrap();
        let a = other.lookup_unique("a").unwrap();
        let _ = &tax[a];
    }
}
