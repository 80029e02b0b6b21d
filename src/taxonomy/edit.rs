//! Structural and property edits.
//!
//! Every structural edit validates first and mutates second: a refused
//! edit returns a [`StructureError`] and leaves the arena untouched.

use super::{Node, Taxonomy, FOREST_INDEX};
use taxomerge_core::{Flag, Flags, QualifiedId, Rank, StructureError};
use tracing::debug;

impl Taxonomy {
    /// Attach a detached taxon as a new root
    pub fn add_root(&mut self, node: Node) -> Result<(), StructureError> {
        let forest = self.forest();
        self.attach(node, forest)
    }

    /// Attach a detached `child` under `parent`.
    ///
    /// Refused when the child already has a parent, when `parent` is the
    /// child itself, or when `parent` descends from the child.
    pub fn attach(&mut self, child: Node, parent: Node) -> Result<(), StructureError> {
        let c = self.check_live(child)?;
        let p = self.check_live(parent)?;

        if c == FOREST_INDEX {
            return Err(StructureError::SelfParent {
                node: self.label(child),
            });
        }
        if let Some(existing) = self.taxa[c].parent {
            return Err(StructureError::AlreadyAttached {
                node: self.label(child),
                parent: self.label(self.node(existing as usize)),
            });
        }
        self.check_acyclic(child, parent)?;

        self.taxa[c].parent = Some(p as u32);
        self.taxa[p].children.push(child);
        self.invalidate_path(parent);
        self.invalidate_depths(child);
        Ok(())
    }

    /// Remove `node` from its parent's children; the node keeps its subtree.
    pub fn detach(&mut self, node: Node) -> Result<(), StructureError> {
        let n = self.check_live(node)?;
        let Some(p) = self.taxa[n].parent else {
            return Ok(());
        };
        let parent = self.node(p as usize);

        self.taxa[p as usize].children.retain(|&c| c != node);
        self.taxa[n].parent = None;
        self.invalidate_path(parent);
        self.invalidate_depths(node);
        Ok(())
    }

    /// Re-parent `node` under `new_parent`. The cycle check runs before the
    /// node is detached, so a refused move changes nothing.
    pub fn move_to(&mut self, node: Node, new_parent: Node) -> Result<(), StructureError> {
        self.check_live(node)?;
        self.check_live(new_parent)?;
        self.check_acyclic(node, new_parent)?;

        debug!(
            node = %self.label(node),
            parent = %self.label(new_parent),
            "moving taxon"
        );
        self.detach(node)?;
        self.attach(node, new_parent)
    }

    /// Remove the subtree at `node` from the taxonomy: detach it, drop its
    /// names and ids from the indexes and mark every taxon removed.
    pub fn prune(&mut self, node: Node) -> Result<usize, StructureError> {
        let n = self.check_live(node)?;
        if n == FOREST_INDEX {
            return Err(StructureError::Removed {
                node: self.label(node),
            });
        }
        self.detach(node)?;

        let doomed: Vec<Node> = self.preorder(node).collect();
        for &d in &doomed {
            let taxon = &self.taxa[d.index()];
            let mut names: Vec<String> = taxon.synonyms.clone();
            names.extend(taxon.name.clone());
            let id = taxon.id.clone();

            for name in names {
                self.unindex_name(&name, d);
            }
            if let Some(id) = id {
                self.ids.remove(&id);
            }

            let taxon = &mut self.taxa[d.index()];
            taxon.removed = true;
            taxon.children.clear();
            taxon.parent = None;
            taxon.invalidate();
        }
        self.live -= doomed.len();
        Ok(doomed.len())
    }

    /// Change the primary name, keeping the name index current
    pub fn set_name(&mut self, node: Node, name: Option<&str>) -> Result<(), StructureError> {
        let n = self.check_live(node)?;
        if let Some(old) = self.taxa[n].name.take() {
            if !self.taxa[n].synonyms.contains(&old) {
                self.unindex_name(&old, node);
            }
        }
        if let Some(name) = name {
            self.index_name(name, node);
        }
        self.taxa[n].name = name.map(str::to_string);
        Ok(())
    }

    /// Record a synonym. Returns false when the name was already known for
    /// this taxon.
    pub fn add_synonym(&mut self, node: Node, name: &str) -> Result<bool, StructureError> {
        let n = self.check_live(node)?;
        let taxon = &self.taxa[n];
        if taxon.name.as_deref() == Some(name) || taxon.synonyms.iter().any(|s| s == name) {
            return Ok(false);
        }
        self.taxa[n].synonyms.push(name.to_string());
        self.index_name(name, node);
        Ok(true)
    }

    pub fn set_rank(&mut self, node: Node, rank: Rank) -> Result<(), StructureError> {
        let n = self.check_live(node)?;
        self.taxa[n].rank = rank;
        Ok(())
    }

    pub fn add_flag(&mut self, node: Node, flag: Flag) -> Result<(), StructureError> {
        let n = self.check_live(node)?;
        self.taxa[n].proper_flags.insert(flag);
        Ok(())
    }

    pub fn remove_flag(&mut self, node: Node, flag: Flag) -> Result<(), StructureError> {
        let n = self.check_live(node)?;
        self.taxa[n].proper_flags.remove(flag);
        Ok(())
    }

    pub fn set_proper_flags(&mut self, node: Node, flags: Flags) -> Result<(), StructureError> {
        let n = self.check_live(node)?;
        self.taxa[n].proper_flags = flags;
        Ok(())
    }

    /// Append a source reference unless already present
    pub fn add_source_ref(&mut self, node: Node, qid: QualifiedId) -> Result<(), StructureError> {
        let n = self.check_live(node)?;
        let sources = &mut self.taxa[n].sources;
        if !sources.contains(&qid) {
            sources.push(qid);
        }
        Ok(())
    }

    /// Recompute inherited flags top-down from every root
    pub fn infer_flags(&mut self) {
        let inheritable = Flags::inheritable();
        let order: Vec<Node> = self.walk().collect();
        for node in order {
            let inherited = match self.parent(node) {
                Some(parent) => {
                    let p = &self.taxa[parent.index()];
                    p.proper_flags.union(p.inherited_flags).intersection(inheritable)
                }
                None => Flags::NONE,
            };
            self.taxa[node.index()].inherited_flags = inherited;
        }
    }

    fn check_acyclic(&self, child: Node, parent: Node) -> Result<(), StructureError> {
        if child == parent {
            return Err(StructureError::SelfParent {
                node: self.label(child),
            });
        }
        // compare depths first: a shallower parent cannot be a descendant
        if self.depth(parent) > self.depth(child) && self.descends_from(parent, child) {
            let mut lineage = vec![self.label(parent)];
            lineage.extend(self.ancestors(parent).map(|a| self.label(a)));
            return Err(StructureError::Cycle {
                node: self.label(child),
                parent: self.label(parent),
                lineage,
            });
        }
        Ok(())
    }

    /// Subtree sizes of `from` and its ancestors are stale
    fn invalidate_path(&mut self, from: Node) {
        let mut current = Some(from.index());
        while let Some(i) = current {
            self.taxa[i].count.set(None);
            current = self.taxa[i].parent.map(|p| p as usize);
        }
    }

    /// Depths in the subtree at `node` are stale
    fn invalidate_depths(&mut self, node: Node) {
        let stale: Vec<Node> = self.preorder(node).collect();
        for n in stale {
            self.taxa[n.index()].depth.set(None);
        }
    }
}
