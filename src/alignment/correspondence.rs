//! Per-session node correspondence between a source and the union

use crate::alignment::Answer;
use crate::taxonomy::{Node, Taxonomy};
use std::collections::HashMap;
use taxomerge_core::StructureError;

/// Source -> union images, the union -> source witness for each image, and
/// the answer that explains every decided source node.
///
/// Several source nodes may map to one union node (lumping); only one of
/// them is recorded as its witness.
#[derive(Debug, Clone)]
pub struct Correspondence {
    source_key: u32,
    union_key: u32,
    source_tag: String,
    union_tag: String,
    image: Vec<Option<Node>>,
    answers: Vec<Option<Answer>>,
    witness: HashMap<Node, Node>,
}

impl Correspondence {
    pub fn new(source: &Taxonomy, union: &Taxonomy) -> Self {
        Self {
            source_key: source.key(),
            union_key: union.key(),
            source_tag: source.tag().to_string(),
            union_tag: union.tag().to_string(),
            image: vec![None; source.capacity()],
            answers: vec![None; source.capacity()],
            witness: HashMap::new(),
        }
    }

    fn check(&self, source: Node, union: Node) -> Result<(), StructureError> {
        if source.key() != self.source_key {
            return Err(StructureError::ForeignNode {
                expected: self.source_tag.clone(),
                found: format!("taxonomy #{}", source.key()),
            });
        }
        if union.key() != self.union_key {
            return Err(StructureError::ForeignNode {
                expected: self.union_tag.clone(),
                found: format!("taxonomy #{}", union.key()),
            });
        }
        Ok(())
    }

    /// Union node a source node maps to
    pub fn image(&self, source: Node) -> Option<Node> {
        if source.key() != self.source_key {
            return None;
        }
        self.image.get(source.index()).copied().flatten()
    }

    /// Source node recorded as the witness of a union node
    pub fn coimage(&self, union: Node) -> Option<Node> {
        self.witness.get(&union).copied()
    }

    /// Answer that decided a source node, matched or not
    pub fn answer(&self, source: Node) -> Option<&Answer> {
        self.answers.get(source.index()).and_then(Option::as_ref)
    }

    pub fn is_mapped(&self, source: Node) -> bool {
        self.image(source).is_some()
    }

    /// Map `source` to `union`. The source node becomes the union node's
    /// witness when it has none yet. Returns whether it did.
    pub fn record(
        &mut self,
        source: Node,
        union: Node,
        answer: Answer,
    ) -> Result<bool, StructureError> {
        self.check(source, union)?;
        let i = source.index();
        if i >= self.image.len() {
            self.image.resize(i + 1, None);
            self.answers.resize(i + 1, None);
        }
        self.image[i] = Some(union);
        self.answers[i] = Some(answer);

        if self.witness.contains_key(&union) {
            return Ok(false);
        }
        self.witness.insert(union, source);
        Ok(true)
    }

    /// Make `source` the witness of its image, displacing any previous one
    pub fn take_witness(&mut self, source: Node) -> Option<Node> {
        let union = self.image(source)?;
        self.witness.insert(union, source)
    }

    /// Explain why a source node stayed unmatched. Mapped nodes keep the
    /// answer that matched them.
    pub fn explain(&mut self, source: Node, answer: Answer) {
        let i = source.index();
        if i >= self.answers.len() {
            self.answers.resize(i + 1, None);
            self.image.resize(i + 1, None);
        }
        if self.image[i].is_none() {
            self.answers[i] = Some(answer);
        }
    }

    /// Mapped pairs in source arena order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, Node)> + '_ {
        self.image
            .iter()
            .enumerate()
            .filter_map(|(i, u)| u.map(|u| (i, u)))
    }

    pub fn len(&self) -> usize {
        self.image.iter().filter(|u| u.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Image of the nearest ancestor-or-self of `node` that has one
    pub fn bridge(&self, source: &Taxonomy, node: Node) -> Option<Node> {
        std::iter::once(node)
            .chain(source.ancestors(node))
            .find_map(|n| self.image(n))
    }

    /// Where the union images of two source nodes part ways.
    ///
    /// Both sides are bridged to the union first; `None` when either bridge
    /// is missing or one image contains the other.
    pub fn divergence(
        &self,
        source: &Taxonomy,
        union: &Taxonomy,
        a: Node,
        b: Node,
    ) -> Result<Option<(Node, Node)>, StructureError> {
        match (self.bridge(source, a), self.bridge(source, b)) {
            (Some(x), Some(y)) => union.divergence(x, y),
            _ => Ok(None),
        }
    }
}
