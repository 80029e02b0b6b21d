//! How input nodes find their counterparts in the reference taxonomy

use crate::alignment::Alignment;
use crate::taxonomy::{Node, Taxonomy};
use std::collections::HashMap;
use taxomerge_core::config::TipKey;
use taxomerge_core::QualifiedId;

/// Node lookup from an input taxonomy into a reference taxonomy
pub trait TipCorrespondence {
    fn correspond(&self, input: &Taxonomy, reference: &Taxonomy, node: Node) -> Option<Node>;
}

/// Same primary name; homonyms in the reference give no answer
#[derive(Debug, Default, Clone, Copy)]
pub struct ByName;

impl TipCorrespondence for ByName {
    fn correspond(&self, input: &Taxonomy, reference: &Taxonomy, node: Node) -> Option<Node> {
        reference.lookup_unique(input[node].name()?)
    }
}

/// Same identifier, for taxonomies sharing an idspace
#[derive(Debug, Default, Clone, Copy)]
pub struct ById;

impl TipCorrespondence for ById {
    fn correspond(&self, input: &Taxonomy, reference: &Taxonomy, node: Node) -> Option<Node> {
        reference.by_id(input[node].id()?)
    }
}

/// Any shared qualified reference
#[derive(Debug, Clone)]
pub struct BySource {
    index: HashMap<QualifiedId, Node>,
}

impl BySource {
    /// Index every reference of every reference-taxonomy node. The first
    /// node to claim a reference keeps it.
    pub fn new(reference: &Taxonomy) -> Self {
        let mut index = HashMap::new();
        for node in reference.walk() {
            for qid in reference.references(node) {
                index.entry(qid).or_insert(node);
            }
        }
        Self { index }
    }
}

impl TipCorrespondence for BySource {
    fn correspond(&self, input: &Taxonomy, _reference: &Taxonomy, node: Node) -> Option<Node> {
        input
            .references(node)
            .iter()
            .find_map(|qid| self.index.get(qid).copied())
    }
}

/// The matches of an alignment whose union is the reference
impl TipCorrespondence for Alignment {
    fn correspond(&self, _input: &Taxonomy, _reference: &Taxonomy, node: Node) -> Option<Node> {
        self.image(node)
    }
}

/// Wraps a closure as a correspondence
pub struct FnCorrespondence<F>(pub F);

impl<F> TipCorrespondence for FnCorrespondence<F>
where
    F: Fn(Node) -> Option<Node>,
{
    fn correspond(&self, _input: &Taxonomy, _reference: &Taxonomy, node: Node) -> Option<Node> {
        (self.0)(node)
    }
}

/// Correspondence selected by configuration
pub fn for_key(key: TipKey, reference: &Taxonomy) -> Box<dyn TipCorrespondence> {
    match key {
        TipKey::Name => Box::new(ByName),
        TipKey::Id => Box::new(ById),
        TipKey::Source => Box::new(BySource::new(reference)),
    }
}
