//! Merging an aligned source taxonomy into the union.
//!
//! Five passes, strictly in order:
//!
//! 1. scope: the union region each unaligned source node must stay within
//! 2. cross-MRCA: the union node the node's aligned members point at
//! 3. placement: reflected, resolution, conflict or new
//! 4. graft: apply placements in preorder, mutating the union
//! 5. transfer: names, ranks, sticky flags and references onto matched nodes
//!
//! Passes 1-3 only read; the union is first touched in pass 4.

mod graft;
mod placement;
mod scope;
mod transfer;
pub mod union;

pub use placement::Placement;
pub use scope::Scope;
pub use transfer::copy_properties;
pub use union::UnionTaxonomy;

use crate::alignment::Alignment;
use crate::report::{ConflictRecord, ReportSink};
use crate::taxonomy::{Node, Taxonomy};
use graft::Grafter;
use scope::Subproblems;
use serde::Serialize;
use taxomerge_core::config::MergeConfig;
use taxomerge_core::TaxomergeResult;
use tracing::{debug, info};

/// What one merge did to the union
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeOutcome {
    /// Idspace of the merged source
    pub source: String,
    /// Aligned nodes accepted at their image
    pub accepted: usize,
    /// Unaligned groupings the union already had
    pub reflected: usize,
    /// Reflected onto a same-named ancestor of their cross-MRCA
    pub elevated: usize,
    /// New union nodes inserted to refine an existing one
    pub resolutions: usize,
    /// Consistent groupings merged into their target instead
    pub absorbed: usize,
    /// Nodes copied as new
    pub grafted: usize,
    /// Nodes skipped because the union already had a same-named sibling
    pub redundant: usize,
    /// Member images dropped for lying outside their scope
    pub ejected: usize,
    /// Unaligned groupings left out because every member was ejected
    pub emptied: usize,
    pub conflicts: Vec<ConflictRecord>,
    /// Source nodes rejected as conflicts
    #[serde(skip)]
    pub unplaced: Vec<Node>,
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Merge `source` into `union` using a finished alignment.
///
/// The alignment's correspondence is extended with every node this merge
/// places, so after the call it maps each placed source node to its union
/// counterpart. Structural errors abort the merge; everything else is
/// counted in `sink`.
pub fn merge(
    source: &Taxonomy,
    union: &mut Taxonomy,
    alignment: &mut Alignment,
    config: &MergeConfig,
    sink: &mut dyn ReportSink,
) -> TaxomergeResult<MergeOutcome> {
    let _span = tracing::info_span!("merge", source = source.tag()).entered();
    let mut outcome = MergeOutcome {
        source: source.tag().to_string(),
        ..Default::default()
    };

    let sub = Subproblems::compute(source, union, alignment.correspondence(), sink)?;
    outcome.ejected = sub.ejected;
    info!(ejected = sub.ejected, "scopes and cross-MRCAs assigned");

    let placements = placement::place_all(source, union, alignment, &sub);
    debug!(nodes = placements.len(), "placements decided");

    let created = {
        let mut grafter = Grafter::new(source, union, alignment, &sub, config, sink);
        grafter.run(&placements, &mut outcome)?;
        grafter.created
    };
    info!(
        accepted = outcome.accepted,
        reflected = outcome.reflected,
        resolutions = outcome.resolutions,
        grafted = outcome.grafted,
        conflicts = outcome.conflicts.len(),
        "grafted"
    );

    let mut transferred = 0usize;
    for s in source.walk() {
        if created[s.index()] {
            continue;
        }
        if let Some(u) = alignment.image(s) {
            copy_properties(source, s, union, u, config)?;
            transferred += 1;
        }
    }
    info!(transferred, "properties transferred");
    Ok(outcome)
}
