//! Carrying names, ranks, flags and references across to the union

use crate::taxonomy::{Node, Taxonomy};
use taxomerge_core::config::MergeConfig;
use taxomerge_core::StructureError;

/// Copy what the union node lacks from source node `s`.
///
/// The name fills a nameless target, otherwise it becomes a synonym. Rank
/// only fills an unranked target. Sticky flags are OR-ed in; references
/// and synonyms accumulate.
pub fn copy_properties(
    source: &Taxonomy,
    s: Node,
    union: &mut Taxonomy,
    u: Node,
    config: &MergeConfig,
) -> Result<(), StructureError> {
    let taxon = &source[s];

    if let Some(name) = taxon.name() {
        if union[u].name().is_none() {
            union.set_name(u, Some(name))?;
        } else {
            union.add_synonym(u, name)?;
        }
    }
    if !union[u].rank().is_ranked() && taxon.rank().is_ranked() {
        union.set_rank(u, taxon.rank())?;
    }
    for &flag in &config.sticky_flags {
        if taxon.proper_flags().contains(flag) {
            union.add_flag(u, flag)?;
        }
    }
    for qid in source.references(s) {
        union.add_source_ref(u, qid)?;
    }
    for synonym in taxon.synonyms() {
        union.add_synonym(u, synonym)?;
    }
    Ok(())
}
