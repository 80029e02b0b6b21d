//! The union taxonomy as a merge session

use super::{merge, MergeOutcome};
use crate::alignment::Alignment;
use crate::report::ReportSink;
use crate::taxonomy::Taxonomy;
use taxomerge_core::{Config, Flag, TaxomergeResult};
use tracing::info;

/// Idspace tag of the union taxonomy
pub const UNION_TAG: &str = "union";

/// Owns the union being built, the configuration and the division skeleton.
///
/// Sources are absorbed one at a time, in priority order: earlier sources
/// win where later ones disagree.
#[derive(Debug)]
pub struct UnionTaxonomy {
    taxonomy: Taxonomy,
    config: Config,
    skeleton: Option<Taxonomy>,
    absorbed: Vec<String>,
}

impl UnionTaxonomy {
    /// Start an empty union. The skeleton, if configured, is parsed here.
    pub fn new(config: Config) -> TaxomergeResult<Self> {
        let skeleton = config
            .alignment
            .skeleton
            .as_deref()
            .map(|text| Taxonomy::from_nested("skeleton", text))
            .transpose()?;
        Ok(Self {
            taxonomy: Taxonomy::new(UNION_TAG),
            config,
            skeleton,
            absorbed: Vec::new(),
        })
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn into_taxonomy(self) -> Taxonomy {
        self.taxonomy
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn skeleton(&self) -> Option<&Taxonomy> {
        self.skeleton.as_ref()
    }

    /// Tags of the sources absorbed so far, in order
    pub fn sources(&self) -> &[String] {
        &self.absorbed
    }

    /// Align and merge one source.
    ///
    /// Source nodes rejected as conflicts get the proper flag `unplaced`;
    /// inherited flags of the union are recomputed afterwards.
    pub fn absorb(
        &mut self,
        source: &mut Taxonomy,
        sink: &mut dyn ReportSink,
    ) -> TaxomergeResult<MergeOutcome> {
        let mut alignment = Alignment::align(
            source,
            &self.taxonomy,
            &self.config.alignment,
            self.skeleton.as_ref(),
            sink,
        )?;
        let outcome = merge(
            source,
            &mut self.taxonomy,
            &mut alignment,
            &self.config.merge,
            sink,
        )?;

        for &node in &outcome.unplaced {
            source.add_flag(node, Flag::Unplaced)?;
        }
        self.taxonomy.infer_flags();
        self.absorbed.push(source.tag().to_string());

        info!(
            source = source.tag(),
            union_size = self.taxonomy.len(),
            conflicts = outcome.conflicts.len(),
            "absorbed"
        );
        Ok(outcome)
    }
}
