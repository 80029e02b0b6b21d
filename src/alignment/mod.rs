//! Aligning a source taxonomy to the union.
//!
//! Every name the two taxonomies share becomes a [`Matrix`] of homonyms.
//! Names are processed in three batches (primary/primary,
//! primary/synonym, synonym/primary), each in the source's name order, so
//! repeated runs over the same input make the same decisions. Tips are
//! aligned first; their matches number the source so that subsumption can
//! inform the internal nodes.

pub mod answer;
pub mod correspondence;
pub mod criterion;
pub mod division;
pub mod matrix;

pub use answer::{Answer, Grade};
pub use correspondence::Correspondence;
pub use criterion::{Context, Criterion, DivisionContext};
pub use division::Divisions;
pub use matrix::{Matrix, MatrixOutcome};

use crate::report::ReportSink;
use crate::taxonomy::{Brackets, Node, Taxonomy};
use taxomerge_core::config::AlignmentConfig;
use taxomerge_core::TaxomergeResult;
use tracing::{debug, info};

/// Which name of a taxon a batch looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Primary,
    Synonym,
}

const BATCHES: [(Role, Role); 3] = [
    (Role::Primary, Role::Primary),
    (Role::Primary, Role::Synonym),
    (Role::Synonym, Role::Primary),
];

fn carrying(taxonomy: &Taxonomy, name: &str, role: Role) -> Vec<Node> {
    match role {
        Role::Primary => taxonomy.lookup_primary(name).collect(),
        Role::Synonym => taxonomy.lookup_synonym(name).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Tips,
    Internal,
    All,
}

impl Phase {
    fn admits(self, taxonomy: &Taxonomy, node: Node) -> bool {
        match self {
            Phase::Tips => taxonomy.is_tip(node),
            Phase::Internal => !taxonomy.is_tip(node),
            Phase::All => true,
        }
    }
}

/// Totals over every matrix of an alignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub matrices: usize,
    pub matched: usize,
    pub lost_race: usize,
    pub unmatched: usize,
}

/// Result of aligning one source taxonomy to the union
#[derive(Debug, Clone)]
pub struct Alignment {
    correspondence: Correspondence,
    union_brackets: Brackets,
    source_brackets: Brackets,
    summary: AlignmentSummary,
}

impl Alignment {
    /// Align `source` to `union`.
    ///
    /// `skeleton` enables the division criterion. Unmatched nodes are never
    /// an error; each gets an explanation in the correspondence and a count
    /// in `sink`.
    pub fn align(
        source: &Taxonomy,
        union: &Taxonomy,
        config: &AlignmentConfig,
        skeleton: Option<&Taxonomy>,
        sink: &mut dyn ReportSink,
    ) -> TaxomergeResult<Alignment> {
        let _span = tracing::info_span!("align", source = source.tag()).entered();

        let criteria: Vec<Criterion> = Criterion::ORDER
            .iter()
            .copied()
            .filter(|&c| config.use_elimination || c != Criterion::Elimination)
            .collect();
        let divisions = skeleton.map(|k| {
            (
                k,
                Divisions::compute(k, source),
                Divisions::compute(k, union),
            )
        });

        let union_brackets = Brackets::assign(union);
        let mut correspondence = Correspondence::new(source, union);
        let mut summary = AlignmentSummary::default();

        let shared: Vec<&str> = source
            .names()
            .filter(|name| !union.lookup(name).is_empty())
            .collect();
        debug!(names = shared.len(), "names shared with the union");

        let phases: &[Phase] = if config.tips_first {
            &[Phase::Tips, Phase::Internal]
        } else {
            &[Phase::All]
        };

        let mut source_brackets: Option<Brackets> = None;
        for &phase in phases {
            let ctx = Context {
                source,
                union,
                source_brackets: source_brackets.as_ref(),
                union_brackets: &union_brackets,
                divisions: divisions.as_ref().map(|(k, s, u)| DivisionContext {
                    skeleton: *k,
                    source: s,
                    union: u,
                }),
            };

            for (source_role, union_role) in BATCHES {
                for &name in &shared {
                    let rows: Vec<Node> = carrying(source, name, source_role)
                        .into_iter()
                        .filter(|&n| phase.admits(source, n) && !correspondence.is_mapped(n))
                        .collect();
                    if rows.is_empty() {
                        continue;
                    }
                    let cols = carrying(union, name, union_role);
                    if cols.is_empty() {
                        continue;
                    }

                    let mut matrix = Matrix::new(name, rows, cols);
                    let outcome = matrix.run(&ctx, &criteria, &mut correspondence, sink)?;
                    summary.matrices += 1;
                    summary.matched += outcome.matched;
                    summary.lost_race += outcome.lost_race;
                    summary.unmatched += outcome.unmatched;
                }
            }

            source_brackets = Some(Brackets::infer(source, &union_brackets, |n| {
                correspondence.image(n)
            }));
            debug!(?phase, matched = summary.matched, "alignment phase done");
        }

        // unmatched rows of the tip phase may have been retried later
        summary.unmatched = source
            .walk()
            .filter(|&n| !correspondence.is_mapped(n) && correspondence.answer(n).is_some())
            .count();

        info!(
            source = source.tag(),
            matched = correspondence.len(),
            unmatched = summary.unmatched,
            lost_race = summary.lost_race,
            "aligned"
        );
        sink.count_n("aligned", correspondence.len());

        let source_brackets = source_brackets.unwrap_or_else(|| {
            Brackets::infer(source, &union_brackets, |n| correspondence.image(n))
        });
        Ok(Alignment {
            correspondence,
            union_brackets,
            source_brackets,
            summary,
        })
    }

    pub fn correspondence(&self) -> &Correspondence {
        &self.correspondence
    }

    pub(crate) fn correspondence_mut(&mut self) -> &mut Correspondence {
        &mut self.correspondence
    }

    /// Union node a source node was matched to
    pub fn image(&self, source: Node) -> Option<Node> {
        self.correspondence.image(source)
    }

    /// Answer that decided a source node
    pub fn answer(&self, source: Node) -> Option<&Answer> {
        self.correspondence.answer(source)
    }

    /// Union numbering as it was when the alignment ran
    pub fn union_brackets(&self) -> &Brackets {
        &self.union_brackets
    }

    /// Source numbering inferred from the final matches
    pub fn source_brackets(&self) -> &Brackets {
        &self.source_brackets
    }

    pub fn summary(&self) -> &AlignmentSummary {
        &self.summary
    }
}
