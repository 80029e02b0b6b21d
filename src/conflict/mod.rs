//! Articulating an input taxonomy against a reference.
//!
//! Each input node gets exactly one [`Disposition`]: how its membership, as
//! seen through the tips both trees share, relates to the groupings of the
//! reference. The reference is never modified.

mod tips;

pub use tips::{for_key, ById, ByName, BySource, FnCorrespondence, TipCorrespondence};

use crate::report::{ConflictRecord, ReportSink};
use crate::taxonomy::{antiwitness, witness, Brackets, Node, Taxonomy};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use taxomerge_core::TaxomergeResult;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// No descendant maps to the reference
    None,
    /// The reference has a node with exactly these members
    SupportedBy,
    /// Supported, and the parent of the supporting input node maps to the
    /// same reference node: a chain of input nodes over one reference node
    PathSupportedBy,
    /// Compatible refinement: would split the witness without crossing any
    /// of its children
    Resolves,
    /// Crosses the witness, a reference child only partly inside the node
    ConflictsWith,
}

impl Disposition {
    pub const ALL: [Disposition; 5] = [
        Disposition::None,
        Disposition::SupportedBy,
        Disposition::PathSupportedBy,
        Disposition::Resolves,
        Disposition::ConflictsWith,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::None => "none",
            Disposition::SupportedBy => "supported_by",
            Disposition::PathSupportedBy => "path_supported_by",
            Disposition::Resolves => "resolves",
            Disposition::ConflictsWith => "conflicts_with",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disposition of one input node and the reference node it concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Articulation {
    pub disposition: Disposition,
    pub witness: Option<Node>,
}

/// Dispositions of every node of an input taxonomy against a reference
#[derive(Debug)]
pub struct ConflictAnalysis {
    input_tag: String,
    reference_tag: String,
    articulations: Vec<Option<Articulation>>,
    conflicts: Vec<ConflictRecord>,
}

/// Per-node intermediate results
struct Maps {
    /// input -> reference, quasi-tips only
    map: Vec<Option<Node>>,
    /// input -> reference MRCA of mapped members
    xmrca: Vec<Option<Node>>,
    /// reference -> input MRCA of the input nodes mapped directly to it
    direct: Vec<Option<Node>>,
    /// reference -> input MRCA over its whole subtree
    co: Vec<Option<Node>>,
}

impl ConflictAnalysis {
    pub fn new(
        input: &Taxonomy,
        reference: &Taxonomy,
        tips: &dyn TipCorrespondence,
    ) -> TaxomergeResult<Self> {
        let _span =
            tracing::info_span!("conflict", input = input.tag(), reference = reference.tag())
                .entered();

        let maps = Maps::compute(input, reference, tips)?;
        let reference_brackets = Brackets::assign(reference);
        let input_brackets =
            Brackets::infer(input, &reference_brackets, |n| maps.map[n.index()]);
        let judge = Judge {
            input,
            reference,
            maps: &maps,
            ib: &input_brackets,
            rb: &reference_brackets,
        };

        let mut articulations = vec![None; input.capacity()];
        let mut conflicts = Vec::new();
        for x in input.walk() {
            let articulation = judge.articulate(x);
            if articulation.disposition == Disposition::ConflictsWith {
                if let Some(child) = articulation.witness {
                    conflicts.push(judge.record(x, child)?);
                }
            }
            debug!(
                node = %input.label(x),
                disposition = %articulation.disposition,
                witness = ?articulation.witness.map(|w| reference.label(w)),
                "articulated"
            );
            articulations[x.index()] = Some(articulation);
        }

        let analysis = Self {
            input_tag: input.tag().to_string(),
            reference_tag: reference.tag().to_string(),
            articulations,
            conflicts,
        };
        info!(
            nodes = input.len(),
            conflicts = analysis.conflicts.len(),
            "conflict analysis done"
        );
        Ok(analysis)
    }

    pub fn input_tag(&self) -> &str {
        &self.input_tag
    }

    pub fn reference_tag(&self) -> &str {
        &self.reference_tag
    }

    pub fn articulation(&self, node: Node) -> Option<Articulation> {
        self.articulations.get(node.index()).copied().flatten()
    }

    pub fn disposition(&self, node: Node) -> Option<Disposition> {
        self.articulation(node).map(|a| a.disposition)
    }

    /// Node count per disposition, in declaration order
    pub fn summary(&self) -> IndexMap<Disposition, usize> {
        let mut counts: IndexMap<Disposition, usize> =
            Disposition::ALL.iter().map(|&d| (d, 0)).collect();
        for a in self.articulations.iter().flatten() {
            *counts.entry(a.disposition).or_insert(0) += 1;
        }
        counts
    }

    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    /// Write counts and conflict records to a sink
    pub fn report(&self, sink: &mut dyn ReportSink) {
        for (disposition, n) in self.summary() {
            sink.count_n(disposition.as_str(), n);
        }
        for record in &self.conflicts {
            sink.conflict(record.clone());
        }
    }
}

impl Maps {
    fn compute(
        input: &Taxonomy,
        reference: &Taxonomy,
        tips: &dyn TipCorrespondence,
    ) -> TaxomergeResult<Self> {
        let mut maps = Maps {
            map: vec![None; input.capacity()],
            xmrca: vec![None; input.capacity()],
            direct: vec![None; reference.capacity()],
            co: vec![None; reference.capacity()],
        };

        // quasi-tips first: a node maps only when nothing below it does
        let mut mapped_below = vec![false; input.capacity()];
        for x in input.postorder(input.forest()) {
            if input.is_forest(x) {
                continue;
            }
            let below = input.children(x).iter().any(|c| {
                maps.map[c.index()].is_some() || mapped_below[c.index()]
            });
            mapped_below[x.index()] = below;
            if !below {
                let found = tips.correspond(input, reference, x);
                if let Some(r) = found {
                    reference.check(r)?;
                }
                maps.map[x.index()] = found;
            }
        }

        for x in input.postorder(input.forest()) {
            if input.is_forest(x) {
                continue;
            }
            maps.xmrca[x.index()] = match maps.map[x.index()] {
                Some(r) => Some(r),
                None => reference.mrca_of(
                    input
                        .children(x)
                        .iter()
                        .filter_map(|c| maps.xmrca[c.index()]),
                )?,
            };
        }

        let mut inverse: Vec<Vec<Node>> = vec![Vec::new(); reference.capacity()];
        for x in input.walk() {
            if let Some(r) = maps.map[x.index()] {
                inverse[r.index()].push(x);
            }
        }
        for r in reference.postorder(reference.forest()) {
            let direct = input.mrca_of(inverse[r.index()].iter().copied())?;
            maps.direct[r.index()] = direct;
            let below = reference
                .children(r)
                .iter()
                .filter_map(|c| maps.co[c.index()]);
            maps.co[r.index()] = input.mrca_of(direct.into_iter().chain(below))?;
        }
        Ok(maps)
    }
}

struct Judge<'a> {
    input: &'a Taxonomy,
    reference: &'a Taxonomy,
    maps: &'a Maps,
    ib: &'a Brackets,
    rb: &'a Brackets,
}

impl Judge<'_> {
    fn co(&self, r: Node) -> Option<Node> {
        self.maps.co[r.index()]
    }

    fn articulate(&self, x: Node) -> Articulation {
        let Some(conode) = self.maps.xmrca[x.index()].filter(|&r| !self.reference.is_forest(r))
        else {
            return match self.maps.xmrca[x.index()] {
                // members spread over several reference trees
                Some(forest) => self.split(x, forest),
                None => Articulation {
                    disposition: Disposition::None,
                    witness: None,
                },
            };
        };

        let bounce = self.co(conode);
        if let Some(bounce) = bounce.filter(|&b| self.input.within(b, x)) {
            let witness = self.largest_supporting(conode, bounce);
            let path = self
                .input
                .parent(bounce)
                .is_some_and(|p| self.maps.xmrca[p.index()] == Some(conode));
            return Articulation {
                disposition: if path {
                    Disposition::PathSupportedBy
                } else {
                    Disposition::SupportedBy
                },
                witness: Some(witness),
            };
        }
        self.split(x, conode)
    }

    /// Highest ancestor-or-self of `conode` holding no other input members
    fn largest_supporting(&self, conode: Node, bounce: Node) -> Node {
        let mut top = conode;
        while let Some(parent) = self.reference.parent(top) {
            if self.co(parent) != Some(bounce) {
                break;
            }
            top = parent;
        }
        top
    }

    fn split(&self, x: Node, conode: Node) -> Articulation {
        for &child in self.reference.children(conode) {
            let included = self.co(child).is_some_and(|c| self.input.within(c, x));
            if included {
                continue;
            }
            if witness(self.input, self.ib, x, self.rb, child).is_some() {
                return Articulation {
                    disposition: Disposition::ConflictsWith,
                    witness: Some(child),
                };
            }
        }
        Articulation {
            disposition: Disposition::Resolves,
            witness: Some(conode),
        }
    }

    fn record(&self, x: Node, child: Node) -> TaxomergeResult<ConflictRecord> {
        let (input, reference) = (self.input, self.reference);
        let inside = witness(input, self.ib, x, self.rb, child);
        let outside = reference.preorder(child).find(|&r| {
            self.maps.direct[r.index()].is_some_and(|m| !input.within(m, x))
        });
        let divergence = match (inside.and_then(|n| self.maps.map[n.index()]), outside) {
            (Some(a), Some(b)) => reference
                .divergence(a, b)?
                .map(|(p, q)| (reference.label(p), reference.label(q))),
            _ => None,
        };
        let outside = outside
            .map(|r| reference.label(r))
            .or_else(|| antiwitness(input, self.ib, x, self.rb, child).map(|n| input.label(n)));
        let target = reference
            .parent_or_forest(child)
            .map(|p| reference.label(p))
            .unwrap_or_default();

        Ok(ConflictRecord {
            source: input.tag().to_string(),
            node: input.unique_name(x),
            target,
            conflicting_child: reference.label(child),
            inside: inside.map(|n| input.label(n)),
            outside,
            divergence,
        })
    }
}
