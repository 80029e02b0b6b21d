//! Applying placements to the union, parents before children

use super::placement::Placement;
use super::scope::{Scope, Subproblems};
use super::transfer;
use super::MergeOutcome;
use crate::alignment::{Alignment, Answer, Grade};
use crate::report::{ConflictRecord, EventKind, ReportSink};
use crate::taxonomy::{antiwitness, witness, Brackets, Node, Taxonomy};
use taxomerge_core::config::MergeConfig;
use taxomerge_core::{Flag, TaxomergeResult};
use tracing::{debug, warn};

/// Where the source members under a union subtree come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    /// No source member at all
    Unaccounted,
    Inside,
    Outside,
    Mixed,
}

pub(super) struct Grafter<'a> {
    pub source: &'a Taxonomy,
    pub union: &'a mut Taxonomy,
    pub alignment: &'a mut Alignment,
    pub sub: &'a Subproblems,
    pub config: &'a MergeConfig,
    pub sink: &'a mut dyn ReportSink,
    /// source node -> union node its children attach under
    placed: Vec<Option<Node>>,
    /// source nodes rejected as conflicts
    rejected: Vec<bool>,
    /// source nodes whose union counterpart was created by this merge
    pub created: Vec<bool>,
    /// Source and union numbering rebuilt after the union changed
    renumbered: Option<(Brackets, Brackets)>,
    /// Union changed since the numbering in use was built
    stale: bool,
}

impl<'a> Grafter<'a> {
    pub fn new(
        source: &'a Taxonomy,
        union: &'a mut Taxonomy,
        alignment: &'a mut Alignment,
        sub: &'a Subproblems,
        config: &'a MergeConfig,
        sink: &'a mut dyn ReportSink,
    ) -> Self {
        let n = source.capacity();
        Self {
            source,
            union,
            alignment,
            sub,
            config,
            sink,
            placed: vec![None; n],
            rejected: vec![false; n],
            created: vec![false; n],
            renumbered: None,
            stale: false,
        }
    }

    pub fn run(&mut self, placements: &[Placement], outcome: &mut MergeOutcome) -> TaxomergeResult<()> {
        let order: Vec<Node> = self.source.walk().collect();
        for s in order {
            match placements[s.index()] {
                Placement::Aligned(image) => {
                    self.placed[s.index()] = Some(image);
                    outcome.accepted += 1;
                }
                Placement::Reflected { target, elevated } => {
                    let reason = if elevated { "elevated" } else { "membership" };
                    self.alignment
                        .correspondence_mut()
                        .record(s, target, Answer::yes(reason))?;
                    self.placed[s.index()] = Some(target);
                    self.sink.count(reason);
                    if elevated {
                        outcome.elevated += 1;
                    } else {
                        outcome.reflected += 1;
                    }
                }
                Placement::Resolution { lift } => self.resolve(s, lift, outcome)?,
                Placement::Conflict { target, child } => self.reject(s, target, child, outcome)?,
                Placement::Emptied => self.empty(s, outcome),
                Placement::New => self.graft_new(s, outcome)?,
            }
        }
        Ok(())
    }

    fn membership(&self, s: Node, u: Node) -> Membership {
        let corr = self.alignment.correspondence();
        let (mut inside, mut outside) = (false, false);
        for n in self.union.preorder(u) {
            if let Some(x) = corr.coimage(n) {
                if self.source.within(x, s) {
                    inside = true;
                } else {
                    outside = true;
                }
            }
        }
        match (inside, outside) {
            (false, false) => Membership::Unaccounted,
            (true, false) => Membership::Inside,
            (false, true) => Membership::Outside,
            (true, true) => Membership::Mixed,
        }
    }

    /// Insert a new union node for `s` between its target and the target's
    /// children that hold only members of `s`.
    fn resolve(&mut self, s: Node, lift: bool, outcome: &mut MergeOutcome) -> TaxomergeResult<()> {
        let contributions = self.sub.contributions(s).iter().copied();
        let Some(m) = self.union.mrca_of(contributions)? else {
            return self.graft_new(s, outcome);
        };
        let target = if lift && !self.union.is_forest(m) {
            self.union.parent_or_forest(m).unwrap_or_else(|| self.union.forest())
        } else {
            m
        };

        let escapes = match self.sub.scope(s) {
            Scope::Within(w) => !self.union.within(target, w),
            Scope::Forest | Scope::Detached => false,
        };
        let mut included = Vec::new();
        let mut unaccounted = 0usize;
        let mut partial = None;
        for &child in self.union.children(target) {
            match self.membership(s, child) {
                Membership::Inside => included.push(child),
                Membership::Outside => {}
                Membership::Unaccounted => unaccounted += 1,
                Membership::Mixed => {
                    partial.get_or_insert(child);
                }
            }
        }
        if let Some(child) = partial {
            return self.reject(s, target, child, outcome);
        }

        if escapes || (self.config.absorb_unaccounted && unaccounted > 0) || included.is_empty() {
            debug!(
                node = %self.source.label(s),
                target = %self.union.label(target),
                unaccounted,
                "absorbed into target"
            );
            self.alignment
                .correspondence_mut()
                .explain(s, Answer::new(Grade::NoInfo, "absorbed").with_witness(self.union.label(target)));
            self.placed[s.index()] = Some(target);
            self.sink.count("absorbed");
            outcome.absorbed += 1;
            return Ok(());
        }

        let node = self.create(s, target)?;
        for child in included {
            self.union.move_to(child, node)?;
        }
        self.stale = true;
        self.alignment
            .correspondence_mut()
            .record(s, node, Answer::yes("resolution"))?;
        self.sink.count("resolution");
        outcome.resolutions += 1;
        Ok(())
    }

    /// Renumber source and union once the union changed since the last
    /// numbering was built.
    fn refresh_brackets(&mut self) {
        if !self.stale {
            return;
        }
        let ub = Brackets::assign(self.union);
        let corr = self.alignment.correspondence();
        let sb = Brackets::infer(self.source, &ub, |n| corr.image(n));
        self.renumbered = Some((sb, ub));
        self.stale = false;
    }

    /// Source and union numbering, the alignment's until the first change
    fn brackets(&self) -> (&Brackets, &Brackets) {
        match &self.renumbered {
            Some((sb, ub)) => (sb, ub),
            None => (
                self.alignment.source_brackets(),
                self.alignment.union_brackets(),
            ),
        }
    }

    fn reject(
        &mut self,
        s: Node,
        target: Node,
        child: Node,
        outcome: &mut MergeOutcome,
    ) -> TaxomergeResult<()> {
        let record = self.conflict_record(s, target, child)?;
        let message = format!(
            "{} conflicts with {} under {}",
            record.node, record.conflicting_child, record.target
        );
        warn!("{}", message);

        let witness_label = self.union.label(child);
        self.alignment
            .correspondence_mut()
            .explain(s, Answer::no("conflict").with_witness(witness_label));
        self.sink.event(EventKind::Conflict, message);
        self.sink.count("conflict");
        self.sink.conflict(record.clone());
        outcome.conflicts.push(record);
        outcome.unplaced.push(s);
        self.placed[s.index()] = Some(target);
        self.rejected[s.index()] = true;
        Ok(())
    }

    fn conflict_record(&mut self, s: Node, target: Node, child: Node) -> TaxomergeResult<ConflictRecord> {
        self.refresh_brackets();
        let source = self.source;
        let union = &*self.union;
        let corr = self.alignment.correspondence();
        let (sb, ub) = self.brackets();

        let inside = witness(source, sb, s, ub, child);
        let outside = union
            .preorder(child)
            .find(|&u| corr.coimage(u).is_some_and(|x| !source.within(x, s)));
        let divergence = match (inside, outside.and_then(|u| corr.coimage(u))) {
            (Some(a), Some(b)) => corr
                .divergence(source, union, a, b)?
                .map(|(x, y)| (union.label(x), union.label(y))),
            _ => None,
        };
        // a member of s leaving the child shows the other side of the split
        let outside_label = outside
            .map(|u| union.label(u))
            .or_else(|| antiwitness(source, sb, s, ub, child).map(|n| source.label(n)));

        Ok(ConflictRecord {
            source: source.tag().to_string(),
            node: source.unique_name(s),
            target: union.label(target),
            conflicting_child: union.label(child),
            inside: inside.map(|n| source.label(n)),
            outside: outside_label,
            divergence,
        })
    }

    /// `s` keeps no member inside its scope. Nothing is created; its new
    /// descendants attach where its parent went.
    fn empty(&mut self, s: Node, outcome: &mut MergeOutcome) {
        let point = self
            .source
            .parent(s)
            .and_then(|p| self.placed[p.index()])
            .unwrap_or_else(|| self.union.forest());
        debug!(node = %self.source.label(s), "every member ejected");
        self.alignment
            .correspondence_mut()
            .explain(s, Answer::new(Grade::NoInfo, "emptied"));
        self.placed[s.index()] = Some(point);
        self.sink.count("emptied");
        outcome.emptied += 1;
    }

    /// Copy `s` under the counterpart of its parent
    fn graft_new(&mut self, s: Node, outcome: &mut MergeOutcome) -> TaxomergeResult<()> {
        let parent = self.source.parent(s);
        let point = parent
            .and_then(|p| self.placed[p.index()])
            .unwrap_or_else(|| self.union.forest());

        if let Some(name) = self.source[s].name() {
            let existing = self
                .union
                .children(point)
                .iter()
                .copied()
                .find(|&c| self.union[c].name() == Some(name));
            if let Some(existing) = existing {
                self.alignment
                    .correspondence_mut()
                    .record(s, existing, Answer::weak_yes("redundant"))?;
                self.placed[s.index()] = Some(existing);
                self.sink.count("redundant");
                outcome.redundant += 1;
                return Ok(());
            }
        }

        let node = self.create(s, point)?;
        if parent.is_some_and(|p| self.rejected[p.index()]) {
            self.union.add_flag(node, Flag::IncertaeSedis)?;
        }
        self.alignment
            .correspondence_mut()
            .record(s, node, Answer::yes("new"))?;
        self.sink.count("new");
        outcome.grafted += 1;
        Ok(())
    }

    /// New union node carrying the properties of `s`, attached under `parent`
    fn create(&mut self, s: Node, parent: Node) -> TaxomergeResult<Node> {
        let taxon = &self.source[s];
        let node = self.union.new_taxon(taxon.name(), taxon.rank(), None)?;
        self.union.attach(node, parent)?;

        let mut flags = taxon.proper_flags();
        flags.remove(Flag::Unplaced);
        self.union.set_proper_flags(node, flags)?;
        transfer::copy_properties(self.source, s, self.union, node, self.config)?;

        self.placed[s.index()] = Some(node);
        self.created[s.index()] = true;
        self.stale = true;
        Ok(node)
    }
}
