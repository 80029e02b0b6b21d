//! Per-name disambiguation of homonym groups.
//!
//! A [`Matrix`] holds the source taxa (rows) and union taxa (columns)
//! sharing one name. Criteria run in order over every open cell; a cell
//! judged `No` or worse is rejected for good. After each criterion every
//! pair that is a mutual unique best is finalized, closing its row and its
//! column. Rows still open at the end get a postmortem explanation.

use crate::alignment::criterion::{Context, Criterion};
use crate::alignment::{Answer, Correspondence, Grade};
use crate::report::{EventKind, ReportSink};
use crate::taxonomy::Node;
use taxomerge_core::StructureError;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Open,
    Rejected(Answer),
}

/// Result of one matrix run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixOutcome {
    pub matched: usize,
    pub lost_race: usize,
    pub unmatched: usize,
}

pub struct Matrix<'n> {
    name: &'n str,
    rows: Vec<Node>,
    cols: Vec<Node>,
    cells: Vec<Cell>,
    row_closed: Vec<bool>,
    col_closed: Vec<bool>,
}

impl<'n> Matrix<'n> {
    pub fn new(name: &'n str, rows: Vec<Node>, cols: Vec<Node>) -> Self {
        let size = rows.len() * cols.len();
        Self {
            name,
            row_closed: vec![false; rows.len()],
            col_closed: vec![false; cols.len()],
            cells: vec![Cell::Open; size],
            rows,
            cols,
        }
    }

    fn at(&self, r: usize, c: usize) -> usize {
        r * self.cols.len() + c
    }

    fn is_open(&self, r: usize, c: usize) -> bool {
        !self.row_closed[r] && !self.col_closed[c] && self.cells[self.at(r, c)] == Cell::Open
    }

    /// Run `criteria` in order, recording matches in `corr`
    pub fn run(
        &mut self,
        ctx: &Context<'_>,
        criteria: &[Criterion],
        corr: &mut Correspondence,
        sink: &mut dyn ReportSink,
    ) -> Result<MatrixOutcome, StructureError> {
        let mut outcome = MatrixOutcome::default();

        for &criterion in criteria {
            if self.row_closed.iter().all(|&c| c) || self.col_closed.iter().all(|&c| c) {
                break;
            }
            if criterion == Criterion::Elimination {
                self.eliminate(ctx, corr, sink, &mut outcome)?;
                continue;
            }

            let mut current: Vec<Option<Answer>> = vec![None; self.cells.len()];
            for r in 0..self.rows.len() {
                for c in 0..self.cols.len() {
                    if !self.is_open(r, c) {
                        continue;
                    }
                    let answer = criterion.assess(ctx, self.rows[r], self.cols[c]);
                    let k = self.at(r, c);
                    if answer.is_rejection() {
                        debug!(
                            name = self.name,
                            criterion = criterion.name(),
                            source = %ctx.source.label(self.rows[r]),
                            candidate = %ctx.union.label(self.cols[c]),
                            "rejected: {}",
                            answer
                        );
                        self.cells[k] = Cell::Rejected(answer);
                    } else if answer.is_positive() {
                        current[k] = Some(answer);
                    }
                }
            }

            // pick mutual bests on a snapshot; they form a matching
            let pairs: Vec<(usize, usize)> = (0..self.rows.len())
                .filter(|&r| !self.row_closed[r])
                .filter_map(|r| {
                    let c = self.unique_best_in_row(r, &current)?;
                    (self.unique_best_in_col(c, &current) == Some(r)).then_some((r, c))
                })
                .collect();
            for (r, c) in pairs {
                if let Some(answer) = current[self.at(r, c)].take() {
                    self.finalize(r, c, answer, ctx, corr, sink, &mut outcome)?;
                }
            }
        }

        self.postmortem(ctx, corr, sink, &mut outcome);
        Ok(outcome)
    }

    fn unique_best_in_row(&self, r: usize, current: &[Option<Answer>]) -> Option<usize> {
        unique_max((0..self.cols.len()).filter_map(|c| {
            if !self.is_open(r, c) {
                return None;
            }
            current[self.at(r, c)].as_ref().map(|a| (c, a.grade))
        }))
    }

    fn unique_best_in_col(&self, c: usize, current: &[Option<Answer>]) -> Option<usize> {
        unique_max((0..self.rows.len()).filter_map(|r| {
            if !self.is_open(r, c) {
                return None;
            }
            current[self.at(r, c)].as_ref().map(|a| (r, a.grade))
        }))
    }

    /// A row with one open column that has no other open row
    fn eliminate(
        &mut self,
        ctx: &Context<'_>,
        corr: &mut Correspondence,
        sink: &mut dyn ReportSink,
        outcome: &mut MatrixOutcome,
    ) -> Result<(), StructureError> {
        for r in 0..self.rows.len() {
            if self.row_closed[r] {
                continue;
            }
            let mut open_cols = (0..self.cols.len()).filter(|&c| self.is_open(r, c));
            let (Some(c), None) = (open_cols.next(), open_cols.next()) else {
                continue;
            };
            let mut open_rows = (0..self.rows.len()).filter(|&r2| self.is_open(r2, c));
            if let (Some(only), None) = (open_rows.next(), open_rows.next()) {
                if only == r {
                    self.finalize(r, c, Answer::weak_yes("elimination"), ctx, corr, sink, outcome)?;
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn finalize(
        &mut self,
        r: usize,
        c: usize,
        answer: Answer,
        ctx: &Context<'_>,
        corr: &mut Correspondence,
        sink: &mut dyn ReportSink,
        outcome: &mut MatrixOutcome,
    ) -> Result<(), StructureError> {
        self.row_closed[r] = true;
        self.col_closed[c] = true;
        let (s, u) = (self.rows[r], self.cols[c]);

        if let Some(previous) = corr.coimage(u).filter(|&p| p != s) {
            let previous_grade = corr.answer(previous).map(|a| a.grade);
            if previous_grade >= Some(answer.grade) {
                debug!(
                    name = self.name,
                    source = %ctx.source.label(s),
                    candidate = %ctx.union.label(u),
                    winner = %ctx.source.label(previous),
                    "lost race"
                );
                corr.explain(
                    s,
                    Answer::new(Grade::NoInfo, "lost-race").with_witness(ctx.source.label(previous)),
                );
                sink.count("lost-race");
                outcome.lost_race += 1;
                return Ok(());
            }
            // the newcomer is the better witness; the previous node stays lumped
            corr.record(s, u, answer.clone())?;
            corr.take_witness(s);
            sink.count("lumped");
        } else {
            corr.record(s, u, answer.clone())?;
        }

        debug!(
            name = self.name,
            source = %ctx.source.label(s),
            target = %ctx.union.label(u),
            "matched: {}",
            answer
        );
        sink.count(answer.reason);
        outcome.matched += 1;
        Ok(())
    }

    fn postmortem(
        &self,
        ctx: &Context<'_>,
        corr: &mut Correspondence,
        sink: &mut dyn ReportSink,
        outcome: &mut MatrixOutcome,
    ) {
        for r in 0..self.rows.len() {
            if self.row_closed[r] {
                continue;
            }
            outcome.unmatched += 1;
            let s = self.rows[r];

            let viable: Vec<usize> = (0..self.cols.len())
                .filter(|&c| self.cells[self.at(r, c)] == Cell::Open)
                .collect();
            let explanation = match viable.as_slice() {
                [] => {
                    // strongest rejection; the first one wins ties
                    let strongest = (0..self.cols.len())
                        .filter_map(|c| match &self.cells[self.at(r, c)] {
                            Cell::Rejected(a) => Some(a),
                            Cell::Open => None,
                        })
                        .fold(None::<&Answer>, |best, a| match best {
                            Some(b) if b.grade <= a.grade => Some(b),
                            _ => Some(a),
                        });
                    sink.count("blocked");
                    strongest.cloned().unwrap_or_else(|| Answer::new(Grade::NoInfo, "blocked"))
                }
                [c] => {
                    sink.count("contentious");
                    Answer::new(Grade::NoInfo, "contentious")
                        .with_witness(ctx.union.label(self.cols[*c]))
                }
                many => {
                    sink.count("ambiguous");
                    sink.event(
                        EventKind::Ambiguity,
                        format!(
                            "{} ({}) has {} viable candidates",
                            self.name,
                            ctx.source.label(s),
                            many.len()
                        ),
                    );
                    Answer::new(Grade::NoInfo, "ambiguous")
                        .with_witness(format!("{} candidates", many.len()))
                }
            };
            debug!(
                name = self.name,
                source = %ctx.source.label(s),
                "unmatched: {}",
                explanation
            );
            corr.explain(s, explanation);
        }
    }
}

/// Index of the unique maximum grade, `None` if empty or tied
fn unique_max(items: impl Iterator<Item = (usize, Grade)>) -> Option<usize> {
    let mut best: Option<(usize, Grade)> = None;
    let mut tied = false;
    for (i, grade) in items {
        match best {
            Some((_, g)) if grade < g => {}
            Some((_, g)) if grade == g => tied = true,
            _ => {
                best = Some((i, grade));
                tied = false;
            }
        }
    }
    if tied {
        None
    } else {
        best.map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Report;
    use crate::taxonomy::{Brackets, Taxonomy};

    fn run(source: &Taxonomy, union: &Taxonomy, name: &str, criteria: &[Criterion]) -> (Correspondence, Report, MatrixOutcome) {
        let ub = Brackets::assign(union);
        let ctx = Context {
            source,
            union,
            source_brackets: None,
            union_brackets: &ub,
            divisions: None,
        };
        let mut corr = Correspondence::new(source, union);
        let mut report = Report::new("matrix");
        let rows = source.lookup(name).to_vec();
        let cols = union.lookup(name).to_vec();
        let mut matrix = Matrix::new(name, rows, cols);
        let outcome = matrix.run(&ctx, criteria, &mut corr, &mut report).unwrap();
        (corr, report, outcome)
    }

    #[test]
    fn test_unique_max() {
        assert_eq!(unique_max([(0, Grade::Yes), (1, Grade::WeakYes)].into_iter()), Some(0));
        assert_eq!(unique_max([(0, Grade::Yes), (1, Grade::Yes)].into_iter()), None);
        assert_eq!(
            unique_max([(0, Grade::Yes), (1, Grade::Yes), (2, Grade::HeckYes)].into_iter()),
            Some(2)
        );
        assert_eq!(unique_max(std::iter::empty()), None);
    }

    #[test]
    fn test_homonyms_resolved_by_lineage() {
        let source = Taxonomy::from_nested("s", "((Aotus)Primates,(Aotus)Fabales)life").unwrap();
        let union = Taxonomy::from_nested("u", "((Aotus)Fabales,(Aotus)Primates)life").unwrap();
        let (corr, report, outcome) = run(&source, &union, "Aotus", &Criterion::ORDER);

        assert_eq!(outcome.matched, 2);
        for s in source.lookup_primary("Aotus") {
            let u = corr.image(s).unwrap();
            assert_eq!(
                source.name_of(source.parent(s).unwrap()),
                union.name_of(union.parent(u).unwrap())
            );
        }
        assert_eq!(report.get("same-parent/direct"), 2);
    }

    #[test]
    fn test_ambiguous_homonyms_stay_unmatched() {
        let source = Taxonomy::from_nested("s", "((x)p,(x)q)top").unwrap();
        let union = Taxonomy::from_nested("u", "((x)m,(x)n)top").unwrap();
        let (corr, report, outcome) = run(&source, &union, "x", &Criterion::ORDER);

        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.unmatched, 2);
        assert_eq!(report.get("ambiguous"), 2);
        let s = source.lookup("x")[0];
        assert_eq!(corr.answer(s).unwrap().reason, "ambiguous");
    }

    #[test]
    fn test_elimination_takes_last_candidate() {
        let source = Taxonomy::from_nested("s", "(x)top").unwrap();
        let union = Taxonomy::from_nested("u", "(x)other").unwrap();
        let (corr, report, _) = run(
            &source,
            &union,
            "x",
            &[Criterion::Lineage, Criterion::Elimination],
        );

        let s = source.lookup_unique("x").unwrap();
        assert_eq!(corr.image(s), union.lookup_unique("x"));
        assert_eq!(report.get("elimination"), 1);
    }

    #[test]
    fn test_contentious_without_elimination() {
        let source = Taxonomy::from_nested("s", "(x)top").unwrap();
        let union = Taxonomy::from_nested("u", "(x)other").unwrap();
        let (corr, report, _) = run(&source, &union, "x", &[Criterion::Lineage]);

        let s = source.lookup_unique("x").unwrap();
        assert!(corr.image(s).is_none());
        assert_eq!(corr.answer(s).unwrap().reason, "contentious");
        assert_eq!(report.get("contentious"), 1);
    }

    #[test]
    fn test_lost_race_leaves_row_unmatched() {
        let source = Taxonomy::from_nested("s", "(a,b)top").unwrap();
        let union = Taxonomy::from_nested("u", "(a)top").unwrap();
        let ub = Brackets::assign(&union);
        let ctx = Context {
            source: &source,
            union: &union,
            source_brackets: None,
            union_brackets: &ub,
            divisions: None,
        };
        let mut corr = Correspondence::new(&source, &union);
        let mut report = Report::new("matrix");
        let sa = source.lookup_unique("a").unwrap();
        let sb = source.lookup_unique("b").unwrap();
        let ua = union.lookup_unique("a").unwrap();
        corr.record(sa, ua, Answer::heck_yes("same-source-id")).unwrap();

        let mut matrix = Matrix::new("b", vec![sb], vec![ua]);
        let outcome = matrix
            .run(&ctx, &[Criterion::ByPrimaryName, Criterion::Elimination], &mut corr, &mut report)
            .unwrap();

        assert_eq!(outcome.lost_race, 1);
        assert!(corr.image(sb).is_none());
        assert_eq!(corr.answer(sb).unwrap().reason, "lost-race");
        assert_eq!(corr.coimage(ua), Some(sa));
    }
}
