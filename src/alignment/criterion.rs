//! The ordered rule set judging (source node, union candidate) pairs

use crate::alignment::division::{unrelated, Divisions};
use crate::alignment::Answer;
use crate::taxonomy::{antiwitness, witness, Brackets, Node, Taxonomy};

/// Everything a criterion may consult. Criteria never mutate it.
pub struct Context<'a> {
    pub source: &'a Taxonomy,
    pub union: &'a Taxonomy,
    /// Source brackets inferred from the matches made so far
    pub source_brackets: Option<&'a Brackets>,
    pub union_brackets: &'a Brackets,
    pub divisions: Option<DivisionContext<'a>>,
}

pub struct DivisionContext<'a> {
    pub skeleton: &'a Taxonomy,
    pub source: &'a Divisions,
    pub union: &'a Divisions,
}

/// Criteria in evaluation order. The order is part of the behaviour:
/// changing it changes outcomes for ambiguous names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Division,
    Lineage,
    Subsumption,
    SameSourceId,
    AnySourceId,
    ByRank,
    ByPrimaryName,
    /// Handled by the matrix: needs the whole row and column
    Elimination,
}

impl Criterion {
    pub const ORDER: [Criterion; 8] = [
        Criterion::Division,
        Criterion::Lineage,
        Criterion::Subsumption,
        Criterion::SameSourceId,
        Criterion::AnySourceId,
        Criterion::ByRank,
        Criterion::ByPrimaryName,
        Criterion::Elimination,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Criterion::Division => "division",
            Criterion::Lineage => "lineage",
            Criterion::Subsumption => "subsumption",
            Criterion::SameSourceId => "same-source-id",
            Criterion::AnySourceId => "any-source-id",
            Criterion::ByRank => "by-rank",
            Criterion::ByPrimaryName => "by-primary-name",
            Criterion::Elimination => "elimination",
        }
    }

    /// Judge one pair
    pub fn assess(self, ctx: &Context<'_>, s: Node, u: Node) -> Answer {
        match self {
            Criterion::Division => division(ctx, s, u),
            Criterion::Lineage => lineage(ctx, s, u),
            Criterion::Subsumption => subsumption(ctx, s, u),
            Criterion::SameSourceId => same_source_id(ctx, s, u),
            Criterion::AnySourceId => any_source_id(ctx, s, u),
            Criterion::ByRank => by_rank(ctx, s, u),
            Criterion::ByPrimaryName => by_primary_name(ctx, s, u),
            Criterion::Elimination => Answer::no_info(),
        }
    }
}

fn division(ctx: &Context<'_>, s: Node, u: Node) -> Answer {
    let Some(div) = &ctx.divisions else {
        return Answer::no_info();
    };
    match (div.source.get(s), div.union.get(u)) {
        (Some(a), Some(b)) if unrelated(div.skeleton, a, b) => {
            Answer::heck_no("different-division").with_witness(format!(
                "{} vs {}",
                div.skeleton.name_of(a),
                div.skeleton.name_of(b)
            ))
        }
        _ => Answer::no_info(),
    }
}

/// Nearest proper ancestor of `node` whose name is known in `other`,
/// skipping ancestors that merely repeat the node's own name. Also returns
/// how many such repeats were skipped, which tells nested homonyms apart.
fn nearest_known<'a>(
    taxonomy: &'a Taxonomy,
    other: &Taxonomy,
    node: Node,
) -> Option<(&'a str, usize)> {
    let own = taxonomy[node].name();
    let mut repeats = 0;
    for a in taxonomy.ancestors(node) {
        let Some(name) = taxonomy[a].name() else {
            continue;
        };
        if Some(name) == own {
            repeats += 1;
        } else if !other.lookup(name).is_empty() {
            return Some((name, repeats));
        }
    }
    None
}

fn lineage(ctx: &Context<'_>, s: Node, u: Node) -> Answer {
    let ps = nearest_known(ctx.source, ctx.union, s);
    let pu = nearest_known(ctx.union, ctx.source, u);
    let (Some((ps, source_depth)), Some((pu, union_depth))) = (ps, pu) else {
        return Answer::no_info();
    };

    if ps == pu {
        if source_depth == union_depth {
            return Answer::heck_yes("same-parent/direct").with_witness(ps);
        }
        // same parent, but nested at a different depth below it
        return Answer::weak_yes("same-parent/nested").with_witness(ps);
    }
    let in_union_lineage = ctx
        .union
        .ancestors(u)
        .any(|a| ctx.union[a].name() == Some(ps));
    let in_source_lineage = ctx
        .source
        .ancestors(s)
        .any(|a| ctx.source[a].name() == Some(pu));
    if in_union_lineage {
        Answer::yes("same-parent/extended").with_witness(ps)
    } else if in_source_lineage {
        Answer::yes("same-parent/extended").with_witness(pu)
    } else {
        Answer::no_info()
    }
}

fn subsumption(ctx: &Context<'_>, s: Node, u: Node) -> Answer {
    let Some(sb) = ctx.source_brackets else {
        return Answer::no_info();
    };
    let Some(inside) = witness(ctx.source, sb, s, ctx.union_brackets, u) else {
        return Answer::no_info();
    };
    match antiwitness(ctx.source, sb, s, ctx.union_brackets, u) {
        None => Answer::yes("is-subsumed-by").with_witness(ctx.source.label(inside)),
        Some(outside) => Answer::weak_yes("overlaps").with_witness(format!(
            "{} in, {} out",
            ctx.source.label(inside),
            ctx.source.label(outside)
        )),
    }
}

fn same_source_id(ctx: &Context<'_>, s: Node, u: Node) -> Answer {
    let source_refs = ctx.source.references(s);
    let union_refs = ctx.union.references(u);
    match (source_refs.first(), union_refs.first()) {
        (Some(a), Some(b)) if a == b => Answer::heck_yes("same-source-id").with_witness(a.to_string()),
        _ => Answer::no_info(),
    }
}

fn any_source_id(ctx: &Context<'_>, s: Node, u: Node) -> Answer {
    let union_refs = ctx.union.references(u);
    match ctx
        .source
        .references(s)
        .into_iter()
        .find(|q| union_refs.contains(q))
    {
        Some(shared) => Answer::yes("any-source-id").with_witness(shared.to_string()),
        None => Answer::no_info(),
    }
}

fn by_rank(ctx: &Context<'_>, s: Node, u: Node) -> Answer {
    let rank = ctx.source[s].rank();
    if rank.is_ranked() && rank == ctx.union[u].rank() {
        Answer::weak_yes("same-rank")
    } else {
        Answer::no_info()
    }
}

fn by_primary_name(ctx: &Context<'_>, s: Node, u: Node) -> Answer {
    match (ctx.source[s].name(), ctx.union[u].name()) {
        (Some(a), Some(b)) if a == b => Answer::yes("same-primary-name"),
        _ => Answer::no_info(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Grade;
    use taxomerge_core::{QualifiedId, Rank};

    struct Fixture {
        source: Taxonomy,
        union: Taxonomy,
        ub: Brackets,
    }

    impl Fixture {
        fn new(source: &str, union: &str) -> Self {
            let source = Taxonomy::from_nested("s", source).unwrap();
            let union = Taxonomy::from_nested("u", union).unwrap();
            let ub = Brackets::assign(&union);
            Self { source, union, ub }
        }

        fn ctx(&self) -> Context<'_> {
            Context {
                source: &self.source,
                union: &self.union,
                source_brackets: None,
                union_brackets: &self.ub,
                divisions: None,
            }
        }

        fn s(&self, name: &str) -> Node {
            self.source.lookup_unique(name).unwrap()
        }

        fn u(&self, name: &str) -> Node {
            self.union.lookup_unique(name).unwrap()
        }
    }

    #[test]
    fn test_lineage() {
        let f = Fixture::new("((x)Genus,(y)Other,Sub)Family", "((x)Genus,((y)Sub)Other)Family");
        let ctx = f.ctx();

        let direct = Criterion::Lineage.assess(&ctx, f.s("x"), f.u("x"));
        assert_eq!(direct.grade, Grade::HeckYes);
        assert_eq!(direct.witness.as_deref(), Some("Genus"));

        let extended = Criterion::Lineage.assess(&ctx, f.s("y"), f.u("y"));
        assert_eq!(extended.grade, Grade::Yes);
        assert_eq!(extended.reason, "same-parent/extended");
    }

    #[test]
    fn test_lineage_separates_nested_homonyms() {
        let f = Fixture::new("((x)x)xx", "((x)x)xx");
        let ctx = f.ctx();
        let outer = |t: &Taxonomy| t.lookup("x").iter().copied().find(|&n| !t.is_tip(n)).unwrap();
        let inner = |t: &Taxonomy| t.lookup("x").iter().copied().find(|&n| t.is_tip(n)).unwrap();
        let (so, si) = (outer(&f.source), inner(&f.source));
        let (uo, ui) = (outer(&f.union), inner(&f.union));

        assert_eq!(Criterion::Lineage.assess(&ctx, so, uo).grade, Grade::HeckYes);
        assert_eq!(Criterion::Lineage.assess(&ctx, si, ui).grade, Grade::HeckYes);
        let crossed = Criterion::Lineage.assess(&ctx, so, ui);
        assert_eq!(crossed.grade, Grade::WeakYes);
        assert_eq!(crossed.reason, "same-parent/nested");
        assert_eq!(Criterion::Lineage.assess(&ctx, si, uo).grade, Grade::WeakYes);
    }

    #[test]
    fn test_subsumption() {
        let f = Fixture::new("((a,b)ab,(c,d)cd)top", "(a,(b,(c,d)cd)bcd)top");
        let sb = Brackets::infer(&f.source, &f.ub, |n| {
            if f.source.is_tip(n) {
                f.union.lookup_unique(f.source.name_of(n))
            } else {
                None
            }
        });
        let mut ctx = f.ctx();
        ctx.source_brackets = Some(&sb);

        assert_eq!(
            Criterion::Subsumption.assess(&ctx, f.s("cd"), f.u("cd")).reason,
            "is-subsumed-by"
        );
        assert_eq!(
            Criterion::Subsumption.assess(&ctx, f.s("ab"), f.u("bcd")).grade,
            Grade::WeakYes
        );
        assert_eq!(
            Criterion::Subsumption.assess(&ctx, f.s("cd"), f.u("a")).grade,
            Grade::NoInfo
        );
    }

    #[test]
    fn test_source_ids() {
        let mut f = Fixture::new("(x)top", "(x)top");
        let sx = f.s("x");
        let ux = f.u("x");
        f.source.add_source_ref(sx, QualifiedId::new("ncbi", "1")).unwrap();
        f.source.add_source_ref(sx, QualifiedId::new("gbif", "2")).unwrap();
        f.union.add_source_ref(ux, QualifiedId::new("gbif", "2")).unwrap();
        let ctx = f.ctx();

        assert_eq!(Criterion::SameSourceId.assess(&ctx, sx, ux).grade, Grade::NoInfo);
        assert_eq!(Criterion::AnySourceId.assess(&ctx, sx, ux).grade, Grade::Yes);
    }

    #[test]
    fn test_rank_and_name() {
        let mut f = Fixture::new("(x)top", "(x)top");
        let sx = f.s("x");
        let ux = f.u("x");
        assert_eq!(Criterion::ByRank.assess(&f.ctx(), sx, ux).grade, Grade::NoInfo);

        f.source.set_rank(sx, Rank::Genus).unwrap();
        f.union.set_rank(ux, Rank::Genus).unwrap();
        assert_eq!(Criterion::ByRank.assess(&f.ctx(), sx, ux).grade, Grade::WeakYes);
        assert_eq!(Criterion::ByPrimaryName.assess(&f.ctx(), sx, ux).grade, Grade::Yes);
    }

    #[test]
    fn test_division_vetoes_unrelated() {
        let skeleton = Taxonomy::from_nested("k", "(Metazoa,Plantae)life").unwrap();
        let f = Fixture::new("((Aotus)Metazoa)life", "((Aotus)Plantae)life");
        let sd = Divisions::compute(&skeleton, &f.source);
        let ud = Divisions::compute(&skeleton, &f.union);
        let mut ctx = f.ctx();
        ctx.divisions = Some(DivisionContext {
            skeleton: &skeleton,
            source: &sd,
            union: &ud,
        });

        let answer = Criterion::Division.assess(&ctx, f.s("Aotus"), f.u("Aotus"));
        assert_eq!(answer.grade, Grade::HeckNo);
        assert_eq!(answer.witness.as_deref(), Some("Metazoa vs Plantae"));
        assert_eq!(
            Criterion::Division.assess(&ctx, f.s("life"), f.u("life")).grade,
            Grade::NoInfo
        );
    }
}
