//! Deciding what happens to each source node before the union is touched

use super::scope::{Scope, Subproblems};
use crate::alignment::Alignment;
use crate::taxonomy::{witness, Node, Taxonomy};

/// Fate of one source node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Matched during alignment
    Aligned(Node),
    /// The union already has this grouping; `elevated` when the node was
    /// moved up to a same-named ancestor of the cross-MRCA
    Reflected { target: Node, elevated: bool },
    /// A new union node is needed between the cross-MRCA (or its parent, when
    /// `lift`) and some of its children. The target is found again at graft
    /// time, since earlier resolutions may have inserted nodes above it.
    Resolution { lift: bool },
    /// Grouping contradicts the union at `child` of `target`
    Conflict { target: Node, child: Node },
    /// Every member image lay outside scope; nothing left to group
    Emptied,
    /// Copied as a fresh node
    New,
}

/// How the children of a would-be parent split with respect to `s`
enum Split {
    Consistent,
    Partial(Node),
}

pub fn place_all(
    source: &Taxonomy,
    union: &Taxonomy,
    alignment: &Alignment,
    sub: &Subproblems,
) -> Vec<Placement> {
    let mut placements = vec![Placement::New; source.capacity()];
    for s in source.walk() {
        placements[s.index()] = place(source, union, alignment, sub, s);
    }
    placements
}

fn place(
    source: &Taxonomy,
    union: &Taxonomy,
    alignment: &Alignment,
    sub: &Subproblems,
    s: Node,
) -> Placement {
    if let Some(image) = alignment.image(s) {
        return Placement::Aligned(image);
    }
    let Some(m) = sub.xmrca(s) else {
        if sub.has_aligned_below(s) {
            return Placement::Emptied;
        }
        return Placement::New;
    };
    let scope = sub.scope(s);

    if !union.is_forest(m) {
        if let Some(target) = elevation(source, union, sub, scope, s, m) {
            return Placement::Reflected {
                target,
                elevated: target != m,
            };
        }
        if sub.co(m) == Some(s) && scope.admits(union, m) {
            return Placement::Reflected {
                target: m,
                elevated: false,
            };
        }
    }

    let lift = !union.is_forest(m)
        && sub
            .co(m)
            .is_some_and(|c| source.descends_from(c, s));
    let target = if lift {
        union.parent_or_forest(m).unwrap_or_else(|| union.forest())
    } else {
        m
    };

    match split(source, union, alignment, sub, s, target) {
        Split::Consistent => Placement::Resolution { lift },
        Split::Partial(child) => Placement::Conflict { target, child },
    }
}

/// Nearest ancestor-or-self of `m` inside scope, holding nothing from
/// outside `s`, and sharing the name of `s`
fn elevation(
    source: &Taxonomy,
    union: &Taxonomy,
    sub: &Subproblems,
    scope: Scope,
    s: Node,
    m: Node,
) -> Option<Node> {
    let name = source[s].name()?;
    let mut a = m;
    while scope.admits(union, a) {
        let contained = sub.co(a).is_some_and(|c| source.within(c, s));
        if !contained {
            return None;
        }
        if union[a].name() == Some(name) {
            return Some(a);
        }
        a = union.parent_or_forest(a)?;
    }
    None
}

fn split(
    source: &Taxonomy,
    union: &Taxonomy,
    alignment: &Alignment,
    sub: &Subproblems,
    s: Node,
    target: Node,
) -> Split {
    for &child in union.children(target) {
        let included = sub.co(child).is_some_and(|c| source.within(c, s));
        if included {
            continue;
        }
        let touched = witness(
            source,
            alignment.source_brackets(),
            s,
            alignment.union_brackets(),
            child,
        )
        .is_some();
        if touched {
            return Split::Partial(child);
        }
    }
    Split::Consistent
}
