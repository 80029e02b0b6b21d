//! Preorder interval numbering.
//!
//! After [`Brackets::assign`] every reachable union node carries a sequence
//! number and the half-open range `[start, end)` of numbers used inside its
//! subtree, so "X lies inside Y" becomes `start(Y) <= seq(X) < end(Y)`.
//!
//! A source taxonomy borrows numbers from the union through
//! [`Brackets::infer`]: each source node that corresponds to a union node
//! takes that node's number, and source brackets span the numbers found in
//! the source subtree. [`witness`] and [`antiwitness`] then answer overlap
//! and containment questions across the two trees.

use super::{Node, Taxonomy, FOREST_INDEX};
use std::ops::Range;

const EMPTY: Range<u32> = u32::MAX..0;

/// Sequence numbers and subtree ranges for one taxonomy
#[derive(Debug, Clone)]
pub struct Brackets {
    seq: Vec<Option<u32>>,
    start: Vec<u32>,
    end: Vec<u32>,
}

impl Brackets {
    /// Number a taxonomy in preorder, forest first.
    pub fn assign(taxonomy: &Taxonomy) -> Self {
        let size = taxonomy.capacity();
        let mut brackets = Self::empty(size);
        let mut next = 0u32;

        // (node, entered)
        let mut stack = vec![(taxonomy.forest(), false)];
        while let Some((node, entered)) = stack.pop() {
            let i = node.index();
            if entered {
                brackets.end[i] = next;
                continue;
            }
            brackets.seq[i] = Some(next);
            brackets.start[i] = next;
            next += 1;
            stack.push((node, true));
            stack.extend(taxonomy.children(node).iter().rev().map(|&c| (c, false)));
        }
        brackets
    }

    /// Number a source taxonomy with the union numbers of its images.
    ///
    /// `image` gives the union node a source node corresponds to. Nodes
    /// without an image (or whose image is unnumbered) get no sequence
    /// number; their subtree range still covers numbered descendants.
    pub fn infer<F>(source: &Taxonomy, union: &Brackets, image: F) -> Self
    where
        F: Fn(Node) -> Option<Node>,
    {
        let mut brackets = Self::empty(source.capacity());

        for node in source.postorder(source.forest()) {
            let i = node.index();
            let seq = if i == FOREST_INDEX {
                None
            } else {
                image(node).and_then(|u| union.seq(u))
            };
            brackets.seq[i] = seq;

            let (mut lo, mut hi) = match seq {
                Some(s) => (s, s + 1),
                None => (EMPTY.start, EMPTY.end),
            };
            for child in source.children(node) {
                let c = child.index();
                if brackets.start[c] < brackets.end[c] {
                    lo = lo.min(brackets.start[c]);
                    hi = hi.max(brackets.end[c]);
                }
            }
            brackets.start[i] = lo;
            brackets.end[i] = hi;
        }
        brackets
    }

    fn empty(size: usize) -> Self {
        Self {
            seq: vec![None; size],
            start: vec![EMPTY.start; size],
            end: vec![EMPTY.end; size],
        }
    }

    /// Sequence number of `node`, if it has one
    pub fn seq(&self, node: Node) -> Option<u32> {
        self.seq.get(node.index()).copied().flatten()
    }

    /// Half-open range of numbers used inside the subtree of `node`
    pub fn range(&self, node: Node) -> Range<u32> {
        match (self.start.get(node.index()), self.end.get(node.index())) {
            (Some(&s), Some(&e)) if s < e => s..e,
            _ => EMPTY,
        }
    }

    /// Whether the subtree of `node` holds any numbered node
    pub fn is_numbered(&self, node: Node) -> bool {
        !self.range(node).is_empty()
    }

    /// Bracket containment: `inner` lies in the subtree of `outer`.
    ///
    /// Both must be numbered by the same call to [`Brackets::assign`].
    pub fn contains(&self, outer: Node, inner: Node) -> bool {
        match self.seq(inner) {
            Some(s) => self.range(outer).contains(&s),
            None => false,
        }
    }
}

/// A node in the subtree of source node `x` whose number falls inside the
/// union bracket of `y`, i.e. proof that `x` and `y` overlap.
pub fn witness(
    source: &Taxonomy,
    source_brackets: &Brackets,
    x: Node,
    union_brackets: &Brackets,
    y: Node,
) -> Option<Node> {
    let target = union_brackets.range(y);
    if target.is_empty() {
        return None;
    }
    let mut stack = vec![x];
    while let Some(node) = stack.pop() {
        let span = source_brackets.range(node);
        if span.end <= target.start || span.start >= target.end {
            continue;
        }
        if let Some(s) = source_brackets.seq(node) {
            if target.contains(&s) {
                return Some(node);
            }
        }
        stack.extend(source.children(node).iter().rev().copied());
    }
    None
}

/// A numbered node in the subtree of source node `x` whose number falls
/// outside the union bracket of `y`, i.e. proof that `x` is not contained
/// in `y`.
pub fn antiwitness(
    source: &Taxonomy,
    source_brackets: &Brackets,
    x: Node,
    union_brackets: &Brackets,
    y: Node,
) -> Option<Node> {
    let target = union_brackets.range(y);
    let mut stack = vec![x];
    while let Some(node) = stack.pop() {
        let span = source_brackets.range(node);
        if span.is_empty() {
            continue;
        }
        // subtree entirely inside the target
        if !target.is_empty() && span.start >= target.start && span.end <= target.end {
            continue;
        }
        if let Some(s) = source_brackets.seq(node) {
            if !target.contains(&s) {
                return Some(node);
            }
        }
        stack.extend(source.children(node).iter().rev().copied());
    }
    None
}
