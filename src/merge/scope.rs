//! Scope and cross-MRCA: where in the union each unaligned source node may
//! land, and the union node its aligned members point at.

use crate::alignment::Correspondence;
use crate::report::{EventKind, ReportSink};
use crate::taxonomy::{Node, Taxonomy};
use taxomerge_core::StructureError;
use tracing::warn;

/// Region of the union a source node must be placed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Strictly below the image of the nearest aligned proper ancestor
    Within(Node),
    /// No aligned ancestor but aligned descendants: anywhere in the union
    Forest,
    /// Nothing aligned above or below: the node is grafted as a copy
    Detached,
}

impl Scope {
    /// Whether union node `u` lies strictly inside this scope
    pub fn admits(self, union: &Taxonomy, u: Node) -> bool {
        match self {
            Scope::Within(w) => union.descends_from(u, w),
            Scope::Forest => !union.is_forest(u),
            Scope::Detached => false,
        }
    }
}

/// Per-source-node results of the first two passes
#[derive(Debug)]
pub struct Subproblems {
    scope: Vec<Scope>,
    aligned_below: Vec<bool>,
    /// union node -> source MRCA of the witnesses in its subtree
    co: Vec<Option<Node>>,
    xmrca: Vec<Option<Node>>,
    /// union nodes whose MRCA gave the cross-MRCA, scope violations removed
    contributions: Vec<Vec<Node>>,
    pub ejected: usize,
}

impl Subproblems {
    /// Run scope assignment and cross-MRCA over `source`.
    pub fn compute(
        source: &Taxonomy,
        union: &Taxonomy,
        corr: &Correspondence,
        sink: &mut dyn ReportSink,
    ) -> Result<Self, StructureError> {
        let n = source.capacity();
        let mut sub = Subproblems {
            scope: vec![Scope::Detached; n],
            aligned_below: vec![false; n],
            co: vec![None; union.capacity()],
            xmrca: vec![None; n],
            contributions: vec![Vec::new(); n],
            ejected: 0,
        };

        for s in source.postorder(source.forest()) {
            if source.is_forest(s) {
                continue;
            }
            sub.aligned_below[s.index()] = source.children(s).iter().any(|&c| {
                corr.is_mapped(c) || sub.aligned_below[c.index()]
            });
        }

        // image of the nearest aligned proper ancestor
        let mut anchor: Vec<Option<Node>> = vec![None; n];
        for s in source.walk() {
            anchor[s.index()] = source
                .parent(s)
                .and_then(|p| corr.image(p).or(anchor[p.index()]));
            sub.scope[s.index()] = match anchor[s.index()] {
                Some(image) => Scope::Within(image),
                None if sub.aligned_below[s.index()] => Scope::Forest,
                None => Scope::Detached,
            };
        }

        for u in union.postorder(union.forest()) {
            let members = union
                .children(u)
                .iter()
                .filter_map(|&c| sub.co[c.index()])
                .chain(corr.coimage(u));
            sub.co[u.index()] = source.mrca_of(members)?;
        }

        for s in source.postorder(source.forest()) {
            if source.is_forest(s) || corr.is_mapped(s) || !sub.aligned_below[s.index()] {
                continue;
            }
            let scope = sub.scope[s.index()];
            let mut kept = Vec::new();
            for &c in source.children(s) {
                let Some(point) = corr.image(c).or(sub.xmrca[c.index()]) else {
                    continue;
                };
                if scope.admits(union, point) {
                    kept.push(point);
                } else {
                    let message = format!(
                        "{} of {} maps to {}, outside the scope of {}",
                        source.label(c),
                        source.tag(),
                        union.label(point),
                        source.label(s)
                    );
                    warn!("{}", message);
                    sink.event(EventKind::Ejection, message);
                    sink.count("ejected");
                    sub.ejected += 1;
                }
            }
            sub.xmrca[s.index()] = union.mrca_of(kept.iter().copied())?;
            sub.contributions[s.index()] = kept;
        }
        Ok(sub)
    }

    pub fn scope(&self, s: Node) -> Scope {
        self.scope[s.index()]
    }

    /// Whether some proper descendant of `s` is aligned
    pub fn has_aligned_below(&self, s: Node) -> bool {
        self.aligned_below[s.index()]
    }

    /// Source MRCA of the witnesses under union node `u`
    pub fn co(&self, u: Node) -> Option<Node> {
        self.co.get(u.index()).copied().flatten()
    }

    /// Union MRCA of the images of the members of `s`
    pub fn xmrca(&self, s: Node) -> Option<Node> {
        self.xmrca[s.index()]
    }

    pub fn contributions(&self, s: Node) -> &[Node] {
        &self.contributions[s.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Answer;
    use crate::report::Report;

    fn pair(corr: &mut Correspondence, source: &Taxonomy, union: &Taxonomy, name: &str) {
        let s = source.lookup_unique(name).unwrap();
        let u = union.lookup_unique(name).unwrap();
        corr.record(s, u, Answer::yes("test")).unwrap();
    }

    #[test]
    fn test_scope_and_xmrca() {
        let source = Taxonomy::from_nested("s", "((x,y,z)w)top").unwrap();
        let union = Taxonomy::from_nested("u", "((x,y)v,q)top").unwrap();
        let mut corr = Correspondence::new(&source, &union);
        for name in ["x", "y", "top"] {
            pair(&mut corr, &source, &union, name);
        }
        let mut report = Report::new("t");
        let sub = Subproblems::compute(&source, &union, &corr, &mut report).unwrap();

        let w = source.lookup_unique("w").unwrap();
        let top = union.lookup_unique("top").unwrap();
        let v = union.lookup_unique("v").unwrap();
        assert_eq!(sub.scope(w), Scope::Within(top));
        assert!(sub.has_aligned_below(w));
        assert_eq!(sub.xmrca(w), Some(v));
        assert_eq!(sub.co(v), Some(w));
        assert_eq!(sub.ejected, 0);
    }

    #[test]
    fn test_image_outside_scope_is_ejected() {
        // x sits under p in the source but under q in the union
        let source = Taxonomy::from_nested("s", "(((x)w)p,q)top").unwrap();
        let union = Taxonomy::from_nested("u", "(p,(x)q)top").unwrap();
        let mut corr = Correspondence::new(&source, &union);
        for name in ["x", "p", "q", "top"] {
            pair(&mut corr, &source, &union, name);
        }
        let mut report = Report::new("t");
        let sub = Subproblems::compute(&source, &union, &corr, &mut report).unwrap();

        let w = source.lookup_unique("w").unwrap();
        assert_eq!(sub.xmrca(w), None);
        assert_eq!(sub.ejected, 1);
        assert_eq!(report.get("ejected"), 1);
        assert_eq!(report.events_of(EventKind::Ejection).count(), 1);
    }
}
