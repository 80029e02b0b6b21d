//! Most recent common ancestor and containment within one taxonomy

use super::{Node, Taxonomy, FOREST_INDEX};
use taxomerge_core::StructureError;

impl Taxonomy {
    /// Most recent common ancestor of `a` and `b`.
    ///
    /// Returns the forest pseudo-node when the two lie in different trees;
    /// test for that with [`Taxonomy::no_mrca`]. Handles from another
    /// taxonomy are refused.
    pub fn mrca(&self, a: Node, b: Node) -> Result<Node, StructureError> {
        let mut a = self.check(a)?;
        let mut b = self.check(b)?;
        if a == b {
            return Ok(self.node(a));
        }

        let mut da = self.depth(self.node(a));
        let mut db = self.depth(self.node(b));
        while da > db {
            a = self.up(a);
            da -= 1;
        }
        while db > da {
            b = self.up(b);
            db -= 1;
        }
        while a != b {
            a = self.up(a);
            b = self.up(b);
        }
        Ok(self.node(a))
    }

    /// MRCA folded over any number of nodes; `None` for an empty input
    pub fn mrca_of<I>(&self, nodes: I) -> Result<Option<Node>, StructureError>
    where
        I: IntoIterator<Item = Node>,
    {
        let mut acc: Option<Node> = None;
        for node in nodes {
            acc = Some(match acc {
                None => {
                    self.check(node)?;
                    node
                }
                Some(m) => self.mrca(m, node)?,
            });
        }
        Ok(acc)
    }

    /// True iff `b` is a strict ancestor of `a`
    pub fn descends_from(&self, a: Node, b: Node) -> bool {
        if !self.owns(a) || !self.owns(b) || a == b {
            return false;
        }
        if b.index() == FOREST_INDEX {
            return self[a].parent.is_some();
        }
        let target = self.depth(b);
        let mut current = a.index();
        let mut depth = self.depth(a);
        while depth > target {
            current = self.up(current);
            depth -= 1;
        }
        current == b.index()
    }

    /// `a` is `b` or one of its descendants
    pub fn within(&self, a: Node, b: Node) -> bool {
        a == b || self.descends_from(a, b)
    }

    /// The two children of the MRCA leading to `a` and to `b`.
    ///
    /// `None` when either contains the other. Sibling roots diverge at the
    /// forest and are returned as such.
    pub fn divergence(&self, a: Node, b: Node) -> Result<Option<(Node, Node)>, StructureError> {
        let mut a = self.check(a)?;
        let mut b = self.check(b)?;

        let mut da = self.depth(self.node(a));
        let mut db = self.depth(self.node(b));
        while da > db {
            a = self.up(a);
            da -= 1;
        }
        while db > da {
            b = self.up(b);
            db -= 1;
        }
        if a == b {
            return Ok(None);
        }
        loop {
            let pa = self.up(a);
            let pb = self.up(b);
            if pa == pb {
                return Ok(Some((self.node(a), self.node(b))));
            }
            a = pa;
            b = pb;
        }
    }

    /// Parent arena index; detached nodes and the forest step to the forest
    fn up(&self, index: usize) -> usize {
        self.taxa[index]
            .parent
            .map(|p| p as usize)
            .unwrap_or(FOREST_INDEX)
    }
}

#[cfg(test)]
mod tests {
    use crate::taxonomy::Taxonomy;
    use proptest::prelude::*;
    use taxomerge_core::StructureError;

    fn fixture() -> Taxonomy {
        Taxonomy::from_nested("t", "((a,b)ab,(c,(d,e)de)cde)top").unwrap()
    }

    #[test]
    fn test_mrca_basics() {
        let tax = fixture();
        let n = |s: &str| tax.lookup_unique(s).unwrap();

        assert_eq!(tax.mrca(n("a"), n("b")).unwrap(), n("ab"));
        assert_eq!(tax.mrca(n("d"), n("c")).unwrap(), n("cde"));
        assert_eq!(tax.mrca(n("a"), n("e")).unwrap(), n("top"));
        assert_eq!(tax.mrca(n("de"), n("e")).unwrap(), n("de"));
        assert_eq!(tax.mrca(n("a"), n("a")).unwrap(), n("a"));
    }

    #[test]
    fn test_mrca_across_roots_is_forest() {
        let tax = Taxonomy::from_nested("t", "(a,b)x;(c)y").unwrap();
        let a = tax.lookup_unique("a").unwrap();
        let c = tax.lookup_unique("c").unwrap();
        let m = tax.mrca(a, c).unwrap();
        assert!(tax.no_mrca(m));
    }

    #[test]
    fn test_mrca_foreign_is_error() {
        let tax = fixture();
        let other = fixture();
        let a = tax.lookup_unique("a").unwrap();
        let b = other.lookup_unique("b").unwrap();
        assert!(matches!(
            tax.mrca(a, b),
            Err(StructureError::ForeignNode { .. })
        ));
    }

    #[test]
    fn test_descends_from_and_within() {
        let tax = fixture();
        let n = |s: &str| tax.lookup_unique(s).unwrap();

        assert!(tax.descends_from(n("d"), n("cde")));
        assert!(tax.descends_from(n("d"), n("top")));
        assert!(!tax.descends_from(n("d"), n("d")));
        assert!(tax.within(n("d"), n("d")));
        assert!(!tax.descends_from(n("cde"), n("d")));
        assert!(!tax.descends_from(n("a"), n("cde")));
        assert!(tax.descends_from(n("a"), tax.forest()));
    }

    #[test]
    fn test_divergence() {
        let tax = fixture();
        let n = |s: &str| tax.lookup_unique(s).unwrap();

        assert_eq!(
            tax.divergence(n("a"), n("e")).unwrap(),
            Some((n("ab"), n("cde")))
        );
        assert_eq!(
            tax.divergence(n("c"), n("d")).unwrap(),
            Some((n("c"), n("de")))
        );
        assert_eq!(tax.divergence(n("cde"), n("d")).unwrap(), None);
    }

    #[test]
    fn test_mrca_of_many() {
        let tax = fixture();
        let n = |s: &str| tax.lookup_unique(s).unwrap();
        assert_eq!(tax.mrca_of([n("d"), n("e"), n("c")]).unwrap(), Some(n("cde")));
        assert_eq!(tax.mrca_of(std::iter::empty()).unwrap(), None);
    }

    /// Builds a random tree: node i > 0 hangs under some earlier node.
    fn random_tree(parents: &[usize]) -> Taxonomy {
        let mut tax = Taxonomy::new("p");
        let mut nodes = Vec::new();
        let root = tax
            .new_taxon(Some("n0"), Default::default(), None)
            .unwrap();
        tax.add_root(root).unwrap();
        nodes.push(root);
        for (i, &p) in parents.iter().enumerate() {
            let name = format!("n{}", i + 1);
            let node = tax.new_taxon(Some(&name), Default::default(), None).unwrap();
            tax.attach(node, nodes[p % nodes.len()]).unwrap();
            nodes.push(node);
        }
        tax
    }

    proptest! {
        #[test]
        fn prop_mrca_symmetric_idempotent_ancestor(
            parents in prop::collection::vec(0usize..1000, 1..60),
            i in 0usize..1000,
            j in 0usize..1000,
        ) {
            let tax = random_tree(&parents);
            let nodes: Vec<_> = tax.walk().collect();
            let a = nodes[i % nodes.len()];
            let b = nodes[j % nodes.len()];

            let m = tax.mrca(a, b).unwrap();
            prop_assert_eq!(m, tax.mrca(b, a).unwrap());
            prop_assert_eq!(tax.mrca(a, a).unwrap(), a);
            prop_assert!(tax.within(a, m));
            prop_assert!(tax.within(b, m));
            for child in tax.children(m) {
                prop_assert!(!(tax.within(a, *child) && tax.within(b, *child)));
            }
        }
    }
}
