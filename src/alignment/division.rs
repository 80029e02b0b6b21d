//! Divisions: pinned high-level clades used to veto unrelated matches

use crate::taxonomy::{Node, Taxonomy};

/// For every node of one taxonomy, the skeleton node of its division:
/// the nearest ancestor-or-self whose name is a skeleton name.
#[derive(Debug, Clone)]
pub struct Divisions {
    of: Vec<Option<Node>>,
}

impl Divisions {
    pub fn compute(skeleton: &Taxonomy, taxonomy: &Taxonomy) -> Self {
        let mut of = vec![None; taxonomy.capacity()];
        for node in taxonomy.walk() {
            let own = taxonomy[node]
                .name()
                .and_then(|name| skeleton.lookup_unique(name));
            of[node.index()] = own.or_else(|| {
                taxonomy
                    .parent(node)
                    .and_then(|p| of[p.index()])
            });
        }
        Self { of }
    }

    pub fn get(&self, node: Node) -> Option<Node> {
        self.of.get(node.index()).copied().flatten()
    }
}

/// Neither division contains the other
pub fn unrelated(skeleton: &Taxonomy, a: Node, b: Node) -> bool {
    !skeleton.within(a, b) && !skeleton.within(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisions_inherit_downwards() {
        let skeleton =
            Taxonomy::from_nested("skel", "(Bacteria,(Metazoa,Fungi)Eukaryota)life").unwrap();
        let tax =
            Taxonomy::from_nested("t", "((Homo)Metazoa,(Yeast)Fungi,(E.coli)Bacteria,Orphan)life")
                .unwrap();
        let div = Divisions::compute(&skeleton, &tax);
        let n = |s: &str| tax.lookup_unique(s).unwrap();
        let k = |s: &str| skeleton.lookup_unique(s).unwrap();

        assert_eq!(div.get(n("Homo")), Some(k("Metazoa")));
        assert_eq!(div.get(n("E.coli")), Some(k("Bacteria")));
        assert_eq!(div.get(n("Orphan")), Some(k("life")));

        assert!(unrelated(&skeleton, k("Metazoa"), k("Bacteria")));
        assert!(unrelated(&skeleton, k("Metazoa"), k("Fungi")));
        assert!(!unrelated(&skeleton, k("Metazoa"), k("Eukaryota")));
    }
}
