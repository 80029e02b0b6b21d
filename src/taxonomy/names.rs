//! Display names that tell homonyms apart

use super::{Node, Taxonomy};

impl Taxonomy {
    /// Name that is unique within this taxonomy.
    ///
    /// A name carried by one taxon is returned as is. Homonyms are qualified
    /// with their rank and the nearest named ancestor none of the other
    /// homonyms share, e.g. `Aotus (genus in Fabaceae)`. When no such
    /// ancestor exists the qualified id is used instead. Nameless taxa give
    /// an empty string.
    pub fn unique_name(&self, node: Node) -> String {
        let Some(name) = self[node].name() else {
            return String::new();
        };
        let homonyms: Vec<Node> = self.lookup_primary(name).filter(|&n| n != node).collect();
        if homonyms.is_empty() {
            return name.to_string();
        }

        let rank = self[node].rank();
        let qualifier = if rank.is_ranked() {
            format!("{} in ", rank)
        } else {
            "in ".to_string()
        };

        for ancestor in self.ancestors(node) {
            let Some(ancestor_name) = self[ancestor].name() else {
                continue;
            };
            if ancestor_name == name {
                continue;
            }
            let shared = homonyms.iter().any(|&h| {
                self.ancestors(h)
                    .any(|a| self[a].name() == Some(ancestor_name))
            });
            if !shared {
                return format!("{} ({}{})", name, qualifier, ancestor_name);
            }
        }

        match self[node].id() {
            Some(id) => format!("{} ({}:{})", name, self.tag, id),
            None => format!("{} ({})", name, node),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::taxonomy::Taxonomy;
    use taxomerge_core::Rank;

    #[test]
    fn test_unique_names() {
        let mut tax =
            Taxonomy::from_nested("t", "((Aotus)Fabaceae,(Aotus)Aotidae,Homo)life").unwrap();
        let homo = tax.lookup_unique("Homo").unwrap();
        let aotus: Vec<_> = tax.lookup_primary("Aotus").collect();
        tax.set_rank(aotus[0], Rank::Genus).unwrap();

        assert_eq!(tax.unique_name(homo), "Homo");
        assert_eq!(tax.unique_name(aotus[0]), "Aotus (genus in Fabaceae)");
        assert_eq!(tax.unique_name(aotus[1]), "Aotus (in Aotidae)");
    }

    #[test]
    fn test_unique_name_falls_back_to_id() {
        let mut tax = Taxonomy::new("ncbi");
        let root = tax.new_taxon(Some("life"), Rank::NoRank, Some("1")).unwrap();
        tax.add_root(root).unwrap();
        let x1 = tax.new_taxon(Some("x"), Rank::NoRank, Some("2")).unwrap();
        let x2 = tax.new_taxon(Some("x"), Rank::NoRank, Some("3")).unwrap();
        tax.attach(x1, root).unwrap();
        tax.attach(x2, root).unwrap();

        assert_eq!(tax.unique_name(x1), "x (ncbi:2)");
        assert_eq!(tax.unique_name(x2), "x (ncbi:3)");
    }
}
