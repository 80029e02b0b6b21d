/// Taxonomic ranks shared by every taxonomy
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard taxonomic ranks from domain down to forma.
///
/// Declaration order is hierarchy order, so `Rank::Genus < Rank::Species`.
/// `NoRank` sorts last and never compares as "above" anything meaningful;
/// use [`Rank::is_ranked`] before relying on order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Domain,
    Superkingdom,
    Kingdom,
    Subkingdom,
    Superphylum,
    Phylum,
    Subphylum,
    Superclass,
    Class,
    Subclass,
    Infraclass,
    Superorder,
    Order,
    Suborder,
    Infraorder,
    Superfamily,
    Family,
    Subfamily,
    Tribe,
    Subtribe,
    Genus,
    Subgenus,
    Section,
    SpeciesGroup,
    Species,
    Subspecies,
    Varietas,
    Forma,
    Strain,
    #[default]
    NoRank,
}

impl Rank {
    /// Parse a rank name as it appears in taxonomy dumps.
    ///
    /// Unknown strings map to `NoRank` rather than failing; loaders count
    /// them instead.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "domain" => Self::Domain,
            "superkingdom" => Self::Superkingdom,
            "kingdom" => Self::Kingdom,
            "subkingdom" => Self::Subkingdom,
            "superphylum" | "superdivision" => Self::Superphylum,
            "phylum" | "division" => Self::Phylum,
            "subphylum" | "subdivision" => Self::Subphylum,
            "superclass" => Self::Superclass,
            "class" => Self::Class,
            "subclass" => Self::Subclass,
            "infraclass" => Self::Infraclass,
            "superorder" => Self::Superorder,
            "order" => Self::Order,
            "suborder" => Self::Suborder,
            "infraorder" | "parvorder" => Self::Infraorder,
            "superfamily" => Self::Superfamily,
            "family" => Self::Family,
            "subfamily" => Self::Subfamily,
            "tribe" => Self::Tribe,
            "subtribe" => Self::Subtribe,
            "genus" => Self::Genus,
            "subgenus" => Self::Subgenus,
            "section" | "subsection" => Self::Section,
            "species group" | "species_group" | "species subgroup" => Self::SpeciesGroup,
            "species" => Self::Species,
            "subspecies" => Self::Subspecies,
            "varietas" | "variety" => Self::Varietas,
            "forma" | "form" => Self::Forma,
            "strain" => Self::Strain,
            _ => Self::NoRank,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Superkingdom => "superkingdom",
            Self::Kingdom => "kingdom",
            Self::Subkingdom => "subkingdom",
            Self::Superphylum => "superphylum",
            Self::Phylum => "phylum",
            Self::Subphylum => "subphylum",
            Self::Superclass => "superclass",
            Self::Class => "class",
            Self::Subclass => "subclass",
            Self::Infraclass => "infraclass",
            Self::Superorder => "superorder",
            Self::Order => "order",
            Self::Suborder => "suborder",
            Self::Infraorder => "infraorder",
            Self::Superfamily => "superfamily",
            Self::Family => "family",
            Self::Subfamily => "subfamily",
            Self::Tribe => "tribe",
            Self::Subtribe => "subtribe",
            Self::Genus => "genus",
            Self::Subgenus => "subgenus",
            Self::Section => "section",
            Self::SpeciesGroup => "species group",
            Self::Species => "species",
            Self::Subspecies => "subspecies",
            Self::Varietas => "varietas",
            Self::Forma => "forma",
            Self::Strain => "strain",
            Self::NoRank => "no rank",
        }
    }

    /// Whether a real rank was assigned
    pub fn is_ranked(&self) -> bool {
        *self != Self::NoRank
    }

    /// Below species level
    pub fn is_infraspecific(&self) -> bool {
        self.is_ranked() && *self > Self::Species
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
