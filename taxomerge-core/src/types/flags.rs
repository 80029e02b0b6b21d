/// Classification flags carried by taxa
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single classification flag.
///
/// The discriminant is the bit position inside [`Flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    Hidden = 0,
    IncertaeSedis = 1,
    Unclassified = 2,
    Environmental = 3,
    Extinct = 4,
    Viral = 5,
    Hybrid = 6,
    Edited = 7,
    ForcedVisible = 8,
    MajorRankConflict = 9,
    /// Grouping that could not be placed consistently in the union
    Unplaced = 10,
    Barren = 11,
    Infraspecific = 12,
}

impl Flag {
    pub const ALL: [Flag; 13] = [
        Flag::Hidden,
        Flag::IncertaeSedis,
        Flag::Unclassified,
        Flag::Environmental,
        Flag::Extinct,
        Flag::Viral,
        Flag::Hybrid,
        Flag::Edited,
        Flag::ForcedVisible,
        Flag::MajorRankConflict,
        Flag::Unplaced,
        Flag::Barren,
        Flag::Infraspecific,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Hidden => "hidden",
            Flag::IncertaeSedis => "incertae_sedis",
            Flag::Unclassified => "unclassified",
            Flag::Environmental => "environmental",
            Flag::Extinct => "extinct",
            Flag::Viral => "viral",
            Flag::Hybrid => "hybrid",
            Flag::Edited => "edited",
            Flag::ForcedVisible => "forced_visible",
            Flag::MajorRankConflict => "major_rank_conflict",
            Flag::Unplaced => "unplaced",
            Flag::Barren => "barren",
            Flag::Infraspecific => "infraspecific",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Flag::ALL.iter().copied().find(|f| f.as_str() == s)
    }
}

/// Bitset of [`Flag`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);

    /// Flags that propagate from an ancestor to its descendants
    pub fn inheritable() -> Flags {
        Flag::ALL
            .iter()
            .copied()
            .filter(|f| {
                !matches!(
                    f,
                    Flag::Edited | Flag::ForcedVisible | Flag::MajorRankConflict | Flag::Unplaced
                )
            })
            .collect()
    }

    /// Flags that make a taxon hidden from synthesis
    pub fn hiding() -> Flags {
        [
            Flag::Hidden,
            Flag::IncertaeSedis,
            Flag::Unclassified,
            Flag::Environmental,
            Flag::Viral,
            Flag::Hybrid,
            Flag::Barren,
            Flag::MajorRankConflict,
            Flag::Unplaced,
        ]
        .into_iter()
        .collect()
    }

    pub fn contains(&self, flag: Flag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: Flag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: Flag) {
        self.0 &= !flag.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    pub fn intersection(self, other: Flags) -> Flags {
        Flags(self.0 & other.0)
    }

    pub fn intersects(&self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Flag> + '_ {
        Flag::ALL.iter().copied().filter(move |f| self.contains(*f))
    }

    /// Render proper and inherited flags the way taxonomy dumps do,
    /// e.g. `extinct,hidden_inherited`.
    pub fn render(proper: Flags, inherited: Flags) -> String {
        let mut parts: Vec<String> = proper.iter().map(|f| f.as_str().to_string()).collect();
        parts.extend(
            inherited
                .iter()
                .filter(|f| !proper.contains(*f))
                .map(|f| format!("{}_inherited", f.as_str())),
        );
        parts.join(",")
    }

    /// Inverse of [`Flags::render`]. Returns the proper and inherited sets
    /// plus any tokens that were not recognized.
    pub fn parse(s: &str) -> (Flags, Flags, Vec<String>) {
        let mut proper = Flags::NONE;
        let mut inherited = Flags::NONE;
        let mut unknown = Vec::new();

        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if let Some(base) = token.strip_suffix("_inherited") {
                match Flag::parse(base) {
                    Some(flag) => inherited.insert(flag),
                    None => unknown.push(token.to_string()),
                }
            } else {
                match Flag::parse(token) {
                    Some(flag) => proper.insert(flag),
                    None => unknown.push(token.to_string()),
                }
            }
        }

        (proper, inherited, unknown)
    }
}

impl From<Flag> for Flags {
    fn from(flag: Flag) -> Self {
        Flags(flag.bit())
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut flags = Flags::NONE;
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Flags::render(*self, Flags::NONE))
    }
}
