//! Reaction types
//!
//! Two unimolecular steps (oxidation, quinone methide hydration) and seven
//! bond-forming couplings. Each coupling consumes one site on each of two
//! units; the site pair is ordered (first unit, second unit) and the same
//! order is used for the regiochemistry flags of the rate-table key.

use crate::models::unit::Site;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reaction type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    /// Phenol → phenoxy radical
    #[serde(rename = "oxidation")]
    Ox,
    /// Quinone methide rearomatized by water addition
    #[serde(rename = "hydration")]
    Q,
    /// beta-O-4 ether
    Bo4,
    /// beta-5 phenylcoumaran
    B5,
    /// beta-beta resinol
    Bb,
    /// 5-5 biphenyl
    #[serde(rename = "55")]
    C5c5,
    /// 5-O-4 diaryl ether
    #[serde(rename = "5o4")]
    C5o4,
    /// beta-1
    B1,
    /// alpha-O-4 ether (phenol addition to a quinone methide)
    Ao4,
}

impl Reaction {
    pub const ALL: [Reaction; 9] = [
        Reaction::Ox,
        Reaction::Q,
        Reaction::Bo4,
        Reaction::B5,
        Reaction::Bb,
        Reaction::C5c5,
        Reaction::C5o4,
        Reaction::B1,
        Reaction::Ao4,
    ];

    /// Couplings between two phenoxy radicals
    pub const RADICAL_COUPLINGS: [Reaction; 6] = [
        Reaction::Bo4,
        Reaction::B5,
        Reaction::Bb,
        Reaction::C5c5,
        Reaction::C5o4,
        Reaction::B1,
    ];

    /// Short label, also used as the serialized name
    pub fn label(self) -> &'static str {
        match self {
            Reaction::Ox => "oxidation",
            Reaction::Q => "hydration",
            Reaction::Bo4 => "bo4",
            Reaction::B5 => "b5",
            Reaction::Bb => "bb",
            Reaction::C5c5 => "55",
            Reaction::C5o4 => "5o4",
            Reaction::B1 => "b1",
            Reaction::Ao4 => "ao4",
        }
    }

    /// True for the seven couplings that create an inter-unit bond
    pub fn is_bond(self) -> bool {
        !matches!(self, Reaction::Ox | Reaction::Q)
    }

    /// Sites consumed on (first, second) unit; `None` for unimolecular steps
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::models::reaction::Reaction;
    /// use lignin_kmc_core_rs::models::unit::Site;
    ///
    /// assert_eq!(Reaction::B5.bond_sites(), Some((Site::C5, Site::C8)));
    /// assert_eq!(Reaction::Ox.bond_sites(), None);
    /// ```
    pub fn bond_sites(self) -> Option<(Site, Site)> {
        match self {
            Reaction::Ox | Reaction::Q => None,
            Reaction::Bo4 => Some((Site::O4, Site::C8)),
            Reaction::B5 => Some((Site::C5, Site::C8)),
            Reaction::Bb => Some((Site::C8, Site::C8)),
            Reaction::C5c5 => Some((Site::C5, Site::C5)),
            Reaction::C5o4 => Some((Site::O4, Site::C5)),
            Reaction::B1 => Some((Site::C1, Site::C8)),
            Reaction::Ao4 => Some((Site::O4, Site::C7)),
        }
    }

    /// Same site on both sides, so (a, b) and (b, a) are one event
    pub fn is_symmetric(self) -> bool {
        matches!(self, Reaction::Bb | Reaction::C5c5)
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Reaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reaction::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| format!("unknown reaction type '{s}'"))
    }
}
