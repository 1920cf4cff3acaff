//! Rate-table keys
//!
//! A rate coefficient is selected by the reaction type plus a fixed-shape
//! substrate descriptor: the regiochemistry flag of each participant
//! (G = 0, S = 1) and whether each participant is still a free monomer or
//! already part of an oligomer. Oligomers of any size share the `Dimer`
//! bucket.

use crate::models::reaction::Reaction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monomer vs. already-bonded participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Monomer,
    Dimer,
}

impl SizeClass {
    /// Classify an aggregate by its unit count
    pub fn of(aggregate_size: usize) -> Self {
        if aggregate_size > 1 {
            SizeClass::Dimer
        } else {
            SizeClass::Monomer
        }
    }
}

/// Size classes of an ordered participant pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSize {
    MonMon,
    MonDim,
    DimMon,
    DimDim,
}

impl PairSize {
    pub const ALL: [PairSize; 4] = [
        PairSize::MonMon,
        PairSize::MonDim,
        PairSize::DimMon,
        PairSize::DimDim,
    ];

    pub fn from_classes(first: SizeClass, second: SizeClass) -> Self {
        match (first, second) {
            (SizeClass::Monomer, SizeClass::Monomer) => PairSize::MonMon,
            (SizeClass::Monomer, SizeClass::Dimer) => PairSize::MonDim,
            (SizeClass::Dimer, SizeClass::Monomer) => PairSize::DimMon,
            (SizeClass::Dimer, SizeClass::Dimer) => PairSize::DimDim,
        }
    }
}

/// Substrate-state descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Substrate {
    /// Bimolecular: flags and size classes in (first, second) order
    Pair { flags: [u8; 2], sizes: PairSize },
    /// Unimolecular
    Unit { flag: u8, size: SizeClass },
}

impl Substrate {
    pub fn pair(flags: [u8; 2], sizes: PairSize) -> Self {
        Substrate::Pair { flags, sizes }
    }

    pub fn unit(flag: u8, size: SizeClass) -> Self {
        Substrate::Unit { flag, size }
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Substrate::Pair { .. })
    }

    pub fn flags_valid(&self) -> bool {
        match self {
            Substrate::Pair { flags, .. } => flags.iter().all(|&f| f <= 1),
            Substrate::Unit { flag, .. } => *flag <= 1,
        }
    }
}

impl fmt::Display for Substrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Substrate::Pair { flags, sizes } => {
                write!(f, "({}, {}) {:?}", flags[0], flags[1], sizes)
            }
            Substrate::Unit { flag, size } => write!(f, "{} {:?}", flag, size),
        }
    }
}

/// Composite key of the reaction rate table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RateKey {
    pub reaction: Reaction,
    pub substrate: Substrate,
}

impl RateKey {
    pub fn new(reaction: Reaction, substrate: Substrate) -> Self {
        Self {
            reaction,
            substrate,
        }
    }

    /// Bond reactions take pair descriptors, oxidation/hydration take unit ones
    pub fn arity_matches(&self) -> bool {
        self.reaction.is_bond() == self.substrate.is_pair()
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.reaction, self.substrate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_class_collapses_oligomers() {
        assert_eq!(SizeClass::of(1), SizeClass::Monomer);
        assert_eq!(SizeClass::of(2), SizeClass::Dimer);
        assert_eq!(SizeClass::of(40), SizeClass::Dimer);
    }

    #[test]
    fn test_substrate_untagged_forms() {
        let pair: Substrate =
            serde_json::from_str(r#"{"flags": [1, 0], "sizes": "mon_dim"}"#).unwrap();
        assert_eq!(pair, Substrate::pair([1, 0], PairSize::MonDim));

        let unit: Substrate = serde_json::from_str(r#"{"flag": 1, "size": "dimer"}"#).unwrap();
        assert_eq!(unit, Substrate::unit(1, SizeClass::Dimer));
    }

    #[test]
    fn test_arity_matches() {
        let ox = RateKey::new(Reaction::Ox, Substrate::unit(0, SizeClass::Monomer));
        assert!(ox.arity_matches());
        let bad = RateKey::new(Reaction::Ox, Substrate::pair([0, 0], PairSize::MonMon));
        assert!(!bad.arity_matches());
    }
}
