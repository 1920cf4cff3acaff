//! Activation energies per rate-table key
//!
//! The configuration supplies energies either in kcal/mol or in J/particle.
//! A reaction type may use only one of the two units; giving both for the
//! same type, or giving neither list, is a configuration error.

use crate::config::ConfigError;
use crate::models::reaction::Reaction;
use crate::rates::key::{PairSize, RateKey, SizeClass, Substrate};
use crate::rates::oracle::ActivationEnergy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One configured activation energy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyEntry {
    pub reaction: Reaction,
    pub substrate: Substrate,
    pub energy: f64,
}

impl EnergyEntry {
    pub fn key(&self) -> RateKey {
        RateKey::new(self.reaction, self.substrate)
    }
}

/// Activation energies as they appear in the run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kcal_mol: Option<Vec<EnergyEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub j_particle: Option<Vec<EnergyEntry>>,
}

impl Default for EnergyConfig {
    /// The published default barriers, in kcal/mol
    fn default() -> Self {
        Self {
            kcal_mol: Some(default_kcal_mol_entries()),
            j_particle: None,
        }
    }
}

impl EnergyConfig {
    /// Validate and merge both lists into one keyed table
    pub fn resolve(&self) -> Result<ActivationEnergies, ConfigError> {
        if self.kcal_mol.is_none() && self.j_particle.is_none() {
            return Err(ConfigError::MissingActivationEnergies);
        }
        let kcal = self.kcal_mol.as_deref().unwrap_or_default();
        let joule = self.j_particle.as_deref().unwrap_or_default();

        let kcal_types: BTreeSet<Reaction> = kcal.iter().map(|e| e.reaction).collect();
        if let Some(reaction) = joule.iter().map(|e| e.reaction).find(|r| kcal_types.contains(r)) {
            return Err(ConfigError::ConflictingEnergyUnits(Some(reaction)));
        }

        let mut energies = ActivationEnergies::default();
        for entry in kcal {
            energies.insert(entry.key(), ActivationEnergy::KcalPerMol(entry.energy))?;
        }
        for entry in joule {
            energies.insert(entry.key(), ActivationEnergy::JoulePerParticle(entry.energy))?;
        }
        Ok(energies)
    }
}

/// Validated activation energies keyed by rate-table key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivationEnergies {
    entries: BTreeMap<RateKey, ActivationEnergy>,
}

impl ActivationEnergies {
    /// Default barriers (kcal/mol)
    pub fn defaults() -> Self {
        let mut energies = Self::default();
        for entry in default_kcal_mol_entries() {
            energies
                .entries
                .insert(entry.key(), ActivationEnergy::KcalPerMol(entry.energy));
        }
        energies
    }

    /// Add one energy, rejecting malformed or repeated keys
    pub fn insert(&mut self, key: RateKey, energy: ActivationEnergy) -> Result<(), ConfigError> {
        if !key.arity_matches() {
            return Err(ConfigError::SubstrateMismatch(key.to_string()));
        }
        if !key.substrate.flags_valid() {
            return Err(ConfigError::InvalidRegioFlag(key.to_string()));
        }
        energy.validate()?;
        if self.entries.insert(key, energy).is_some() {
            return Err(ConfigError::DuplicateEnergy(key.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, key: &RateKey) -> Option<ActivationEnergy> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&RateKey, &ActivationEnergy)> {
        self.entries.iter()
    }
}

/// Default bimolecular barriers: (reaction, flags, [MON_MON, MON_DIM, DIM_MON, DIM_DIM])
const PAIR_DEFAULTS: &[(Reaction, [u8; 2], [Option<f64>; 4])] = &[
    (Reaction::C5o4, [0, 0], [Some(11.2), Some(14.6), Some(14.6), Some(4.4)]),
    (Reaction::C5o4, [1, 0], [Some(10.9), Some(14.6), Some(14.6), Some(4.4)]),
    (Reaction::C5c5, [0, 0], [Some(12.5), Some(15.6), Some(15.6), Some(3.8)]),
    (Reaction::B5, [0, 0], [Some(5.5), Some(5.8), Some(5.8), Some(5.8)]),
    (Reaction::B5, [0, 1], [Some(5.5), Some(5.8), Some(5.8), Some(5.8)]),
    (Reaction::Bb, [0, 0], [Some(5.2), Some(5.2), Some(5.2), Some(5.2)]),
    (Reaction::Bb, [1, 0], [Some(6.5), Some(6.5), Some(6.5), Some(6.5)]),
    (Reaction::Bb, [1, 1], [Some(5.2), Some(5.2), Some(5.2), Some(5.2)]),
    (Reaction::Bb, [0, 1], [Some(6.5), Some(6.5), Some(6.5), Some(6.5)]),
    (Reaction::Bo4, [0, 0], [Some(6.3), Some(6.2), Some(6.2), Some(6.2)]),
    (Reaction::Bo4, [1, 0], [Some(9.1), Some(6.2), Some(6.2), Some(6.2)]),
    (Reaction::Bo4, [0, 1], [Some(8.9), Some(6.2), Some(6.2), Some(6.2)]),
    // S-S dimer-dimer shares the S-S mixed barrier
    (Reaction::Bo4, [1, 1], [Some(9.8), Some(10.4), Some(10.4), Some(10.4)]),
    (Reaction::Ao4, [0, 0], [Some(20.7), Some(20.7), Some(20.7), Some(20.7)]),
    (Reaction::Ao4, [1, 0], [Some(20.7), Some(20.7), Some(20.7), Some(20.7)]),
    (Reaction::Ao4, [0, 1], [Some(20.7), Some(20.7), Some(20.7), Some(20.7)]),
    (Reaction::Ao4, [1, 1], [Some(20.7), Some(20.7), Some(20.7), Some(20.7)]),
    // The C1 partner is always in an oligomer, so there is no monomer-monomer barrier
    (Reaction::B1, [0, 0], [None, Some(9.6), Some(9.6), Some(9.6)]),
    (Reaction::B1, [1, 0], [None, Some(11.7), Some(11.7), Some(11.7)]),
    (Reaction::B1, [0, 1], [None, Some(10.7), Some(10.7), Some(10.7)]),
    (Reaction::B1, [1, 1], [None, Some(11.9), Some(11.9), Some(11.9)]),
];

/// Default unimolecular barriers: (reaction, flag, [MONOMER, DIMER])
const UNIT_DEFAULTS: &[(Reaction, u8, [f64; 2])] = &[
    (Reaction::Ox, 0, [0.9, 6.3]),
    (Reaction::Ox, 1, [0.6, 2.2]),
    (Reaction::Q, 0, [11.1, 11.1]),
    (Reaction::Q, 1, [11.7, 11.7]),
];

/// Default barrier list in kcal/mol
pub fn default_kcal_mol_entries() -> Vec<EnergyEntry> {
    let pairs = PAIR_DEFAULTS.iter().flat_map(|&(reaction, flags, energies)| {
        PairSize::ALL
            .into_iter()
            .zip(energies)
            .filter_map(move |(sizes, energy)| {
                energy.map(|energy| EnergyEntry {
                    reaction,
                    substrate: Substrate::pair(flags, sizes),
                    energy,
                })
            })
    });
    let units = UNIT_DEFAULTS.iter().flat_map(|&(reaction, flag, energies)| {
        [SizeClass::Monomer, SizeClass::Dimer]
            .into_iter()
            .zip(energies)
            .map(move |(size, energy)| EnergyEntry {
                reaction,
                substrate: Substrate::unit(flag, size),
                energy,
            })
    });
    pairs.chain(units).collect()
}
