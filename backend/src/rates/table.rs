//! Reaction rate table
//!
//! Built once per temperature by calling the rate oracle for every configured
//! key; immutable afterwards. The table is `Sync` and is shared by reference
//! across ensemble replicates.

use crate::config::ConfigError;
use crate::models::reaction::Reaction;
use crate::rates::energies::ActivationEnergies;
use crate::rates::key::{RateKey, Substrate};
use crate::rates::oracle::{validate_temperature, EyringOracle, RateOracle};
use std::collections::HashMap;
use thiserror::Error;

/// Rate lookup failures. These indicate the tracker produced a key the
/// configuration never enumerated and are fatal for the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateTableError {
    #[error("No rate coefficient configured for {0}")]
    MissingRate(RateKey),
}

/// Immutable (reaction, substrate) → rate coefficient map
#[derive(Debug, Clone)]
pub struct RateTable {
    temperature: f64,
    rates: HashMap<RateKey, f64>,
}

impl RateTable {
    /// Build with the Eyring oracle
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::rates::{ActivationEnergies, RateTable, DEFAULT_TEMPERATURE};
    ///
    /// let table = RateTable::build(DEFAULT_TEMPERATURE, &ActivationEnergies::defaults()).unwrap();
    /// assert_eq!(table.len(), ActivationEnergies::defaults().len());
    /// ```
    pub fn build(temperature: f64, energies: &ActivationEnergies) -> Result<Self, ConfigError> {
        Self::build_with(&EyringOracle, temperature, energies)
    }

    /// Build with an arbitrary oracle, one call per configured key
    pub fn build_with<O: RateOracle>(
        oracle: &O,
        temperature: f64,
        energies: &ActivationEnergies,
    ) -> Result<Self, ConfigError> {
        validate_temperature(temperature)?;
        let rates = energies
            .iter()
            .map(|(key, energy)| Ok((*key, oracle.rate(key, temperature, *energy)?)))
            .collect::<Result<HashMap<_, _>, ConfigError>>()?;
        log::debug!("Built rate table with {} entries at {} K", rates.len(), temperature);
        Ok(Self { temperature, rates })
    }

    /// Rate coefficient for `key`
    pub fn get(&self, key: &RateKey) -> Result<f64, RateTableError> {
        self.rates
            .get(key)
            .copied()
            .ok_or(RateTableError::MissingRate(*key))
    }

    /// Shorthand for `get(&RateKey::new(reaction, substrate))`
    pub fn rate(&self, reaction: Reaction, substrate: Substrate) -> Result<f64, RateTableError> {
        self.get(&RateKey::new(reaction, substrate))
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Entries sorted by key
    pub fn entries(&self) -> Vec<(RateKey, f64)> {
        let mut entries: Vec<(RateKey, f64)> = self.rates.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
