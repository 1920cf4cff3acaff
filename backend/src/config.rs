//! Run configuration
//!
//! Deserialized from JSON and validated before anything is simulated. Every
//! problem found here is a [`ConfigError`]; a configuration that passes
//! [`SimulationConfig::validate`] can always be built into a rate table and an
//! initial population, and the table holds every rate the run can request.

use crate::models::population::Population;
use crate::models::reaction::Reaction;
use crate::rates::energies::{ActivationEnergies, EnergyConfig};
use crate::rates::key::RateKey;
use crate::rates::oracle::{validate_temperature, DEFAULT_TEMPERATURE};
use crate::rng::RngManager;
use crate::tracker::{reachable_keys, DEFAULT_RESYNC_INTERVAL};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors, raised before the first step
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Temperature must be finite and positive, got {0}")]
    InvalidTemperature(f64),

    #[error("Activation energies must be given in kcal/mol or J/particle")]
    MissingActivationEnergies,

    #[error(
        "Activation energies given in both kcal/mol and J/particle{}",
        .0.map(|r| format!(" for {}", r)).unwrap_or_default()
    )]
    ConflictingEnergyUnits(Option<Reaction>),

    #[error("No activation energy for {0}, which this monomer mix can reach")]
    IncompleteEnergies(RateKey),

    #[error("Duplicate activation energy for {0}")]
    DuplicateEnergy(String),

    #[error("Substrate descriptor does not match reaction arity: {0}")]
    SubstrateMismatch(String),

    #[error("Regiochemistry flags must be 0 or 1: {0}")]
    InvalidRegioFlag(String),

    #[error("Activation energy must be finite, got {0}")]
    InvalidEnergy(f64),

    #[error("Invalid horizon: {0}")]
    InvalidHorizon(String),

    #[error("Invalid monomer specification: {0}")]
    InvalidMonomers(String),

    #[error("Propensity resync interval must be at least 1")]
    InvalidResyncInterval,

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Initial monomer mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonomerSpec {
    /// Explicit counts; guaiacyl units are numbered first
    Counts { guaiacyl: usize, syringyl: usize },
    /// `count` monomers drawn with the given S:G ratio from the run RNG
    SgRatio { ratio: f64, count: usize },
}

impl MonomerSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            MonomerSpec::Counts { .. } => Ok(()),
            MonomerSpec::SgRatio { ratio, .. } => {
                if ratio.is_finite() && *ratio >= 0.0 {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidMonomers(format!(
                        "S:G ratio must be finite and non-negative, got {}",
                        ratio
                    )))
                }
            }
        }
    }

    /// Most units of each regio flag (guaiacyl, syringyl) the mix can hold
    pub fn flag_counts(&self) -> [usize; 2] {
        match *self {
            MonomerSpec::Counts { guaiacyl, syringyl } => [guaiacyl, syringyl],
            MonomerSpec::SgRatio { ratio, count } => [count, if ratio > 0.0 { count } else { 0 }],
        }
    }

    pub fn unit_count(&self) -> usize {
        match self {
            MonomerSpec::Counts { guaiacyl, syringyl } => guaiacyl + syringyl,
            MonomerSpec::SgRatio { count, .. } => *count,
        }
    }

    /// Build the initial population; ratio draws consume `rng`
    pub fn build(&self, rng: &mut RngManager) -> Population {
        match *self {
            MonomerSpec::Counts { guaiacyl, syringyl } => {
                Population::from_counts(guaiacyl, syringyl)
            }
            MonomerSpec::SgRatio { ratio, count } => Population::from_sg_ratio(ratio, count, rng),
        }
    }
}

fn default_resync_interval() -> usize {
    DEFAULT_RESYNC_INTERVAL
}

/// Complete configuration of one run
///
/// # Example
/// ```
/// use lignin_kmc_core_rs::config::SimulationConfig;
///
/// let config = SimulationConfig::from_json(r#"{
///     "temperature": 298.15,
///     "monomers": {"counts": {"guaiacyl": 10, "syringyl": 10}},
///     "max_time": 1.0,
///     "seed": 7
/// }"#).unwrap();
/// assert_eq!(config.monomers.unit_count(), 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Kelvin
    pub temperature: f64,

    #[serde(default)]
    pub activation_energies: EnergyConfig,

    pub monomers: MonomerSpec,

    /// Simulated-time horizon [s]; unbounded when absent
    #[serde(default)]
    pub max_time: Option<f64>,

    /// Maximum number of events to apply; unbounded when absent
    #[serde(default)]
    pub max_events: Option<usize>,

    /// RNG seed; derived from the system clock when absent
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_resync_interval")]
    pub propensity_resync_interval: usize,
}

impl SimulationConfig {
    /// Default energies and temperature for the given monomer mix
    pub fn new(monomers: MonomerSpec) -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            activation_energies: EnergyConfig::default(),
            monomers,
            max_time: None,
            max_events: None,
            seed: None,
            propensity_resync_interval: DEFAULT_RESYNC_INTERVAL,
        }
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field; returns the resolved activation energies
    pub fn validate(&self) -> Result<ActivationEnergies, ConfigError> {
        validate_temperature(self.temperature)?;
        let energies = self.activation_energies.resolve()?;
        self.monomers.validate()?;
        if let Some(key) = reachable_keys(self.monomers.flag_counts())
            .into_iter()
            .find(|key| energies.get(key).is_none())
        {
            return Err(ConfigError::IncompleteEnergies(key));
        }

        if let Some(max_time) = self.max_time {
            if max_time.is_nan() || max_time < 0.0 {
                return Err(ConfigError::InvalidHorizon(format!(
                    "max_time must be non-negative, got {}",
                    max_time
                )));
            }
        }
        if self.propensity_resync_interval == 0 {
            return Err(ConfigError::InvalidResyncInterval);
        }
        Ok(energies)
    }

    /// SHA-256 of the canonical JSON form
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        crate::propagator::snapshot::compute_config_hash(self)
    }
}
