//! Rate oracle: Eyring equation
//!
//! ```text
//! k = (kB * T / h) * exp(-Ea / (kB * T))
//! ```
//!
//! with `Ea` in J/particle. Energies given in kcal/mol are converted with
//! 4184 J/kcal and Avogadro's number. Constants are the CODATA 2014 values,
//! which reproduce the published reference rate tables.

use crate::config::ConfigError;
use crate::rates::key::RateKey;
use serde::{Deserialize, Serialize};

/// Boltzmann constant [J/K]
pub const BOLTZMANN: f64 = 1.38064852e-23;
/// Planck constant [J s]
pub const PLANCK: f64 = 6.62607004e-34;
/// Avogadro constant [1/mol]
pub const AVOGADRO: f64 = 6.022140857e23;
/// Joules per kilocalorie
pub const J_PER_KCAL: f64 = 4184.0;
/// Reference temperature [K]
pub const DEFAULT_TEMPERATURE: f64 = 298.15;

/// Activation energy with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationEnergy {
    KcalPerMol(f64),
    JoulePerParticle(f64),
}

impl ActivationEnergy {
    /// Build from the two optional inputs; exactly one must be present
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::rates::oracle::ActivationEnergy;
    ///
    /// assert!(ActivationEnergy::from_parts(Some(11.2), None).is_ok());
    /// assert!(ActivationEnergy::from_parts(Some(11.2), Some(7.8e-20)).is_err());
    /// assert!(ActivationEnergy::from_parts(None, None).is_err());
    /// ```
    pub fn from_parts(kcal_mol: Option<f64>, j_particle: Option<f64>) -> Result<Self, ConfigError> {
        let energy = match (kcal_mol, j_particle) {
            (Some(kcal), None) => ActivationEnergy::KcalPerMol(kcal),
            (None, Some(joule)) => ActivationEnergy::JoulePerParticle(joule),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingEnergyUnits(None)),
            (None, None) => return Err(ConfigError::MissingActivationEnergies),
        };
        energy.validate()?;
        Ok(energy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let value = match self {
            ActivationEnergy::KcalPerMol(v) | ActivationEnergy::JoulePerParticle(v) => *v,
        };
        if value.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidEnergy(value))
        }
    }

    /// Energy in J/particle
    pub fn joule_per_particle(&self) -> f64 {
        match self {
            ActivationEnergy::KcalPerMol(kcal) => kcal * J_PER_KCAL / AVOGADRO,
            ActivationEnergy::JoulePerParticle(joule) => *joule,
        }
    }
}

/// Source of rate coefficients for the rate table
pub trait RateOracle {
    /// Rate coefficient [1/s] for `key` at `temperature` [K]
    fn rate(
        &self,
        key: &RateKey,
        temperature: f64,
        energy: ActivationEnergy,
    ) -> Result<f64, ConfigError>;
}

/// Transition-state-theory oracle
#[derive(Debug, Clone, Copy, Default)]
pub struct EyringOracle;

impl RateOracle for EyringOracle {
    fn rate(
        &self,
        _key: &RateKey,
        temperature: f64,
        energy: ActivationEnergy,
    ) -> Result<f64, ConfigError> {
        eyring_rate(temperature, energy)
    }
}

/// Eyring rate coefficient
///
/// # Errors
///
/// Temperatures that are not finite and strictly positive are rejected.
///
/// # Example
/// ```
/// use lignin_kmc_core_rs::rates::oracle::{eyring_rate, ActivationEnergy, DEFAULT_TEMPERATURE};
///
/// let k = eyring_rate(DEFAULT_TEMPERATURE, ActivationEnergy::KcalPerMol(11.2)).unwrap();
/// assert!((k - 38335.597214837195).abs() / k < 1e-6);
/// ```
pub fn eyring_rate(temperature: f64, energy: ActivationEnergy) -> Result<f64, ConfigError> {
    validate_temperature(temperature)?;
    energy.validate()?;
    let kt = BOLTZMANN * temperature;
    Ok(kt / PLANCK * (-energy.joule_per_particle() / kt).exp())
}

pub fn validate_temperature(temperature: f64) -> Result<(), ConfigError> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTemperature(temperature))
    }
}
