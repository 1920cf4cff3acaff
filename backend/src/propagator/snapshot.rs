//! Snapshot - Save/Resume Propagator State
//!
//! A snapshot captures everything needed to continue a run bit-for-bit:
//! unit states, the bond list (aggregate membership is rebuilt from it), the
//! clock, the RNG state and the tracker's propensity bookkeeping. The candidate
//! event set itself is not stored; it is re-enumerated on resume.
//!
//! # Critical Invariants
//!
//! - **Determinism**: resuming continues exactly as the uninterrupted run
//! - **Conservation**: unit count matches the configuration
//! - **Config Matching**: a snapshot only resumes under the config it was taken with

use crate::config::ConfigError;
use crate::models::population::{Bond, Population};
use crate::models::unit::{Activation, MonomerType, SiteSet, Unit};
use crate::propagator::engine::SimulationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete propagator state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Events applied so far
    pub events_applied: usize,

    /// Simulated time [s]
    pub time: f64,

    /// Seed the run started from
    pub seed: u64,

    /// RNG state at time of snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    /// Running propensity and its resync bookkeeping
    pub propensity: PropensitySnapshot,

    pub population: PopulationSnapshot,

    /// SHA256 hash of the run configuration
    pub config_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropensitySnapshot {
    pub value: f64,
    pub peak: f64,
    pub refreshes_since_resync: usize,
}

/// Units and bonds of a population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub units: Vec<UnitSnapshot>,
    /// Bonds in formation order
    pub bonds: Vec<Bond>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: usize,
    pub monomer: MonomerType,
    pub open_sites: SiteSet,
    pub activation: Activation,
    /// Aggregate root at snapshot time (informational; rebuilt from bonds)
    pub aggregate: usize,
}

impl From<&Population> for PopulationSnapshot {
    fn from(population: &Population) -> Self {
        PopulationSnapshot {
            units: population
                .units()
                .iter()
                .map(|unit| UnitSnapshot {
                    id: unit.id(),
                    monomer: unit.monomer(),
                    open_sites: unit.open_sites(),
                    activation: unit.activation(),
                    aggregate: population.aggregate_of(unit.id()),
                })
                .collect(),
            bonds: population.bonds().to_vec(),
        }
    }
}

impl TryFrom<PopulationSnapshot> for Population {
    type Error = SimulationError;

    fn try_from(snapshot: PopulationSnapshot) -> Result<Self, Self::Error> {
        let units = snapshot
            .units
            .into_iter()
            .map(|u| Unit::with_state(u.id, u.monomer, u.open_sites, u.activation))
            .collect();
        Ok(Population::from_parts(units, snapshot.bonds)?)
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Object keys are sorted recursively before hashing, so the hash does not
/// depend on field or map ordering.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, ConfigError> {
    use serde_json::Value;

    let value = serde_json::to_value(config).map_err(|e| ConfigError::Parse(e.to_string()))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation
// ============================================================================

/// Check snapshot integrity
///
/// - unit count equals `expected_units`
/// - unit ids match their positions
/// - bonds join two existing units and never repeat a pair
/// - recorded aggregate labels agree with the bond list
pub fn validate_snapshot(
    snapshot: &StateSnapshot,
    expected_units: usize,
) -> Result<(), SimulationError> {
    let population = &snapshot.population;
    if population.units.len() != expected_units {
        return Err(SimulationError::StateValidation(format!(
            "Unit conservation violated: expected {}, got {}",
            expected_units,
            population.units.len()
        )));
    }
    if !(snapshot.time.is_finite() && snapshot.time >= 0.0) {
        return Err(SimulationError::StateValidation(format!(
            "Snapshot time must be finite and non-negative, got {}",
            snapshot.time
        )));
    }

    let rebuilt = Population::try_from(population.clone())?;

    let mut seen = BTreeMap::new();
    for (index, bond) in population.bonds.iter().enumerate() {
        if bond.first == bond.second {
            return Err(SimulationError::StateValidation(format!(
                "Bond {} joins unit {} to itself",
                index, bond.first
            )));
        }
        let pair = (bond.first.min(bond.second), bond.first.max(bond.second));
        if let Some(previous) = seen.insert(pair, index) {
            return Err(SimulationError::StateValidation(format!(
                "Units {} and {} bonded twice (bonds {} and {})",
                pair.0, pair.1, previous, index
            )));
        }
    }

    for unit in &population.units {
        if unit.aggregate >= rebuilt.len() || !rebuilt.same_aggregate(unit.id, unit.aggregate) {
            return Err(SimulationError::StateValidation(format!(
                "Unit {} recorded in aggregate {} but bonds place it in {}",
                unit.id,
                unit.aggregate,
                rebuilt.aggregate_of(unit.id)
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reaction::Reaction;

    #[test]
    fn test_compute_config_hash_ignores_key_order() {
        let a: serde_json::Value =
            serde_json::from_str(r#"{"a": 1, "b": {"x": 2, "y": 3}}"#).unwrap();
        let b: serde_json::Value =
            serde_json::from_str(r#"{"b": {"y": 3, "x": 2}, "a": 1}"#).unwrap();
        assert_eq!(compute_config_hash(&a).unwrap(), compute_config_hash(&b).unwrap());
    }

    #[test]
    fn test_population_rebuilds_from_snapshot() {
        let mut population = Population::from_counts(3, 0);
        for id in 0..3 {
            population.apply(Reaction::Ox, id, None).unwrap();
        }
        population.apply(Reaction::Bb, 0, Some(1)).unwrap();

        let snapshot = PopulationSnapshot::from(&population);
        let rebuilt = Population::try_from(snapshot.clone()).unwrap();
        assert_eq!(rebuilt.aggregate_count(), 2);
        assert!(rebuilt.same_aggregate(0, 1));
        assert_eq!(PopulationSnapshot::from(&rebuilt), snapshot);
    }
}
