//! Lignin KMC Core - Rust Engine
//!
//! Kinetic Monte Carlo simulation of lignin polymerization with deterministic
//! execution.
//!
//! # Architecture
//!
//! - **rates**: Eyring rate oracle and the immutable reaction rate table
//! - **models**: Chemistry (units, sites, reactions), population, event trace
//! - **tracker**: Candidate event set and propensity sum
//! - **propagator**: Gillespie loop, termination, snapshots
//! - **analysis**: Outcome summaries of a final population
//! - **ensemble**: Parallel replicate runs
//! - **config**: Run configuration and validation
//! - **core**: Simulation clock
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. The propensity sum equals the sum of live event rates
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Units are never created or destroyed during a run
//! 4. FFI boundary is minimal and safe

pub mod analysis;
pub mod config;
pub mod core;
pub mod ensemble;
pub mod models;
pub mod propagator;
pub mod rates;
pub mod rng;
pub mod tracker;

// Re-exports for convenience
pub use analysis::{summarize, AggregateSummary, OutcomeSummary};
pub use config::{ConfigError, MonomerSpec, SimulationConfig};
pub use crate::core::time::SimulationClock;
pub use ensemble::{run_ensemble, EnsembleResult, EnsembleSummary, ReplicateOutcome};
pub use models::{
    event::{Event, EventLog},
    population::{Bond, Population, PopulationError},
    reaction::Reaction,
    unit::{Activation, MonomerType, Site, Unit},
};
pub use propagator::{run_simulation, Horizon, Propagator, RunResult, RunState, SimulationError};
pub use rates::{
    ActivationEnergies, ActivationEnergy, RateKey, RateTable, RateTableError, Substrate,
};
pub use rng::RngManager;
pub use tracker::{CandidateEvent, EventKey, EventTracker};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn lignin_kmc_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::calc_rates, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::run_kmc, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::run_ensemble, m)?)?;
    Ok(())
}
