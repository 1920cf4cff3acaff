//! Python bindings (feature `pyo3`)
//!
//! A thin JSON-in/JSON-out layer: configurations arrive as JSON strings in the
//! same shape `SimulationConfig` deserializes, results leave as JSON strings.
//! Configuration problems raise `ValueError`; failures during a run raise
//! `RuntimeError`.

use crate::analysis::summarize;
use crate::config::{ConfigError, SimulationConfig};
use crate::ensemble;
use crate::propagator::{run_simulation, SimulationError};
use crate::rates::energies::EnergyConfig;
use crate::rates::oracle::DEFAULT_TEMPERATURE;
use crate::rates::table::RateTable;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn config_err(e: ConfigError) -> PyErr {
    PyErr::new::<PyValueError, _>(e.to_string())
}

fn simulation_err(e: SimulationError) -> PyErr {
    match e {
        SimulationError::Config(e) => config_err(e),
        other => PyErr::new::<PyRuntimeError, _>(other.to_string()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))
}

/// Rate coefficients for every configured key
///
/// # Arguments
///
/// * `temperature` - Kelvin
/// * `energies_json` - `{"kcal_mol": [...]}` or `{"j_particle": [...]}`; defaults when absent
///
/// # Returns
///
/// List of `(reaction, substrate, rate)` tuples sorted by key
#[pyfunction]
#[pyo3(signature = (temperature = DEFAULT_TEMPERATURE, energies_json = None))]
pub fn calc_rates(
    temperature: f64,
    energies_json: Option<&str>,
) -> PyResult<Vec<(String, String, f64)>> {
    let energies = match energies_json {
        Some(json) => serde_json::from_str::<EnergyConfig>(json)
            .map_err(|e| config_err(ConfigError::Parse(e.to_string())))?,
        None => EnergyConfig::default(),
    };
    let energies = energies.resolve().map_err(config_err)?;
    let table = RateTable::build(temperature, &energies).map_err(config_err)?;

    Ok(table
        .entries()
        .into_iter()
        .map(|(key, rate)| (key.reaction.to_string(), key.substrate.to_string(), rate))
        .collect())
}

/// Run one simulation; returns the outcome summary and trace as JSON
#[pyfunction]
pub fn run_kmc(config_json: &str) -> PyResult<String> {
    let config = SimulationConfig::from_json(config_json).map_err(config_err)?;
    let result = run_simulation(&config).map_err(simulation_err)?;

    to_json(&serde_json::json!({
        "state": result.state,
        "time": result.time,
        "events_applied": result.events_applied,
        "seed": result.seed,
        "summary": summarize(&result.population),
        "trace": result.trace.events(),
    }))
}

/// Run `replicates` seeded replicates in parallel; returns the ensemble as JSON
#[pyfunction]
pub fn run_ensemble(config_json: &str, replicates: usize) -> PyResult<String> {
    let config = SimulationConfig::from_json(config_json).map_err(config_err)?;
    let result = ensemble::run_ensemble(&config, replicates).map_err(simulation_err)?;
    to_json(&result)
}
