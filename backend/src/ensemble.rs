//! Replicate ensembles
//!
//! Runs independent replicates of one configuration and averages their
//! outcomes. Replicate `i` is seeded with `RngManager::derive_seed(base, i)`,
//! so a replicate's result depends only on the base seed and its index, never
//! on which worker thread ran it. All replicates share one rate table.

use crate::analysis::{summarize, OutcomeSummary};
use crate::config::SimulationConfig;
use crate::models::reaction::Reaction;
use crate::propagator::{run_with_table, RunState, SimulationError};
use crate::rates::table::RateTable;
use crate::rng::RngManager;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One finished replicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateOutcome {
    pub index: usize,
    pub seed: u64,
    pub state: RunState,
    pub events_applied: usize,
    pub time: f64,
    pub summary: OutcomeSummary,
}

/// Means and standard deviations over replicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub replicates: usize,
    pub mean_bond_fractions: BTreeMap<Reaction, f64>,
    pub std_bond_fractions: BTreeMap<Reaction, f64>,
    pub mean_number_average_dp: f64,
    pub mean_weight_average_dp: f64,
    pub mean_branching_coefficient: f64,
    pub mean_events: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub base_seed: u64,
    /// In replicate order
    pub replicates: Vec<ReplicateOutcome>,
    pub summary: EnsembleSummary,
}

/// Run `replicates` independent runs in parallel
pub fn run_ensemble(
    config: &SimulationConfig,
    replicates: usize,
) -> Result<EnsembleResult, SimulationError> {
    run_ensemble_with(config, replicates, true)
}

/// Same as [`run_ensemble`] on the calling thread
pub fn run_ensemble_sequential(
    config: &SimulationConfig,
    replicates: usize,
) -> Result<EnsembleResult, SimulationError> {
    run_ensemble_with(config, replicates, false)
}

fn run_ensemble_with(
    config: &SimulationConfig,
    replicates: usize,
    parallel: bool,
) -> Result<EnsembleResult, SimulationError> {
    let energies = config.validate()?;
    let table = RateTable::build(config.temperature, &energies)?;
    let base_seed = config.seed.unwrap_or_else(RngManager::entropy_seed);

    log::info!(
        "Running ensemble of {} replicates (base seed {}, {})",
        replicates,
        base_seed,
        if parallel { "parallel" } else { "sequential" }
    );

    let run_one = |index: usize| run_replicate(config, &table, base_seed, index);
    let outcomes: Vec<ReplicateOutcome> = if parallel {
        (0..replicates)
            .into_par_iter()
            .map(run_one)
            .collect::<Result<_, _>>()?
    } else {
        (0..replicates).map(run_one).collect::<Result<_, _>>()?
    };

    let summary = average(&outcomes);
    Ok(EnsembleResult {
        base_seed,
        replicates: outcomes,
        summary,
    })
}

fn run_replicate(
    config: &SimulationConfig,
    table: &RateTable,
    base_seed: u64,
    index: usize,
) -> Result<ReplicateOutcome, SimulationError> {
    let seed = RngManager::derive_seed(base_seed, index as u64);
    let result = run_with_table(config, table, seed)?;
    Ok(ReplicateOutcome {
        index,
        seed,
        state: result.state,
        events_applied: result.events_applied,
        time: result.time,
        summary: summarize(&result.population),
    })
}

/// Average replicate outcomes; an empty ensemble averages to zeros
pub fn average(outcomes: &[ReplicateOutcome]) -> EnsembleSummary {
    let mut mean_bond_fractions = BTreeMap::new();
    let mut std_bond_fractions = BTreeMap::new();
    for reaction in Reaction::ALL.into_iter().filter(|r| r.is_bond()) {
        let fraction = |o: &ReplicateOutcome| {
            o.summary.bond_fractions.get(&reaction).copied().unwrap_or(0.0)
        };
        let mu = mean_of(outcomes, fraction);
        let variance = mean_of(outcomes, |o| (fraction(o) - mu).powi(2));
        mean_bond_fractions.insert(reaction, mu);
        std_bond_fractions.insert(reaction, variance.sqrt());
    }

    EnsembleSummary {
        replicates: outcomes.len(),
        mean_bond_fractions,
        std_bond_fractions,
        mean_number_average_dp: mean_of(outcomes, |o| o.summary.number_average_dp),
        mean_weight_average_dp: mean_of(outcomes, |o| o.summary.weight_average_dp),
        mean_branching_coefficient: mean_of(outcomes, |o| o.summary.branching_coefficient),
        mean_events: mean_of(outcomes, |o| o.events_applied as f64),
    }
}

fn mean_of(outcomes: &[ReplicateOutcome], value: impl Fn(&ReplicateOutcome) -> f64) -> f64 {
    if outcomes.is_empty() {
        0.0
    } else {
        outcomes.iter().map(value).sum::<f64>() / outcomes.len() as f64
    }
}
