//! Propagator Engine
//!
//! Gillespie direct-method loop over the tracker's candidate events.
//!
//! # Architecture
//!
//! ```text
//! Each step:
//! 1. Check termination (event limit, time limit, empty event set)
//! 2. Draw the waiting time dt = -ln(u1) / A
//! 3. Stop at the horizon if the event would fire after it
//! 4. Select the event whose cumulative rate first exceeds u2 * A
//! 5. Apply it to the population and log it
//! 6. Refresh the tracker around the participants
//! ```
//!
//! An error while applying or refreshing leaves the propagator `Aborted`;
//! later steps do nothing.
//!
//! # Example
//!
//! ```rust
//! use lignin_kmc_core_rs::config::{MonomerSpec, SimulationConfig};
//! use lignin_kmc_core_rs::propagator::{run_simulation, RunState};
//!
//! let mut config = SimulationConfig::new(MonomerSpec::Counts { guaiacyl: 4, syringyl: 4 });
//! config.seed = Some(12345);
//! config.max_events = Some(20);
//!
//! let result = run_simulation(&config).unwrap();
//! assert!(result.events_applied <= 20);
//! assert_eq!(result.population.len(), 8);
//! assert_ne!(result.state, RunState::Running);
//! ```

use crate::config::{ConfigError, SimulationConfig};
use crate::core::time::SimulationClock;
use crate::models::event::{Event, EventLog};
use crate::models::population::{Population, PopulationError};
use crate::models::reaction::Reaction;
use crate::propagator::snapshot::{
    validate_snapshot, PopulationSnapshot, PropensitySnapshot, StateSnapshot,
};
use crate::rates::table::{RateTable, RateTableError};
use crate::rng::RngManager;
use crate::tracker::{CandidateEvent, EventKey, EventTracker};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    RateTable(#[from] RateTableError),

    #[error(transparent)]
    Population(#[from] PopulationError),

    #[error(
        "Snapshot was taken under a different configuration (expected {expected}, got {found})"
    )]
    ConfigMismatch { expected: String, found: String },

    #[error("Invalid snapshot: {0}")]
    StateValidation(String),
}

// ============================================================================
// Run control
// ============================================================================

/// Stopping criteria; either bound may be absent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Horizon {
    /// Simulated seconds; `f64::INFINITY` for no limit
    pub max_time: f64,
    pub max_events: Option<usize>,
}

impl Default for Horizon {
    fn default() -> Self {
        Self {
            max_time: f64::INFINITY,
            max_events: None,
        }
    }
}

impl Horizon {
    pub fn time(max_time: f64) -> Self {
        Self {
            max_time,
            max_events: None,
        }
    }

    pub fn events(max_events: usize) -> Self {
        Self {
            max_time: f64::INFINITY,
            max_events: Some(max_events),
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            max_time: config.max_time.unwrap_or(f64::INFINITY),
            max_events: config.max_events,
        }
    }
}

/// Propagator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    TerminatedTimeLimit,
    TerminatedNoEvents,
    TerminatedEventLimit,
    /// A step failed; population and tracker may disagree
    Aborted,
}

impl RunState {
    pub fn is_terminated(self) -> bool {
        self != RunState::Running
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunState::Running => "running",
            RunState::TerminatedTimeLimit => "time limit reached",
            RunState::TerminatedNoEvents => "no events left",
            RunState::TerminatedEventLimit => "event limit reached",
            RunState::Aborted => "aborted after an error",
        };
        f.write_str(text)
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub state: RunState,
    /// Final simulated time [s]
    pub time: f64,
    pub events_applied: usize,
    pub seed: u64,
    pub population: Population,
    pub trace: EventLog,
}

// ============================================================================
// Propagator
// ============================================================================

/// KMC propagator for one run
///
/// Owns the population, tracker, clock and RNG; borrows the shared rate table.
pub struct Propagator<'t> {
    table: &'t RateTable,
    population: Population,
    tracker: EventTracker,
    clock: SimulationClock,
    rng: RngManager,
    horizon: Horizon,
    trace: EventLog,
    events_applied: usize,
    state: RunState,
    seed: u64,
}

impl<'t> Propagator<'t> {
    /// Start a run on `population`
    ///
    /// `seed` is only recorded; `rng` carries the actual generator state.
    pub fn new(
        population: Population,
        table: &'t RateTable,
        rng: RngManager,
        seed: u64,
        horizon: Horizon,
        resync_interval: usize,
    ) -> Result<Self, SimulationError> {
        if horizon.max_time.is_nan() || horizon.max_time < 0.0 {
            return Err(ConfigError::InvalidHorizon(format!(
                "max_time must be non-negative, got {}",
                horizon.max_time
            ))
            .into());
        }
        let tracker = EventTracker::with_resync_interval(&population, table, resync_interval)?;

        Ok(Self {
            table,
            population,
            tracker,
            clock: SimulationClock::new(),
            rng,
            horizon,
            trace: EventLog::new(),
            events_applied: 0,
            state: RunState::Running,
            seed,
        })
    }

    /// Build the initial population from `config` and seed the RNG
    ///
    /// The configuration must already be validated against `table`.
    pub fn from_config(
        config: &SimulationConfig,
        table: &'t RateTable,
        seed: u64,
    ) -> Result<Self, SimulationError> {
        let mut rng = RngManager::new(seed);
        let population = config.monomers.build(&mut rng);
        Self::new(
            population,
            table,
            rng,
            seed,
            Horizon::from_config(config),
            config.propensity_resync_interval,
        )
    }

    /// Continue a run from a snapshot taken under `config`
    pub fn resume(
        config: &SimulationConfig,
        table: &'t RateTable,
        snapshot: StateSnapshot,
    ) -> Result<Self, SimulationError> {
        let expected = config.fingerprint()?;
        if snapshot.config_hash != expected {
            return Err(SimulationError::ConfigMismatch {
                expected,
                found: snapshot.config_hash,
            });
        }
        validate_snapshot(&snapshot, config.monomers.unit_count())?;

        let population = Population::try_from(snapshot.population)?;
        let mut propagator = Self::new(
            population,
            table,
            RngManager::new(snapshot.rng_state),
            snapshot.seed,
            Horizon::from_config(config),
            config.propensity_resync_interval,
        )?;
        let PropensitySnapshot {
            value,
            peak,
            refreshes_since_resync,
        } = snapshot.propensity;
        propagator.tracker.restore_bookkeeping(value, peak, refreshes_since_resync);
        propagator.clock = SimulationClock::starting_at(snapshot.time);
        propagator.events_applied = snapshot.events_applied;

        log::debug!(
            "Resumed run at t = {:e} s after {} events",
            snapshot.time,
            snapshot.events_applied
        );
        Ok(propagator)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn time(&self) -> f64 {
        self.clock.now()
    }

    pub fn events_applied(&self) -> usize {
        self.events_applied
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn tracker(&self) -> &EventTracker {
        &self.tracker
    }

    pub fn trace(&self) -> &EventLog {
        &self.trace
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn table(&self) -> &RateTable {
        self.table
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Apply at most one event; returns the state after the step
    pub fn step(&mut self) -> Result<RunState, SimulationError> {
        if self.state.is_terminated() {
            return Ok(self.state);
        }
        if let Some(max_events) = self.horizon.max_events {
            if self.events_applied >= max_events {
                return Ok(self.terminate(RunState::TerminatedEventLimit));
            }
        }
        if self.clock.now() >= self.horizon.max_time {
            return Ok(self.terminate(RunState::TerminatedTimeLimit));
        }

        let total = self.tracker.propensity();
        if self.tracker.is_empty() || total <= 0.0 {
            return Ok(self.terminate(RunState::TerminatedNoEvents));
        }

        let dt = -self.rng.next_open_f64().ln() / total;
        if self.clock.now() + dt > self.horizon.max_time {
            self.clock.advance_to(self.horizon.max_time);
            return Ok(self.terminate(RunState::TerminatedTimeLimit));
        }

        let threshold = self.rng.next_open_f64() * total;
        let key = match select_event(self.tracker.events(), threshold) {
            Some(event) => event.key,
            None => return Ok(self.terminate(RunState::TerminatedNoEvents)),
        };

        let merge = match self.population.apply(key.reaction, key.first, key.second) {
            Ok(merge) => merge,
            Err(e) => return Err(self.abort(e.into())),
        };
        self.clock.advance(dt);
        let event = self.event_for(&key);
        self.trace.log(event);
        self.events_applied += 1;

        if let Err(e) = self
            .tracker
            .apply_and_refresh(&key, &self.population, merge.as_ref(), self.table)
        {
            return Err(self.abort(e.into()));
        }
        Ok(RunState::Running)
    }

    /// Step until a termination state is reached
    pub fn run(&mut self) -> Result<RunState, SimulationError> {
        log::info!(
            "Starting KMC run: {} units, {} candidate events, seed {}",
            self.population.len(),
            self.tracker.len(),
            self.seed
        );
        while !self.step()?.is_terminated() {}
        log::info!(
            "KMC run finished ({}): {} events, t = {:e} s, {} aggregates",
            self.state,
            self.events_applied,
            self.clock.now(),
            self.population.aggregate_count()
        );
        Ok(self.state)
    }

    pub fn into_result(self) -> RunResult {
        RunResult {
            state: self.state,
            time: self.clock.now(),
            events_applied: self.events_applied,
            seed: self.seed,
            population: self.population,
            trace: self.trace,
        }
    }

    /// Capture the state needed to resume under `config`
    pub fn snapshot(&self, config: &SimulationConfig) -> Result<StateSnapshot, SimulationError> {
        let (value, peak, refreshes_since_resync) = self.tracker.bookkeeping();
        Ok(StateSnapshot {
            events_applied: self.events_applied,
            time: self.clock.now(),
            seed: self.seed,
            rng_state: self.rng.get_state(),
            propensity: PropensitySnapshot {
                value,
                peak,
                refreshes_since_resync,
            },
            population: PopulationSnapshot::from(&self.population),
            config_hash: config.fingerprint()?,
        })
    }

    fn abort(&mut self, error: SimulationError) -> SimulationError {
        log::warn!(
            "Aborting run after {} events at t = {:e} s: {}",
            self.events_applied,
            self.clock.now(),
            error
        );
        self.state = RunState::Aborted;
        error
    }

    fn terminate(&mut self, state: RunState) -> RunState {
        log::debug!("Terminating at t = {:e} s: {}", self.clock.now(), state);
        self.state = state;
        state
    }

    fn event_for(&self, key: &EventKey) -> Event {
        let step = self.events_applied;
        let time = self.clock.now();
        match (key.reaction, key.second) {
            (Reaction::Ox, _) => Event::Oxidation {
                step,
                time,
                unit: key.first,
            },
            (Reaction::Q, _) => Event::Hydration {
                step,
                time,
                unit: key.first,
            },
            (reaction, second) => Event::BondFormed {
                step,
                time,
                reaction,
                first: key.first,
                second: second.unwrap_or(key.first),
                aggregate_size: self.population.aggregate_size(key.first),
            },
        }
    }
}

/// First event whose cumulative rate exceeds `threshold`
///
/// Falls back to the last event with a positive rate when rounding leaves
/// the running sum just short of the threshold.
pub fn select_event<'a, I>(events: I, threshold: f64) -> Option<&'a CandidateEvent>
where
    I: IntoIterator<Item = &'a CandidateEvent>,
{
    let mut running = 0.0;
    let mut last_positive = None;
    for event in events {
        if event.rate <= 0.0 {
            continue;
        }
        running += event.rate;
        last_positive = Some(event);
        if running > threshold {
            return Some(event);
        }
    }
    last_positive
}

// ============================================================================
// Entry points
// ============================================================================

/// Validate `config`, build the rate table and run to termination
pub fn run_simulation(config: &SimulationConfig) -> Result<RunResult, SimulationError> {
    let energies = config.validate()?;
    let table = RateTable::build(config.temperature, &energies)?;
    let seed = config.seed.unwrap_or_else(RngManager::entropy_seed);
    run_with_table(config, &table, seed)
}

/// Run one replicate against a prebuilt table
pub fn run_with_table(
    config: &SimulationConfig,
    table: &RateTable,
    seed: u64,
) -> Result<RunResult, SimulationError> {
    let mut propagator = Propagator::from_config(config, table, seed)?;
    propagator.run()?;
    Ok(propagator.into_result())
}
