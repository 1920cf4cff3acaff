//! KMC propagator - main simulation loop
//!
//! See `engine.rs` for the Gillespie loop and `snapshot.rs` for save/resume.

pub mod engine;
pub mod snapshot;

pub use engine::{
    run_simulation, run_with_table, select_event, Horizon, Propagator, RunResult, RunState,
    SimulationError,
};
pub use snapshot::{
    compute_config_hash, PopulationSnapshot, PropensitySnapshot, StateSnapshot, UnitSnapshot,
};
