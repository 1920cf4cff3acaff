//! Snapshot and resume tests
//!
//! Critical invariants tested:
//! - A resumed run continues exactly like the uninterrupted one
//! - Snapshots only resume under the configuration they were taken with
//! - Corrupt snapshots are rejected before any event fires

use lignin_kmc_core_rs::models::population::Bond;
use lignin_kmc_core_rs::propagator::snapshot::validate_snapshot;
use lignin_kmc_core_rs::propagator::{compute_config_hash, StateSnapshot};
use lignin_kmc_core_rs::rates::RateTable;
use lignin_kmc_core_rs::{
    MonomerSpec, Propagator, Reaction, RunState, SimulationConfig, SimulationError,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn config(seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::new(MonomerSpec::Counts {
        guaiacyl: 15,
        syringyl: 10,
    });
    config.seed = Some(seed);
    config.max_events = Some(400);
    config
}

fn table(config: &SimulationConfig) -> RateTable {
    RateTable::build(config.temperature, &config.validate().unwrap()).unwrap()
}

/// Run `steps` events from the start and snapshot
fn snapshot_after(config: &SimulationConfig, table: &RateTable, steps: usize) -> StateSnapshot {
    let mut propagator = Propagator::from_config(config, table, config.seed.unwrap()).unwrap();
    for _ in 0..steps {
        propagator.step().unwrap();
    }
    propagator.snapshot(config).unwrap()
}

// ============================================================================
// Resume determinism
// ============================================================================

#[test]
fn test_resume_matches_uninterrupted_run() {
    let mut config = SimulationConfig::new(MonomerSpec::Counts {
        guaiacyl: 30,
        syringyl: 20,
    });
    config.seed = Some(4242);
    config.max_events = Some(400);
    let table = table(&config);

    let mut full = Propagator::from_config(&config, &table, 4242).unwrap();
    full.run().unwrap();
    let full = full.into_result();
    // Every unit oxidizes at least once
    assert!(full.events_applied >= 50);

    for split in [1, 17, 45] {
        let snapshot = snapshot_after(&config, &table, split);
        assert_eq!(snapshot.events_applied, split);

        let mut resumed = Propagator::resume(&config, &table, snapshot).unwrap();
        resumed.run().unwrap();
        let resumed = resumed.into_result();

        assert_eq!(resumed.state, full.state);
        assert_eq!(resumed.events_applied, full.events_applied);
        assert_eq!(resumed.time, full.time);
        assert_eq!(resumed.trace.events(), &full.trace.events()[split..]);
        assert_eq!(resumed.population.units(), full.population.units());
        assert_eq!(resumed.population.bonds(), full.population.bonds());
    }
}

#[test]
fn test_resume_of_terminated_run_stays_terminated() {
    let mut config = config(7);
    config.max_events = Some(10);
    let table = table(&config);

    let snapshot = snapshot_after(&config, &table, 10);
    let mut resumed = Propagator::resume(&config, &table, snapshot).unwrap();
    assert_eq!(resumed.run().unwrap(), RunState::TerminatedEventLimit);
    assert_eq!(resumed.events_applied(), 10);
    assert!(resumed.trace().is_empty());
}

#[test]
fn test_snapshot_json_round_trip() {
    let config = config(99);
    let table = table(&config);
    let snapshot = snapshot_after(&config, &table, 120);

    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: StateSnapshot = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.population, snapshot.population);
    assert_eq!(restored.rng_state, snapshot.rng_state);
    assert_eq!(restored.events_applied, snapshot.events_applied);
    assert_eq!(restored.config_hash, snapshot.config_hash);
    assert!(Propagator::resume(&config, &table, restored).is_ok());
}

// ============================================================================
// Config matching
// ============================================================================

#[test]
fn test_config_mismatch_rejected() {
    let config = config(1);
    let table = table(&config);
    let snapshot = snapshot_after(&config, &table, 5);

    let mut other = config.clone();
    other.temperature = 310.0;
    match Propagator::resume(&other, &table, snapshot) {
        Err(SimulationError::ConfigMismatch { expected, found }) => {
            assert_eq!(expected, other.fingerprint().unwrap());
            assert_eq!(found, config.fingerprint().unwrap());
        }
        result => panic!("expected config mismatch, got {:?}", result.map(|p| p.events_applied())),
    }
}

#[test]
fn test_config_hash_is_stable() {
    let config = config(1);
    let hash = compute_config_hash(&config).unwrap();
    assert_eq!(hash.len(), 64);
    assert_eq!(hash, config.clone().fingerprint().unwrap());

    let json = serde_json::to_string(&config).unwrap();
    let parsed = SimulationConfig::from_json(&json).unwrap();
    assert_eq!(parsed.fingerprint().unwrap(), hash);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_unit_count_mismatch_rejected() {
    let config = config(2);
    let table = table(&config);
    let snapshot = snapshot_after(&config, &table, 20);
    let result = validate_snapshot(&snapshot, 24);
    assert!(matches!(result, Err(SimulationError::StateValidation(_))));
}

#[test]
fn test_negative_time_rejected() {
    let config = config(2);
    let table = table(&config);
    let mut snapshot = snapshot_after(&config, &table, 20);
    snapshot.time = -1.0;
    assert!(matches!(
        validate_snapshot(&snapshot, 25),
        Err(SimulationError::StateValidation(_))
    ));
}

#[test]
fn test_bad_bonds_rejected() {
    let config = config(2);
    let table = table(&config);
    let base = snapshot_after(&config, &table, 0);
    assert!(validate_snapshot(&base, 25).is_ok());

    let mut self_bond = base.clone();
    self_bond.population.bonds.push(Bond {
        reaction: Reaction::Bb,
        first: 3,
        second: 3,
    });
    assert!(matches!(
        validate_snapshot(&self_bond, 25),
        Err(SimulationError::StateValidation(_))
    ));

    let mut repeated = base.clone();
    for (first, second) in [(0, 1), (1, 0)] {
        repeated.population.bonds.push(Bond {
            reaction: Reaction::Bo4,
            first,
            second,
        });
    }
    repeated.population.units[1].aggregate = 0;
    assert!(matches!(
        validate_snapshot(&repeated, 25),
        Err(SimulationError::StateValidation(_))
    ));

    let mut unknown = base;
    unknown.population.bonds.push(Bond {
        reaction: Reaction::B5,
        first: 0,
        second: 99,
    });
    assert!(matches!(
        validate_snapshot(&unknown, 25),
        Err(SimulationError::Population(_))
    ));
}

#[test]
fn test_inconsistent_aggregate_label_rejected() {
    let config = config(2);
    let table = table(&config);
    let mut snapshot = snapshot_after(&config, &table, 0);
    snapshot.population.units[4].aggregate = 5;
    assert!(matches!(
        validate_snapshot(&snapshot, 25),
        Err(SimulationError::StateValidation(_))
    ));
    snapshot.population.units[4].aggregate = 1000;
    assert!(validate_snapshot(&snapshot, 25).is_err());
}
