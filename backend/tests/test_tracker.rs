//! Event/state tracker tests
//!
//! Critical invariants tested:
//! - Propensity equals the sum of live rates after initialize and every refresh
//! - Incremental refresh yields exactly the event set a fresh enumeration would
//! - Pair events never join units of the same aggregate
//! - Shared events are removed once

use lignin_kmc_core_rs::models::unit::SiteSet;
use lignin_kmc_core_rs::propagator::{Horizon, Propagator, RunState};
use lignin_kmc_core_rs::rates::{
    ActivationEnergies, EnergyConfig, EnergyEntry, PairSize, RateKey, RateTable, RateTableError,
    SizeClass, Substrate,
};
use lignin_kmc_core_rs::tracker::{reachable_keys, DEFAULT_RESYNC_INTERVAL};
use lignin_kmc_core_rs::{
    Activation, EventKey, EventTracker, MonomerType, Population, Reaction, RngManager, Unit,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn table() -> RateTable {
    RateTable::build(298.15, &ActivationEnergies::defaults()).unwrap()
}

fn assert_propensity_consistent(tracker: &EventTracker) {
    let sum = tracker.recompute_propensity();
    if tracker.is_empty() {
        assert_eq!(tracker.propensity(), 0.0);
    } else {
        let rel = (tracker.propensity() - sum).abs() / sum;
        assert!(rel < 1e-9, "propensity {} vs recomputed {}", tracker.propensity(), sum);
    }
}

fn assert_matches_fresh(tracker: &EventTracker, population: &Population, table: &RateTable) {
    let fresh = EventTracker::initialize(population, table).unwrap();
    let incremental: Vec<_> = tracker.events().map(|e| (e.key, e.substrate, e.rate)).collect();
    let rebuilt: Vec<_> = fresh.events().map(|e| (e.key, e.substrate, e.rate)).collect();
    assert_eq!(incremental, rebuilt);
}

fn assert_intermolecular(tracker: &EventTracker, population: &Population) {
    for event in tracker.events() {
        if let Some(second) = event.key.second {
            assert!(
                !population.same_aggregate(event.key.first, second),
                "intramolecular event {:?}",
                event.key
            );
        }
    }
}

fn radicals(guaiacyl: usize, syringyl: usize, ids: &[usize]) -> Population {
    let mut population = Population::from_counts(guaiacyl, syringyl);
    for &id in ids {
        population.apply(Reaction::Ox, id, None).unwrap();
    }
    population
}

// ============================================================================
// Initialization
// ============================================================================

#[test]
fn test_initial_propensity_is_sum_of_rates() {
    let table = table();
    let population = Population::from_counts(4, 3);
    let tracker = EventTracker::initialize(&population, &table).unwrap();

    let g = table.rate(Reaction::Ox, Substrate::unit(0, SizeClass::Monomer)).unwrap();
    let s = table.rate(Reaction::Ox, Substrate::unit(1, SizeClass::Monomer)).unwrap();
    let expected = 4.0 * g + 3.0 * s;
    assert!((tracker.propensity() - expected).abs() / expected < 1e-12);
    assert_eq!(tracker.len(), 7);
}

#[test]
fn test_empty_population_has_no_events() {
    let tracker = EventTracker::initialize(&Population::from_counts(0, 0), &table()).unwrap();
    assert!(tracker.is_empty());
    assert_eq!(tracker.propensity(), 0.0);
}

#[test]
fn test_no_compatible_sites() {
    let units = vec![
        Unit::with_state(0, MonomerType::Guaiacyl, SiteSet::empty(), Activation::Radical),
        Unit::with_state(1, MonomerType::Syringyl, SiteSet::empty(), Activation::Phenol),
    ];
    let population = Population::from_units(units).unwrap();
    let tracker = EventTracker::initialize(&population, &table()).unwrap();
    assert!(tracker.is_empty());
}

#[test]
fn test_pair_events_use_ordered_flags() {
    let table = table();
    let population = radicals(1, 1, &[0, 1]);
    let tracker = EventTracker::initialize(&population, &table).unwrap();

    // G(O4) + S(C8) and S(O4) + G(C8)
    let gs = tracker.get(&EventKey::pair(Reaction::Bo4, 0, 1)).unwrap();
    let sg = tracker.get(&EventKey::pair(Reaction::Bo4, 1, 0)).unwrap();
    assert_eq!(gs.substrate, Substrate::pair([0, 1], PairSize::MonMon));
    assert_eq!(sg.substrate, Substrate::pair([1, 0], PairSize::MonMon));
    assert!((gs.rate - 1860006.627196039).abs() / gs.rate < 1e-6);
    assert!((sg.rate - 1327129.8749824178).abs() / sg.rate < 1e-6);

    // The S unit has no C5, so only G(C5) + S(C8) exists for B5
    assert!(tracker.contains(&EventKey::pair(Reaction::B5, 0, 1)));
    assert!(!tracker.contains(&EventKey::pair(Reaction::B5, 1, 0)));
    assert_eq!(tracker.events().filter(|e| e.key.reaction == Reaction::C5c5).count(), 0);
}

#[test]
fn test_symmetric_coupling_listed_once() {
    let population = radicals(3, 0, &[0, 1, 2]);
    let tracker = EventTracker::initialize(&population, &table()).unwrap();
    let bb: Vec<EventKey> = tracker
        .events()
        .filter(|e| e.key.reaction == Reaction::Bb)
        .map(|e| e.key)
        .collect();
    assert_eq!(bb.len(), 3);
    assert!(bb.iter().all(|k| k.first < k.second.unwrap()));
}

#[test]
fn test_quinone_methide_enumerates_hydration_and_ao4() {
    let table = table();
    let mut population = radicals(3, 0, &[0, 1]);
    population.apply(Reaction::Bo4, 0, Some(1)).unwrap();
    let tracker = EventTracker::initialize(&population, &table).unwrap();

    assert!(tracker.contains(&EventKey::unimolecular(Reaction::Q, 1)));
    // Unit 2 is a free phenol in another aggregate; unit 0 is in the same one
    let ao4 = tracker.get(&EventKey::pair(Reaction::Ao4, 2, 1)).unwrap();
    assert_eq!(ao4.substrate, Substrate::pair([0, 0], PairSize::MonDim));
    assert!(!tracker.contains(&EventKey::pair(Reaction::Ao4, 0, 1)));

    let q = tracker.get(&EventKey::unimolecular(Reaction::Q, 1)).unwrap();
    assert_eq!(q.substrate, Substrate::unit(0, SizeClass::Dimer));
}

#[test]
fn test_missing_rate_is_fatal() {
    let energies = EnergyConfig {
        kcal_mol: Some(vec![EnergyEntry {
            reaction: Reaction::Bo4,
            substrate: Substrate::pair([0, 0], PairSize::MonMon),
            energy: 6.3,
        }]),
        j_particle: None,
    };
    let table = RateTable::build(298.15, &energies.resolve().unwrap()).unwrap();
    let result = EventTracker::initialize(&Population::from_counts(1, 0), &table);
    assert!(matches!(result, Err(RateTableError::MissingRate(_))));
}

// ============================================================================
// Incremental refresh
// ============================================================================

#[test]
fn test_shared_event_removed_once() {
    let table = table();
    let mut population = radicals(3, 0, &[0, 1]);
    let mut tracker = EventTracker::initialize(&population, &table).unwrap();
    // BO4 x2, B5 x2, 5O4 x2, BB, 55 between the radicals, plus oxidation of unit 2
    assert_eq!(tracker.len(), 9);

    let key = EventKey::pair(Reaction::Bb, 0, 1);
    let merge = population.apply(key.reaction, key.first, key.second).unwrap();
    let summary = tracker.apply_and_refresh(&key, &population, merge.as_ref(), &table).unwrap();

    assert_eq!(summary.removed, 8);
    // Both units are free phenols again
    assert_eq!(summary.added, 2);
    assert_eq!(tracker.len(), 3);
    assert_propensity_consistent(&tracker);
    assert_matches_fresh(&tracker, &population, &table);
}

#[test]
fn test_merge_prunes_events_of_moved_units() {
    let table = table();
    // Units 0-1 form a dimer whose unit 1 is a radical; unit 2 and 3 are radical monomers
    let mut population = radicals(4, 0, &[0, 1]);
    population.apply(Reaction::Bb, 0, Some(1)).unwrap();
    population.apply(Reaction::Ox, 1, None).unwrap();
    population.apply(Reaction::Ox, 2, None).unwrap();
    population.apply(Reaction::Ox, 3, None).unwrap();
    let mut tracker = EventTracker::initialize(&population, &table).unwrap();
    assert!(tracker.contains(&EventKey::pair(Reaction::C5c5, 1, 2)));

    // Couple 2 and 3; afterwards no event may pair 2 or 3 with each other
    let key = EventKey::pair(Reaction::C5o4, 2, 3);
    let merge = population.apply(key.reaction, key.first, key.second).unwrap();
    tracker.apply_and_refresh(&key, &population, merge.as_ref(), &table).unwrap();
    assert_intermolecular(&tracker, &population);
    assert_matches_fresh(&tracker, &population, &table);

    // Unit 1 is the only radical left and has no partner
    assert!(tracker.events_for_unit(1).is_empty());
    assert!(tracker.contains(&EventKey::unimolecular(Reaction::Ox, 3)));
    assert!(!tracker.contains(&EventKey::unimolecular(Reaction::Ox, 2)));
}

#[test]
fn test_refresh_tracks_full_run() {
    let table = table();
    let population = Population::from_counts(14, 10);
    let mut propagator = Propagator::new(
        population,
        &table,
        RngManager::new(2024),
        2024,
        Horizon::events(300),
        DEFAULT_RESYNC_INTERVAL,
    )
    .unwrap();

    while propagator.step().unwrap() == RunState::Running {
        assert_propensity_consistent(propagator.tracker());
        assert_intermolecular(propagator.tracker(), propagator.population());
        assert_matches_fresh(propagator.tracker(), propagator.population(), &table);
    }
    assert!(propagator.events_applied() > 0);
}

#[test]
fn test_resync_every_refresh_matches_fresh_enumeration() {
    let table = table();
    let mut propagator = Propagator::new(
        Population::from_counts(8, 8),
        &table,
        RngManager::new(77),
        77,
        Horizon::events(100),
        1,
    )
    .unwrap();

    while propagator.step().unwrap() == RunState::Running {
        let tracker = propagator.tracker();
        let (propensity, peak, refreshes) = tracker.bookkeeping();
        assert_eq!(refreshes, 0);
        assert!(peak >= propensity);
        assert_eq!(propensity, tracker.recompute_propensity());
    }
    assert_matches_fresh(propagator.tracker(), propagator.population(), &table);
}

#[test]
fn test_full_run_stays_within_reachable_keys() {
    let table = table();
    let reachable = reachable_keys([10, 6]);
    let mut propagator = Propagator::new(
        Population::from_counts(10, 6),
        &table,
        RngManager::new(2024),
        2024,
        Horizon::default(),
        DEFAULT_RESYNC_INTERVAL,
    )
    .unwrap();

    loop {
        for event in propagator.tracker().events() {
            let key = RateKey::new(event.key.reaction, event.substrate);
            assert!(reachable.contains(&key), "{key} was not predicted");
        }
        if propagator.step().unwrap() != RunState::Running {
            break;
        }
    }
    assert_eq!(propagator.state(), RunState::TerminatedNoEvents);
}
