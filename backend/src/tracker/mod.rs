//! Event/state tracker
//!
//! Maintains the set of candidate events for the current population and
//! their total propensity. After the propagator applies an event, only the
//! events touching the participants are rebuilt, so a step costs time
//! proportional to the participants' neighbourhoods rather than a full
//! re-enumeration.
//!
//! # Indexes
//!
//! - `events`: key → candidate, in deterministic scan order
//! - `by_unit`: unit → keys of every live event it participates in
//! - `radicals`, `free_phenols`, `quinone_methides`: units by state, so
//!   partner search only visits units that can actually react
//!
//! # Critical Invariants
//!
//! 1. `propensity` equals the sum of live rates (exactly 0 when empty)
//! 2. Every live key is listed in `by_unit` of each of its participants
//! 3. Pair events never join two units of the same aggregate

pub mod candidate;

pub use candidate::{CandidateEvent, EventKey};

use crate::models::population::{Merge, Population};
use crate::models::reaction::Reaction;
use crate::models::unit::{Activation, MonomerType, Site, Unit};
use crate::rates::key::{PairSize, RateKey, SizeClass, Substrate};
use crate::rates::table::{RateTable, RateTableError};
use std::collections::{BTreeMap, BTreeSet};

/// Refreshes between full propensity recomputations
pub const DEFAULT_RESYNC_INTERVAL: usize = 1000;

/// Recompute when the running sum has fallen this far below its peak,
/// since the subtractions that got it there carry the peak's rounding error
const CANCELLATION_FRACTION: f64 = 1e-3;

/// Counts reported by one incremental refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshSummary {
    pub added: usize,
    pub removed: usize,
    pub propensity: f64,
}

/// Live candidate events and their propensity sum
#[derive(Debug, Clone)]
pub struct EventTracker {
    events: BTreeMap<EventKey, CandidateEvent>,
    by_unit: Vec<BTreeSet<EventKey>>,
    radicals: BTreeSet<usize>,
    free_phenols: BTreeSet<usize>,
    quinone_methides: BTreeSet<usize>,
    propensity: f64,
    /// Largest running propensity since the last resync
    peak: f64,
    refreshes_since_resync: usize,
    resync_interval: usize,
}

impl EventTracker {
    /// Enumerate every candidate event of `population`
    pub fn initialize(population: &Population, table: &RateTable) -> Result<Self, RateTableError> {
        Self::with_resync_interval(population, table, DEFAULT_RESYNC_INTERVAL)
    }

    pub fn with_resync_interval(
        population: &Population,
        table: &RateTable,
        resync_interval: usize,
    ) -> Result<Self, RateTableError> {
        let mut tracker = Self {
            events: BTreeMap::new(),
            by_unit: vec![BTreeSet::new(); population.len()],
            radicals: BTreeSet::new(),
            free_phenols: BTreeSet::new(),
            quinone_methides: BTreeSet::new(),
            propensity: 0.0,
            peak: 0.0,
            refreshes_since_resync: 0,
            resync_interval: resync_interval.max(1),
        };

        for unit in population.units() {
            tracker.index_unit(unit);
        }
        for id in 0..population.len() {
            tracker.enumerate_for_unit(id, population, table)?;
        }
        tracker.resync();

        log::debug!(
            "Tracker initialized: {} units, {} candidate events, propensity {:e}",
            population.len(),
            tracker.events.len(),
            tracker.propensity
        );
        Ok(tracker)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Running propensity sum
    pub fn propensity(&self) -> f64 {
        self.propensity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Live events in scan order
    pub fn events(&self) -> impl Iterator<Item = &CandidateEvent> {
        self.events.values()
    }

    pub fn get(&self, key: &EventKey) -> Option<&CandidateEvent> {
        self.events.get(key)
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.events.contains_key(key)
    }

    /// Events in which `unit` participates
    pub fn events_for_unit(&self, unit: usize) -> Vec<&CandidateEvent> {
        self.by_unit
            .get(unit)
            .into_iter()
            .flatten()
            .filter_map(|key| self.events.get(key))
            .collect()
    }

    /// Running propensity, its peak and refreshes since the last resync
    pub fn bookkeeping(&self) -> (f64, f64, usize) {
        (self.propensity, self.peak, self.refreshes_since_resync)
    }

    /// Reinstate bookkeeping saved from an identical event set
    pub(crate) fn restore_bookkeeping(
        &mut self,
        propensity: f64,
        peak: f64,
        refreshes_since_resync: usize,
    ) {
        if self.events.is_empty() {
            return;
        }
        self.propensity = propensity;
        self.peak = peak.max(propensity);
        self.refreshes_since_resync = refreshes_since_resync;
    }

    /// Sum of live rates computed from scratch in scan order
    pub fn recompute_propensity(&self) -> f64 {
        self.events.values().map(|e| e.rate).sum()
    }

    // ========================================================================
    // Incremental update
    // ========================================================================

    /// Bring the event set up to date after `fired` was applied to `population`
    ///
    /// `merge` is the aggregate merge produced by a bond-forming event.
    pub fn apply_and_refresh(
        &mut self,
        fired: &EventKey,
        population: &Population,
        merge: Option<&Merge>,
        table: &RateTable,
    ) -> Result<RefreshSummary, RateTableError> {
        let mut removed = 0;
        for unit in fired.units() {
            removed += self.remove_events_of(unit);
        }
        if let Some(merge) = merge {
            removed += self.prune_intra_aggregate(merge, population);
        }

        for unit in fired.units() {
            self.reindex_unit(&population.units()[unit]);
        }

        let mut added = 0;
        for unit in fired.units() {
            added += self.enumerate_for_unit(unit, population, table)?;
        }

        self.refreshes_since_resync += 1;
        self.maybe_resync();

        Ok(RefreshSummary {
            added,
            removed,
            propensity: self.propensity,
        })
    }

    /// Drop every event referencing `unit`; each event is removed once
    fn remove_events_of(&mut self, unit: usize) -> usize {
        let keys = std::mem::take(&mut self.by_unit[unit]);
        keys.into_iter().filter(|key| self.remove(key)).count()
    }

    /// Drop pair events whose participants now share an aggregate
    fn prune_intra_aggregate(&mut self, merge: &Merge, population: &Population) -> usize {
        let mut removed = 0;
        for &unit in &merge.moved {
            let stale: Vec<EventKey> = self.by_unit[unit]
                .iter()
                .filter(|key| {
                    key.partner_of(unit)
                        .map_or(false, |partner| population.same_aggregate(unit, partner))
                })
                .copied()
                .collect();
            for key in stale {
                if self.remove(&key) {
                    removed += 1;
                }
            }
        }
        removed
    }

    fn remove(&mut self, key: &EventKey) -> bool {
        match self.events.remove(key) {
            Some(event) => {
                for unit in key.units() {
                    self.by_unit[unit].remove(key);
                }
                self.propensity -= event.rate;
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Enumeration
    // ========================================================================

    /// Add every candidate event that `id` can take part in; returns how many were new
    fn enumerate_for_unit(
        &mut self,
        id: usize,
        population: &Population,
        table: &RateTable,
    ) -> Result<usize, RateTableError> {
        let unit = &population.units()[id];
        let mut added = 0;

        match unit.activation() {
            Activation::Phenol => {
                if unit.is_free_phenol() {
                    let oxidation = EventKey::unimolecular(Reaction::Ox, id);
                    added += self.offer(oxidation, population, table)?;
                    for qm in self.partners(&self.quinone_methides, id, population) {
                        if population.units()[qm].is_open(Site::C7) {
                            let key = EventKey::pair(Reaction::Ao4, id, qm);
                            added += self.offer(key, population, table)?;
                        }
                    }
                }
            }
            Activation::QuinoneMethide => {
                added += self.offer(EventKey::unimolecular(Reaction::Q, id), population, table)?;
                if unit.is_open(Site::C7) {
                    for phenol in self.partners(&self.free_phenols, id, population) {
                        let key = EventKey::pair(Reaction::Ao4, phenol, id);
                        added += self.offer(key, population, table)?;
                    }
                }
            }
            Activation::Radical => {
                for other in self.partners(&self.radicals, id, population) {
                    let partner = &population.units()[other];
                    for reaction in Reaction::RADICAL_COUPLINGS {
                        for (first, second) in coupling_orientations(reaction, unit, partner) {
                            let key = EventKey::pair(reaction, first, second);
                            added += self.offer(key, population, table)?;
                        }
                    }
                }
            }
        }
        Ok(added)
    }

    /// Units of `pool` outside `id`'s aggregate
    fn partners(&self, pool: &BTreeSet<usize>, id: usize, population: &Population) -> Vec<usize> {
        pool.iter()
            .copied()
            .filter(|&other| other != id && !population.same_aggregate(id, other))
            .collect()
    }

    /// Insert `key` unless it is already live
    fn offer(
        &mut self,
        key: EventKey,
        population: &Population,
        table: &RateTable,
    ) -> Result<usize, RateTableError> {
        if self.events.contains_key(&key) {
            return Ok(0);
        }
        let substrate = substrate_of(&key, population);
        let rate = table.rate(key.reaction, substrate)?;

        self.events.insert(
            key,
            CandidateEvent {
                key,
                substrate,
                rate,
            },
        );
        for unit in key.units() {
            self.by_unit[unit].insert(key);
        }
        self.propensity += rate;
        self.peak = self.peak.max(self.propensity);
        Ok(1)
    }

    fn index_unit(&mut self, unit: &Unit) {
        match unit.activation() {
            Activation::Radical => {
                self.radicals.insert(unit.id());
            }
            Activation::QuinoneMethide => {
                self.quinone_methides.insert(unit.id());
            }
            Activation::Phenol if unit.is_free_phenol() => {
                self.free_phenols.insert(unit.id());
            }
            Activation::Phenol => {}
        }
    }

    fn reindex_unit(&mut self, unit: &Unit) {
        self.radicals.remove(&unit.id());
        self.quinone_methides.remove(&unit.id());
        self.free_phenols.remove(&unit.id());
        self.index_unit(unit);
    }

    // ========================================================================
    // Propensity bookkeeping
    // ========================================================================

    fn maybe_resync(&mut self) {
        if self.events.is_empty() {
            self.propensity = 0.0;
            self.peak = 0.0;
            self.refreshes_since_resync = 0;
            return;
        }
        if self.refreshes_since_resync >= self.resync_interval
            || self.propensity < self.peak * CANCELLATION_FRACTION
        {
            self.resync();
        }
    }

    fn resync(&mut self) {
        let recomputed = self.recompute_propensity();
        if (recomputed - self.propensity).abs() > 1e-9 * recomputed.abs() {
            log::debug!(
                "Propensity resync corrected drift: {:e} -> {:e}",
                self.propensity,
                recomputed
            );
        }
        self.propensity = recomputed;
        self.peak = recomputed;
        self.refreshes_since_resync = 0;
    }
}

/// Orientations `(first, second)` in which two radicals can undergo `reaction`
fn coupling_orientations(reaction: Reaction, a: &Unit, b: &Unit) -> Vec<(usize, usize)> {
    let Some((site_first, site_second)) = reaction.bond_sites() else {
        return Vec::new();
    };
    let mut orientations = Vec::with_capacity(2);
    if a.is_open(site_first) && b.is_open(site_second) {
        orientations.push((a.id(), b.id()));
    }
    if !reaction.is_symmetric() && b.is_open(site_first) && a.is_open(site_second) {
        orientations.push((b.id(), a.id()));
    }
    orientations
}

/// Substrate descriptor of an event in the current population
pub fn substrate_of(key: &EventKey, population: &Population) -> Substrate {
    let flag = |id: usize| population.units()[id].monomer().regio_flag();
    let size = |id: usize| SizeClass::of(population.aggregate_size(id));
    match key.second {
        None => Substrate::unit(flag(key.first), size(key.first)),
        Some(second) => Substrate::pair(
            [flag(key.first), flag(second)],
            PairSize::from_classes(size(key.first), size(second)),
        ),
    }
}

/// Every rate-table key a population can request during a run
///
/// `flag_counts` bounds how many guaiacyl and syringyl units the population
/// holds. C5 exists only on guaiacyl units; C1 and C7 only open once a unit
/// has bonded, so they appear on oligomer units only. A key is reachable when
/// the population has enough units of the right types to realise it.
pub fn reachable_keys(flag_counts: [usize; 2]) -> BTreeSet<RateKey> {
    let total = flag_counts[0] + flag_counts[1];
    let mut keys = BTreeSet::new();

    for (reaction, site) in [(Reaction::Ox, Site::O4), (Reaction::Q, Site::C7)] {
        for (flag, size) in site_hosts(site, flag_counts) {
            if units_needed(size) <= total {
                keys.insert(RateKey::new(reaction, Substrate::unit(flag, size)));
            }
        }
    }

    for reaction in Reaction::ALL {
        let Some((site_first, site_second)) = reaction.bond_sites() else {
            continue;
        };
        for (flag_a, size_a) in site_hosts(site_first, flag_counts) {
            for (flag_b, size_b) in site_hosts(site_second, flag_counts) {
                let same_flag_units = if flag_a == flag_b { 2 } else { 1 };
                if units_needed(size_a) + units_needed(size_b) <= total
                    && flag_counts[usize::from(flag_a)] >= same_flag_units
                {
                    let sizes = PairSize::from_classes(size_a, size_b);
                    keys.insert(RateKey::new(reaction, Substrate::pair([flag_a, flag_b], sizes)));
                }
            }
        }
    }
    keys
}

/// (flag, size class) combinations whose units can have `site` open
fn site_hosts(site: Site, flag_counts: [usize; 2]) -> Vec<(u8, SizeClass)> {
    let opened_by_bonding = matches!(site, Site::C1 | Site::C7);
    let sizes: &[SizeClass] = if opened_by_bonding {
        &[SizeClass::Dimer]
    } else {
        &[SizeClass::Monomer, SizeClass::Dimer]
    };
    [MonomerType::Guaiacyl, MonomerType::Syringyl]
        .into_iter()
        .filter(|monomer| flag_counts[usize::from(monomer.regio_flag())] > 0)
        .filter(|monomer| opened_by_bonding || monomer.initial_sites().contains(site))
        .flat_map(|monomer| sizes.iter().map(move |&size| (monomer.regio_flag(), size)))
        .collect()
}

/// Smallest number of units that puts one unit in an aggregate of class `size`
fn units_needed(size: SizeClass) -> usize {
    match size {
        SizeClass::Monomer => 1,
        SizeClass::Dimer => 2,
    }
}
