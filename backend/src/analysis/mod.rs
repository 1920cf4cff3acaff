//! Outcome aggregation
//!
//! Summarizes a final population: what each aggregate contains, how the
//! aggregate sizes are distributed and which bond types formed. Nothing here
//! mutates the population.
//!
//! # Example
//!
//! ```rust
//! use lignin_kmc_core_rs::analysis::summarize;
//! use lignin_kmc_core_rs::models::population::Population;
//! use lignin_kmc_core_rs::models::reaction::Reaction;
//!
//! let mut population = Population::from_counts(3, 0);
//! for id in 0..3 {
//!     population.apply(Reaction::Ox, id, None).unwrap();
//! }
//! population.apply(Reaction::Bb, 0, Some(1)).unwrap();
//!
//! let summary = summarize(&population);
//! assert_eq!(summary.aggregate_count, 2);
//! assert_eq!(summary.size_distribution[&1], 1);
//! assert_eq!(summary.size_distribution[&2], 1);
//! assert_eq!(summary.bond_counts[&Reaction::Bb], 1);
//! ```

use crate::models::population::Population;
use crate::models::reaction::Reaction;
use crate::models::unit::MonomerType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Units bonded to at least this many neighbours count as branch points
pub const BRANCH_DEGREE: usize = 3;

/// Contents of one aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Aggregate root (smallest stable identifier available)
    pub root: usize,
    pub size: usize,
    pub guaiacyl: usize,
    pub syringyl: usize,
    /// Bonds inside the aggregate by type; only types that occur
    pub bonds: BTreeMap<Reaction, usize>,
    pub branch_points: usize,
}

/// Population-wide outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub unit_count: usize,
    pub aggregate_count: usize,
    /// Per aggregate, ordered by root
    pub aggregates: Vec<AggregateSummary>,
    /// Aggregate size → number of aggregates of that size
    pub size_distribution: BTreeMap<usize, usize>,
    /// Every bond type, including those that never formed
    pub bond_counts: BTreeMap<Reaction, usize>,
    /// Share of all formed bonds; zero when no bond formed
    pub bond_fractions: BTreeMap<Reaction, f64>,
    /// Fraction of units that are branch points
    pub branching_coefficient: f64,
    pub number_average_dp: f64,
    pub weight_average_dp: f64,
    pub largest_aggregate: usize,
}

impl OutcomeSummary {
    pub fn total_bonds(&self) -> usize {
        self.bond_counts.values().sum()
    }

    /// Number of aggregates with more than one unit
    pub fn oligomer_count(&self) -> usize {
        self.size_distribution
            .iter()
            .filter(|(&size, _)| size > 1)
            .map(|(_, &count)| count)
            .sum()
    }
}

/// Bond counts for all seven bond types
pub fn bond_counts(population: &Population) -> BTreeMap<Reaction, usize> {
    let mut counts: BTreeMap<Reaction, usize> = Reaction::ALL
        .into_iter()
        .filter(|r| r.is_bond())
        .map(|r| (r, 0))
        .collect();
    for bond in population.bonds() {
        *counts.entry(bond.reaction).or_insert(0) += 1;
    }
    counts
}

/// Aggregate size → frequency
pub fn size_distribution(population: &Population) -> BTreeMap<usize, usize> {
    let mut distribution = BTreeMap::new();
    for root in population.roots() {
        *distribution.entry(population.members(root).len()).or_insert(0) += 1;
    }
    distribution
}

/// Bonds per unit
pub fn unit_degrees(population: &Population) -> Vec<usize> {
    let mut degrees = vec![0; population.len()];
    for bond in population.bonds() {
        degrees[bond.first] += 1;
        degrees[bond.second] += 1;
    }
    degrees
}

/// Full outcome summary of `population`
pub fn summarize(population: &Population) -> OutcomeSummary {
    let degrees = unit_degrees(population);

    let mut per_aggregate: BTreeMap<usize, BTreeMap<Reaction, usize>> = BTreeMap::new();
    for bond in population.bonds() {
        *per_aggregate
            .entry(population.aggregate_of(bond.first))
            .or_default()
            .entry(bond.reaction)
            .or_insert(0) += 1;
    }

    let mut aggregates: Vec<AggregateSummary> = population
        .roots()
        .map(|root| {
            let members = population.members(root);
            let syringyl = members
                .iter()
                .filter(|&&id| population.units()[id].monomer() == MonomerType::Syringyl)
                .count();
            AggregateSummary {
                root,
                size: members.len(),
                guaiacyl: members.len() - syringyl,
                syringyl,
                bonds: per_aggregate.remove(&root).unwrap_or_default(),
                branch_points: members.iter().filter(|&&id| degrees[id] >= BRANCH_DEGREE).count(),
            }
        })
        .collect();
    aggregates.sort_by_key(|a| a.root);

    let counts = bond_counts(population);
    let total_bonds: usize = counts.values().sum();
    let bond_fractions = counts
        .iter()
        .map(|(&reaction, &count)| {
            let fraction = if total_bonds == 0 {
                0.0
            } else {
                count as f64 / total_bonds as f64
            };
            (reaction, fraction)
        })
        .collect();

    let unit_count = population.len();
    let aggregate_count = aggregates.len();
    let branch_points: usize = aggregates.iter().map(|a| a.branch_points).sum();
    let sum_squares: usize = aggregates.iter().map(|a| a.size * a.size).sum();

    OutcomeSummary {
        unit_count,
        aggregate_count,
        size_distribution: size_distribution(population),
        bond_counts: counts,
        bond_fractions,
        branching_coefficient: ratio(branch_points, unit_count),
        number_average_dp: ratio(unit_count, aggregate_count),
        weight_average_dp: ratio(sum_squares, unit_count),
        largest_aggregate: aggregates.iter().map(|a| a.size).max().unwrap_or(0),
        aggregates,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
