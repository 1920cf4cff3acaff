//! Population of units and aggregates
//!
//! Units live in a dense arena addressed by index. Aggregate membership is a
//! union-find mapping from unit index to the aggregate root, kept flat: every
//! unit points directly at its root, and a merge relabels the members of the
//! smaller aggregate. Lookups are O(1) through `&self`, merges are amortized
//! O(log n) per unit over a run.
//!
//! # Critical Invariants
//!
//! 1. **Conservation**: the member lists of all roots partition `0..len()`
//! 2. **Flat roots**: `root[u]` is always a root, and `root[r] == r` for roots
//! 3. **No splits**: aggregates only ever merge

use crate::models::reaction::Reaction;
use crate::models::unit::{Activation, MonomerType, Site, Unit};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a reaction is applied to units that cannot undergo it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PopulationError {
    #[error("Unit {0} does not exist")]
    UnknownUnit(usize),

    #[error("Reaction {0} needs {1} participant(s)")]
    WrongArity(Reaction, usize),

    #[error("Site {site} of unit {unit} is not open")]
    SiteClosed { unit: usize, site: Site },

    #[error("Unit {unit} is {found:?}, {reaction} requires {expected:?}")]
    WrongActivation {
        unit: usize,
        reaction: Reaction,
        expected: Activation,
        found: Activation,
    },

    #[error("Units {0} and {1} already belong to the same aggregate")]
    SameAggregate(usize, usize),

    #[error("Unit ids must match arena positions: unit at {position} has id {id}")]
    IdMismatch { position: usize, id: usize },
}

/// A formed inter-unit bond
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    pub reaction: Reaction,
    pub first: usize,
    pub second: usize,
}

/// Bookkeeping of one aggregate merge, consumed by the event tracker
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    /// Root that survives the merge
    pub surviving: usize,
    /// Root that was folded into `surviving`
    pub absorbed: usize,
    /// Units relabeled from `absorbed` to `surviving`
    pub moved: Vec<usize>,
}

/// All units, their aggregate membership and the bonds between them
#[derive(Debug, Clone)]
pub struct Population {
    units: Vec<Unit>,
    /// Unit index → aggregate root
    root: Vec<usize>,
    /// Root → member unit indices (empty for non-roots)
    members: Vec<Vec<usize>>,
    /// Bonds in formation order
    bonds: Vec<Bond>,
}

impl Population {
    /// Build a population of unreacted monomers in the given order
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::models::population::Population;
    /// use lignin_kmc_core_rs::models::unit::MonomerType;
    ///
    /// let population = Population::from_monomers(&[MonomerType::Guaiacyl, MonomerType::Syringyl]);
    /// assert_eq!(population.len(), 2);
    /// assert_eq!(population.aggregate_count(), 2);
    /// ```
    pub fn from_monomers(monomers: &[MonomerType]) -> Self {
        let units = monomers
            .iter()
            .enumerate()
            .map(|(id, &monomer)| Unit::new(id, monomer))
            .collect();
        Self::singletons(units)
    }

    /// Guaiacyl units first, then syringyl units
    pub fn from_counts(guaiacyl: usize, syringyl: usize) -> Self {
        let monomers: Vec<MonomerType> = std::iter::repeat(MonomerType::Guaiacyl)
            .take(guaiacyl)
            .chain(std::iter::repeat(MonomerType::Syringyl).take(syringyl))
            .collect();
        Self::from_monomers(&monomers)
    }

    /// Draw `count` monomers, each syringyl with probability `sg / (1 + sg)`
    pub fn from_sg_ratio(sg_ratio: f64, count: usize, rng: &mut RngManager) -> Self {
        let p_syringyl = sg_ratio / (1.0 + sg_ratio);
        let monomers: Vec<MonomerType> = (0..count)
            .map(|_| {
                if rng.next_f64() < p_syringyl {
                    MonomerType::Syringyl
                } else {
                    MonomerType::Guaiacyl
                }
            })
            .collect();
        Self::from_monomers(&monomers)
    }

    /// Build from units in arbitrary states; every unit starts as its own aggregate
    ///
    /// Unit ids must equal their position in `units`.
    pub fn from_units(units: Vec<Unit>) -> Result<Self, PopulationError> {
        if let Some((position, unit)) = units.iter().enumerate().find(|(i, u)| u.id() != *i) {
            return Err(PopulationError::IdMismatch {
                position,
                id: unit.id(),
            });
        }
        Ok(Self::singletons(units))
    }

    /// Rebuild a population from units and an existing bond list
    pub fn from_parts(units: Vec<Unit>, bonds: Vec<Bond>) -> Result<Self, PopulationError> {
        let mut population = Self::from_units(units)?;
        for bond in bonds {
            population.check_unit(bond.first)?;
            population.check_unit(bond.second)?;
            if population.root[bond.first] != population.root[bond.second] {
                population.merge(bond.first, bond.second);
            }
            population.bonds.push(bond);
        }
        Ok(population)
    }

    fn singletons(mut units: Vec<Unit>) -> Self {
        for (i, unit) in units.iter_mut().enumerate() {
            unit.set_id(i);
        }
        let n = units.len();
        Self {
            units,
            root: (0..n).collect(),
            members: (0..n).map(|i| vec![i]).collect(),
            bonds: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: usize) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Aggregate root of a unit
    ///
    /// # Panics
    /// Panics if `id` is out of range
    pub fn aggregate_of(&self, id: usize) -> usize {
        self.root[id]
    }

    pub fn same_aggregate(&self, a: usize, b: usize) -> bool {
        self.root[a] == self.root[b]
    }

    /// Number of units in the aggregate containing `id`
    pub fn aggregate_size(&self, id: usize) -> usize {
        self.members[self.root[id]].len()
    }

    /// Members of the aggregate rooted at `root` (empty if `root` is not a root)
    pub fn members(&self, root: usize) -> &[usize] {
        &self.members[root]
    }

    /// Aggregate roots in ascending order
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.units.len()).filter(move |&i| self.root[i] == i)
    }

    pub fn aggregate_count(&self) -> usize {
        self.roots().count()
    }

    /// Sum of aggregate sizes; equals `len()` at all times
    pub fn total_units_in_aggregates(&self) -> usize {
        self.roots().map(|r| self.members[r].len()).sum()
    }

    // ========================================================================
    // Reactions
    // ========================================================================

    /// Apply a reaction's structural effect
    ///
    /// Returns the merge bookkeeping for bond-forming reactions.
    ///
    /// # Errors
    ///
    /// Fails without mutating anything if the participants are not eligible.
    pub fn apply(
        &mut self,
        reaction: Reaction,
        first: usize,
        second: Option<usize>,
    ) -> Result<Option<Merge>, PopulationError> {
        self.check_unit(first)?;
        match (reaction.bond_sites(), second) {
            (None, None) => {
                self.apply_unimolecular(reaction, first)?;
                Ok(None)
            }
            (Some((site_a, site_b)), Some(second)) => {
                self.check_unit(second)?;
                self.apply_coupling(reaction, first, second, site_a, site_b)
                    .map(Some)
            }
            (None, Some(_)) => Err(PopulationError::WrongArity(reaction, 1)),
            (Some(_), None) => Err(PopulationError::WrongArity(reaction, 2)),
        }
    }

    fn apply_unimolecular(&mut self, reaction: Reaction, id: usize) -> Result<(), PopulationError> {
        match reaction {
            Reaction::Ox => {
                self.require_activation(reaction, id, Activation::Phenol)?;
                self.require_open(id, Site::O4)?;
                self.units[id].set_activation(Activation::Radical);
            }
            Reaction::Q => {
                self.require_activation(reaction, id, Activation::QuinoneMethide)?;
                self.require_open(id, Site::C7)?;
                let unit = &mut self.units[id];
                unit.close_site(Site::C7);
                unit.set_activation(Activation::Phenol);
            }
            _ => return Err(PopulationError::WrongArity(reaction, 2)),
        }
        Ok(())
    }

    fn apply_coupling(
        &mut self,
        reaction: Reaction,
        first: usize,
        second: usize,
        site_a: Site,
        site_b: Site,
    ) -> Result<Merge, PopulationError> {
        if self.same_aggregate(first, second) {
            return Err(PopulationError::SameAggregate(first, second));
        }
        if reaction == Reaction::Ao4 {
            self.require_activation(reaction, first, Activation::Phenol)?;
            self.require_activation(reaction, second, Activation::QuinoneMethide)?;
        } else {
            self.require_activation(reaction, first, Activation::Radical)?;
            self.require_activation(reaction, second, Activation::Radical)?;
        }
        self.require_open(first, site_a)?;
        self.require_open(second, site_b)?;

        self.units[first].close_site(site_a);
        self.units[second].close_site(site_b);
        self.units[first].set_activation(Activation::Phenol);
        self.units[second].set_activation(Activation::Phenol);

        match reaction {
            // The beta carbon partner is left as a quinone methide
            Reaction::Bo4 => {
                let unit = &mut self.units[second];
                unit.open_site(Site::C7);
                unit.set_activation(Activation::QuinoneMethide);
            }
            // Ring closure of the alpha carbon onto the 5-unit's phenolic oxygen
            Reaction::B5 => self.units[first].close_site(Site::O4),
            _ => {}
        }

        self.bonds.push(Bond {
            reaction,
            first,
            second,
        });
        Ok(self.merge(first, second))
    }

    /// Union by size; ties keep the lower root so results are order-stable
    fn merge(&mut self, a: usize, b: usize) -> Merge {
        let (ra, rb) = (self.root[a], self.root[b]);
        let (surviving, absorbed) = match self.members[ra].len().cmp(&self.members[rb].len()) {
            std::cmp::Ordering::Greater => (ra, rb),
            std::cmp::Ordering::Less => (rb, ra),
            std::cmp::Ordering::Equal => (ra.min(rb), ra.max(rb)),
        };

        let moved = std::mem::take(&mut self.members[absorbed]);
        for &unit in &moved {
            self.root[unit] = surviving;
        }
        self.members[surviving].extend_from_slice(&moved);

        Merge {
            surviving,
            absorbed,
            moved,
        }
    }

    fn check_unit(&self, id: usize) -> Result<(), PopulationError> {
        if id < self.units.len() {
            Ok(())
        } else {
            Err(PopulationError::UnknownUnit(id))
        }
    }

    fn require_open(&self, id: usize, site: Site) -> Result<(), PopulationError> {
        if self.units[id].is_open(site) {
            Ok(())
        } else {
            Err(PopulationError::SiteClosed { unit: id, site })
        }
    }

    fn require_activation(
        &self,
        reaction: Reaction,
        id: usize,
        expected: Activation,
    ) -> Result<(), PopulationError> {
        let found = self.units[id].activation();
        if found == expected {
            Ok(())
        } else {
            Err(PopulationError::WrongActivation {
                unit: id,
                reaction,
                expected,
                found,
            })
        }
    }
}
