//! Monomer units
//!
//! A unit is one monolignol residue. Units are created when the population is
//! built and never destroyed; a reaction only changes which bonding sites a
//! unit still has open and its activation state.
//!
//! # Site labels
//!
//! Sites use the conventional lignin carbon numbering:
//! - `C1`: ring carbon carrying the side chain (only attackable once C8 is bonded)
//! - `O4`: phenolic oxygen
//! - `C5`: free ring position (guaiacyl only; methoxylated in syringyl)
//! - `C7`: alpha carbon (open while the unit is a quinone methide)
//! - `C8`: beta carbon

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monolignol type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonomerType {
    /// Coniferyl alcohol derived (G)
    #[serde(rename = "G")]
    Guaiacyl,
    /// Sinapyl alcohol derived (S)
    #[serde(rename = "S")]
    Syringyl,
}

impl MonomerType {
    /// Regiochemistry flag used in rate-table substrate descriptors (G = 0, S = 1)
    pub fn regio_flag(self) -> u8 {
        match self {
            MonomerType::Guaiacyl => 0,
            MonomerType::Syringyl => 1,
        }
    }

    /// Sites open on a freshly created monomer
    pub fn initial_sites(self) -> SiteSet {
        match self {
            MonomerType::Guaiacyl => SiteSet::from_sites(&[Site::O4, Site::C5, Site::C8]),
            MonomerType::Syringyl => SiteSet::from_sites(&[Site::O4, Site::C8]),
        }
    }
}

/// Bonding site label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Site {
    C1,
    O4,
    C5,
    C7,
    C8,
}

impl Site {
    pub const ALL: [Site; 5] = [Site::C1, Site::O4, Site::C5, Site::C7, Site::C8];

    /// Position number in lignin nomenclature
    pub fn position(self) -> u8 {
        match self {
            Site::C1 => 1,
            Site::O4 => 4,
            Site::C5 => 5,
            Site::C7 => 7,
            Site::C8 => 8,
        }
    }

    fn bit(self) -> u16 {
        1 << self.position()
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.position())
    }
}

/// Small bitset of open sites
///
/// # Example
/// ```
/// use lignin_kmc_core_rs::models::unit::{Site, SiteSet};
///
/// let mut open = SiteSet::from_sites(&[Site::O4, Site::C8]);
/// assert!(open.contains(Site::C8));
/// open.remove(Site::C8);
/// assert!(!open.contains(Site::C8));
/// assert_eq!(open.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SiteSet(u16);

impl SiteSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_sites(sites: &[Site]) -> Self {
        let mut set = Self::empty();
        for &site in sites {
            set.insert(site);
        }
        set
    }

    pub fn contains(&self, site: Site) -> bool {
        self.0 & site.bit() != 0
    }

    pub fn insert(&mut self, site: Site) {
        self.0 |= site.bit();
    }

    pub fn remove(&mut self, site: Site) {
        self.0 &= !site.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Open sites in ascending position order
    pub fn iter(&self) -> impl Iterator<Item = Site> + '_ {
        Site::ALL.into_iter().filter(move |site| self.contains(*site))
    }
}

impl Serialize for SiteSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for SiteSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let sites = Vec::<Site>::deserialize(deserializer)?;
        Ok(SiteSet::from_sites(&sites))
    }
}

/// Electronic state of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Activation {
    /// Aromatic, unoxidized (oxidizable if O4 is open)
    Phenol,
    /// Oxidized phenoxy radical, ready for radical coupling
    Radical,
    /// Quinone methide formed by an 8-coupling; C7 is electrophilic
    QuinoneMethide,
}

/// A monomer unit in the simulation arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Arena index, stable for the whole run
    id: usize,
    monomer: MonomerType,
    open: SiteSet,
    activation: Activation,
}

impl Unit {
    /// Create an unreacted monomer
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::models::unit::{Activation, MonomerType, Site, Unit};
    ///
    /// let unit = Unit::new(0, MonomerType::Syringyl);
    /// assert!(unit.is_open(Site::O4));
    /// assert!(!unit.is_open(Site::C5));
    /// assert_eq!(unit.activation(), Activation::Phenol);
    /// ```
    pub fn new(id: usize, monomer: MonomerType) -> Self {
        Self {
            id,
            monomer,
            open: monomer.initial_sites(),
            activation: Activation::Phenol,
        }
    }

    /// Create a unit in an arbitrary state (custom populations and snapshots)
    pub fn with_state(
        id: usize,
        monomer: MonomerType,
        open: SiteSet,
        activation: Activation,
    ) -> Self {
        Self {
            id,
            monomer,
            open,
            activation,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn monomer(&self) -> MonomerType {
        self.monomer
    }

    pub fn open_sites(&self) -> SiteSet {
        self.open
    }

    pub fn is_open(&self, site: Site) -> bool {
        self.open.contains(site)
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Unoxidized with a free phenolic oxygen
    pub fn is_free_phenol(&self) -> bool {
        self.activation == Activation::Phenol && self.open.contains(Site::O4)
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub(crate) fn open_site(&mut self, site: Site) {
        self.open.insert(site);
    }

    pub(crate) fn close_site(&mut self, site: Site) {
        self.open.remove(site);
        // Bonding at C8 exposes C1 for a later beta-1 attack
        if site == Site::C8 {
            self.open.insert(Site::C1);
        }
    }

    pub(crate) fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
    }
}
