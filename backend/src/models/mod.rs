//! Domain models for the lignin KMC simulator

pub mod event;
pub mod population;
pub mod reaction;
pub mod unit;

// Re-exports
pub use event::{Event, EventLog};
pub use population::{Bond, Merge, Population, PopulationError};
pub use reaction::Reaction;
pub use unit::{Activation, MonomerType, Site, SiteSet, Unit};
