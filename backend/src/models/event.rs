//! Event trace for simulation replay and debugging.
//!
//! Every event the propagator applies is logged in order, with the simulated
//! time at which it fired. Two runs with the same seed and configuration
//! produce identical logs, which is what the determinism tests compare.
//!
//! # Example
//!
//! ```rust
//! use lignin_kmc_core_rs::models::event::{Event, EventLog};
//! use lignin_kmc_core_rs::models::reaction::Reaction;
//!
//! let mut log = EventLog::new();
//! log.log(Event::Oxidation { step: 0, time: 1.5e-12, unit: 3 });
//! log.log(Event::BondFormed {
//!     step: 1,
//!     time: 2.0e-9,
//!     reaction: Reaction::Bo4,
//!     first: 3,
//!     second: 7,
//!     aggregate_size: 2,
//! });
//!
//! assert_eq!(log.len(), 2);
//! assert_eq!(log.events_for_unit(3).len(), 2);
//! ```

use crate::models::reaction::Reaction;
use serde::{Deserialize, Serialize};

/// One applied KMC event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Phenol oxidized to a radical
    Oxidation { step: usize, time: f64, unit: usize },

    /// Quinone methide rearomatized by water addition
    Hydration { step: usize, time: f64, unit: usize },

    /// Two units coupled; their aggregates merged
    BondFormed {
        step: usize,
        time: f64,
        reaction: Reaction,
        first: usize,
        second: usize,
        /// Size of the merged aggregate
        aggregate_size: usize,
    },
}

impl Event {
    /// Zero-based index of the event within its run
    pub fn step(&self) -> usize {
        match self {
            Event::Oxidation { step, .. } => *step,
            Event::Hydration { step, .. } => *step,
            Event::BondFormed { step, .. } => *step,
        }
    }

    /// Simulated time at which the event fired
    pub fn time(&self) -> f64 {
        match self {
            Event::Oxidation { time, .. } => *time,
            Event::Hydration { time, .. } => *time,
            Event::BondFormed { time, .. } => *time,
        }
    }

    pub fn reaction(&self) -> Reaction {
        match self {
            Event::Oxidation { .. } => Reaction::Ox,
            Event::Hydration { .. } => Reaction::Q,
            Event::BondFormed { reaction, .. } => *reaction,
        }
    }

    /// Short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Oxidation { .. } => "Oxidation",
            Event::Hydration { .. } => "Hydration",
            Event::BondFormed { .. } => "BondFormed",
        }
    }

    pub fn involves(&self, id: usize) -> bool {
        match self {
            Event::Oxidation { unit, .. } | Event::Hydration { unit, .. } => *unit == id,
            Event::BondFormed { first, second, .. } => *first == id || *second == id,
        }
    }
}

/// Time-ordered event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Events of a specific type ("Oxidation", "Hydration", "BondFormed")
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_of_reaction(&self, reaction: Reaction) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.reaction() == reaction)
            .collect()
    }

    pub fn events_for_unit(&self, id: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.involves(id)).collect()
    }
}
