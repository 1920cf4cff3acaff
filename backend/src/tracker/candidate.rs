//! Candidate events
//!
//! A candidate is a reaction that could fire in the current state. Candidates
//! reference units by arena index only.

use crate::models::reaction::Reaction;
use crate::rates::key::Substrate;

/// Identity of a candidate event, also its position in the selection scan
///
/// Ordering is (reaction, first, second), which gives a deterministic scan
/// independent of how the event set was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub reaction: Reaction,
    pub first: usize,
    pub second: Option<usize>,
}

impl EventKey {
    pub fn unimolecular(reaction: Reaction, unit: usize) -> Self {
        Self {
            reaction,
            first: unit,
            second: None,
        }
    }

    /// Pair key; symmetric couplings are stored with the lower index first
    pub fn pair(reaction: Reaction, first: usize, second: usize) -> Self {
        let (first, second) = if reaction.is_symmetric() && second < first {
            (second, first)
        } else {
            (first, second)
        };
        Self {
            reaction,
            first,
            second: Some(second),
        }
    }

    /// Participating units (one or two)
    pub fn units(&self) -> impl Iterator<Item = usize> {
        std::iter::once(self.first).chain(self.second)
    }

    /// The participant that is not `unit`, for pair events
    pub fn partner_of(&self, unit: usize) -> Option<usize> {
        match self.second {
            Some(second) if self.first == unit => Some(second),
            Some(_) => Some(self.first),
            None => None,
        }
    }
}

/// A live candidate with its rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateEvent {
    pub key: EventKey,
    pub substrate: Substrate,
    pub rate: f64,
}
