//! Simulated time for the KMC loop
//!
//! KMC time is continuous: each applied event advances the clock by an
//! exponentially distributed waiting time. The clock only moves forward.

use serde::{Deserialize, Serialize};

/// Monotonically increasing simulation clock
///
/// # Example
/// ```
/// use lignin_kmc_core_rs::SimulationClock;
///
/// let mut clock = SimulationClock::new();
/// assert_eq!(clock.now(), 0.0);
///
/// clock.advance(0.25);
/// clock.advance(0.5);
/// assert!((clock.now() - 0.75).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    /// Simulated time elapsed since the run started
    now: f64,
}

impl SimulationClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self { now: 0.0 }
    }

    /// Create a clock at an arbitrary start time (used when resuming)
    ///
    /// # Panics
    /// Panics if `now` is negative or not finite
    pub fn starting_at(now: f64) -> Self {
        assert!(now.is_finite() && now >= 0.0, "clock time must be finite and >= 0");
        Self { now }
    }

    /// Advance the clock by `dt`
    ///
    /// # Panics
    /// Panics if `dt` is negative or NaN
    pub fn advance(&mut self, dt: f64) {
        assert!(dt >= 0.0, "time step must be non-negative, got {}", dt);
        self.now += dt;
    }

    /// Move the clock forward to `time` if it lies ahead; never moves back.
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::SimulationClock;
    ///
    /// let mut clock = SimulationClock::new();
    /// clock.advance(2.0);
    /// clock.advance_to(1.0);
    /// assert_eq!(clock.now(), 2.0);
    /// clock.advance_to(3.0);
    /// assert_eq!(clock.now(), 3.0);
    /// ```
    pub fn advance_to(&mut self, time: f64) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Current simulated time
    pub fn now(&self) -> f64 {
        self.now
    }
}
