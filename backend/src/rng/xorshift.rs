//! xorshift64* random number generator
//!
//! This is a fast, high-quality PRNG that is deterministic and suitable
//! for stochastic simulation.
//!
//! # Algorithm
//!
//! xorshift64* is a variant of xorshift that passes TestU01's BigCrush
//! statistical tests. It uses 64-bit state and produces 64-bit output.
//!
//! # Determinism
//!
//! Same seed → same sequence of random numbers → same KMC trajectory.
//! Replicate streams for ensembles are derived with splitmix64 so that
//! neighbouring replicate indices do not produce correlated streams.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const SPLITMIX_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use lignin_kmc_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let u = rng.next_open_f64(); // (0, 1)
/// assert!(u > 0.0 && u < 1.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::RngManager;
    ///
    /// let rng = RngManager::new(12345);
    /// ```
    pub fn new(seed: u64) -> Self {
        // Ensure seed is never zero (xorshift requirement)
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Pick a seed from the wall clock when the caller did not supply one.
    ///
    /// Runs seeded this way are not reproducible unless the returned seed
    /// is recorded; the propagator keeps it in its result.
    pub fn entropy_seed() -> u64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        splitmix64(nanos ^ u64::from(std::process::id()))
    }

    /// Seed for replicate `index` of an ensemble started from `base_seed`.
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::RngManager;
    ///
    /// assert_eq!(RngManager::derive_seed(7, 3), RngManager::derive_seed(7, 3));
    /// assert_ne!(RngManager::derive_seed(7, 3), RngManager::derive_seed(7, 4));
    /// ```
    pub fn derive_seed(base_seed: u64, index: u64) -> u64 {
        splitmix64(base_seed.wrapping_add(index.wrapping_mul(SPLITMIX_GAMMA)))
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        // xorshift64* algorithm
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Get current RNG state (for snapshot/resume)
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(12345);
    /// rng.next();
    /// let mut resumed = RngManager::new(rng.get_state());
    /// assert_eq!(rng.next(), resumed.next());
    /// ```
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    ///
    /// # Example
    /// ```
    /// use lignin_kmc_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(12345);
    /// let probability = rng.next_f64();
    /// assert!(probability >= 0.0 && probability < 1.0);
    /// ```
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // Convert to [0.0, 1.0) by dividing by 2^53
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Generate random f64 in the open interval (0.0, 1.0)
    ///
    /// Used for the Gillespie draws: `-ln(u)` must stay finite and the
    /// selection threshold must stay strictly below the propensity sum.
    pub fn next_open_f64(&mut self) -> f64 {
        let value = self.next();
        ((value >> 11) as f64 + 0.5) * (1.0 / ((1u64 << 53) as f64))
    }
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(SPLITMIX_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
