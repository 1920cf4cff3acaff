//! Deterministic random number generation
//!
//! xorshift64* for the Gillespie draws and S:G sampling, splitmix64 for
//! deriving replicate seeds. Every random draw of a run goes through one
//! `RngManager`, whose state is captured in snapshots.

mod xorshift;

pub use xorshift::RngManager;
