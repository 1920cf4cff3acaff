//! Rate oracle and reaction rate table

pub mod energies;
pub mod key;
pub mod oracle;
pub mod table;

pub use energies::{default_kcal_mol_entries, ActivationEnergies, EnergyConfig, EnergyEntry};
pub use key::{PairSize, RateKey, SizeClass, Substrate};
pub use oracle::{eyring_rate, ActivationEnergy, EyringOracle, RateOracle, DEFAULT_TEMPERATURE};
pub use table::{RateTable, RateTableError};
