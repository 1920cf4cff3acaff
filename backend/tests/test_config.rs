//! Configuration parsing and validation tests
//!
//! Every configuration error must surface before the first simulation step.

use lignin_kmc_core_rs::propagator::run_simulation;
use lignin_kmc_core_rs::rates::oracle::{AVOGADRO, J_PER_KCAL};
use lignin_kmc_core_rs::rates::{
    default_kcal_mol_entries, EnergyConfig, EnergyEntry, RateKey, SizeClass, Substrate,
    DEFAULT_TEMPERATURE,
};
use lignin_kmc_core_rs::{ConfigError, MonomerSpec, Reaction, SimulationConfig, SimulationError};

fn base_json(energies: &str) -> String {
    format!(
        r#"{{
            "temperature": 298.15,
            "activation_energies": {energies},
            "monomers": {{"counts": {{"guaiacyl": 2, "syringyl": 1}}}},
            "max_events": 5,
            "seed": 1
        }}"#
    )
}

/// Default energies, with `reaction` moved to J/particle
fn defaults_with_joule(reaction: Reaction) -> EnergyConfig {
    let (joule, kcal): (Vec<EnergyEntry>, Vec<EnergyEntry>) = default_kcal_mol_entries()
        .into_iter()
        .partition(|entry| entry.reaction == reaction);
    let joule = joule
        .into_iter()
        .map(|entry| EnergyEntry {
            energy: entry.energy * J_PER_KCAL / AVOGADRO,
            ..entry
        })
        .collect();
    EnergyConfig {
        kcal_mol: Some(kcal),
        j_particle: Some(joule),
    }
}

#[test]
fn test_minimal_config_uses_defaults() {
    let json = r#"{"temperature": 298.15, "monomers": {"counts": {"guaiacyl": 3, "syringyl": 0}}}"#;
    let config = SimulationConfig::from_json(json).unwrap();
    assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
    assert_eq!(config.monomers, MonomerSpec::Counts { guaiacyl: 3, syringyl: 0 });
    assert!(config.seed.is_none());
    assert_eq!(config.validate().unwrap().len(), 88);
}

#[test]
fn test_sg_ratio_monomers_parse() {
    let json = r#"{
        "temperature": 298.15,
        "monomers": {"sg_ratio": {"ratio": 2.5, "count": 40}},
        "seed": 3
    }"#;
    let config = SimulationConfig::from_json(json).unwrap();
    assert_eq!(config.monomers, MonomerSpec::SgRatio { ratio: 2.5, count: 40 });
    assert_eq!(config.monomers.unit_count(), 40);
}

#[test]
fn test_incomplete_energies_rejected_before_any_step() {
    // Enough for the first oxidation, but not for the couplings that follow
    let energies = r#"{"kcal_mol": [
        {"reaction": "oxidation", "substrate": {"flag": 0, "size": "monomer"}, "energy": 0.9},
        {"reaction": "bo4", "substrate": {"flags": [0, 0], "sizes": "mon_mon"}, "energy": 6.3}
    ]}"#;
    let result = SimulationConfig::from_json(&base_json(energies));
    assert!(matches!(result, Err(ConfigError::IncompleteEnergies(_))));

    let mut config = SimulationConfig::new(MonomerSpec::Counts {
        guaiacyl: 2,
        syringyl: 0,
    });
    config.activation_energies = serde_json::from_str(energies).unwrap();
    assert!(matches!(
        run_simulation(&config),
        Err(SimulationError::Config(ConfigError::IncompleteEnergies(_)))
    ));
}

#[test]
fn test_energy_coverage_follows_monomer_mix() {
    let guaiacyl_only = EnergyConfig {
        kcal_mol: Some(
            default_kcal_mol_entries()
                .into_iter()
                .filter(|entry| match entry.substrate {
                    Substrate::Unit { flag, .. } => flag == 0,
                    Substrate::Pair { flags, .. } => flags == [0, 0],
                })
                .collect(),
        ),
        j_particle: None,
    };

    let mut config = SimulationConfig::new(MonomerSpec::Counts {
        guaiacyl: 6,
        syringyl: 0,
    });
    config.activation_energies = guaiacyl_only;
    assert!(config.validate().is_ok());

    config.monomers = MonomerSpec::SgRatio { ratio: 0.0, count: 6 };
    assert!(config.validate().is_ok());

    config.monomers = MonomerSpec::Counts {
        guaiacyl: 5,
        syringyl: 1,
    };
    let missing = RateKey::new(Reaction::Ox, Substrate::unit(1, SizeClass::Monomer));
    assert_eq!(config.validate(), Err(ConfigError::IncompleteEnergies(missing)));
}

#[test]
fn test_neither_energy_unit_rejected() {
    let result = SimulationConfig::from_json(&base_json("{}"));
    assert_eq!(result, Err(ConfigError::MissingActivationEnergies));
}

#[test]
fn test_both_energy_units_for_one_reaction_rejected() {
    let energies = r#"{
        "kcal_mol": [
            {"reaction": "bb", "substrate": {"flags": [0, 0], "sizes": "mon_mon"}, "energy": 5.2}
        ],
        "j_particle": [
            {
                "reaction": "bb",
                "substrate": {"flags": [1, 1], "sizes": "mon_mon"},
                "energy": 3.6e-20
            }
        ]
    }"#;
    let result = SimulationConfig::from_json(&base_json(energies));
    assert_eq!(result, Err(ConfigError::ConflictingEnergyUnits(Some(Reaction::Bb))));
}

#[test]
fn test_different_reactions_may_use_different_units() {
    let mut config = SimulationConfig::new(MonomerSpec::Counts {
        guaiacyl: 2,
        syringyl: 1,
    });
    config.activation_energies = defaults_with_joule(Reaction::B5);
    let energies = config.validate().unwrap();
    assert_eq!(energies.len(), 88);
}

#[test]
fn test_invalid_regio_flag_rejected() {
    let energies = r#"{"kcal_mol": [
        {"reaction": "oxidation", "substrate": {"flag": 2, "size": "dimer"}, "energy": 1.0}
    ]}"#;
    let result = SimulationConfig::from_json(&base_json(energies));
    assert!(matches!(result, Err(ConfigError::InvalidRegioFlag(_))));
}

#[test]
fn test_duplicate_energy_rejected() {
    let entry =
        r#"{"reaction": "hydration", "substrate": {"flag": 0, "size": "dimer"}, "energy": 11.1}"#;
    let energies = format!(r#"{{"kcal_mol": [{entry}, {entry}]}}"#);
    let result = SimulationConfig::from_json(&base_json(&energies));
    assert!(matches!(result, Err(ConfigError::DuplicateEnergy(_))));
}

#[test]
fn test_invalid_temperature_rejected() {
    let mut config = SimulationConfig::new(MonomerSpec::Counts { guaiacyl: 1, syringyl: 1 });
    config.temperature = 0.0;
    assert_eq!(config.validate(), Err(ConfigError::InvalidTemperature(0.0)));
}

#[test]
fn test_negative_sg_ratio_rejected() {
    let config = SimulationConfig::new(MonomerSpec::SgRatio { ratio: -1.0, count: 5 });
    assert!(matches!(config.validate(), Err(ConfigError::InvalidMonomers(_))));
}

#[test]
fn test_zero_resync_interval_rejected() {
    let mut config = SimulationConfig::new(MonomerSpec::Counts { guaiacyl: 1, syringyl: 1 });
    config.propensity_resync_interval = 0;
    assert_eq!(config.validate(), Err(ConfigError::InvalidResyncInterval));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let result = SimulationConfig::from_json(r#"{"monomers": "#);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_config_errors_surface_before_any_step() {
    let mut config = SimulationConfig::new(MonomerSpec::Counts { guaiacyl: 4, syringyl: 0 });
    config.temperature = f64::NAN;
    let result = run_simulation(&config);
    assert!(matches!(
        result,
        Err(SimulationError::Config(ConfigError::InvalidTemperature(_)))
    ));
}

#[test]
fn test_fingerprint_stable_and_sensitive() {
    let mut a = SimulationConfig::new(MonomerSpec::Counts { guaiacyl: 5, syringyl: 5 });
    a.seed = Some(10);
    let b = a.clone();
    assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    assert_eq!(a.fingerprint().unwrap().len(), 64);

    let mut c = a.clone();
    c.seed = Some(11);
    assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
}

#[test]
fn test_config_round_trips_through_json() {
    let mut config = SimulationConfig::new(MonomerSpec::SgRatio { ratio: 1.0, count: 12 });
    config.max_time = Some(1.0);
    config.seed = Some(5);
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(SimulationConfig::from_json(&json).unwrap(), config);
}
