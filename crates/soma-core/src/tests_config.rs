//! Configuration loading, validation, and override tests.

use crate::config::{ConfigError, SomaConfig};

#[test]
fn defaults_validate() {
    let cfg = SomaConfig::default();
    assert!(cfg.validate().is_ok());
}

#[test]
fn default_values_match_contract() {
    let cfg = SomaConfig::default();
    assert_eq!(cfg.pulse.max_window, 6);
    assert_eq!(cfg.fluid.imprint_half_life_ms, 60_000);
    assert_eq!(cfg.fluid.phase_sensitivity, 1.0);
    assert!(cfg.wave.minimal_acceptable_score.is_none());
    let w = cfg.trajectory.weights;
    assert!((w.weight_resonance + w.weight_luck + w.weight_gain + w.weight_risk - 1.0).abs() < 1e-6);
}

#[test]
fn window_below_two_is_rejected() {
    let mut cfg = SomaConfig::default();
    cfg.pulse.max_window = 1;
    assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn non_positive_half_life_is_rejected() {
    let mut cfg = SomaConfig::default();
    cfg.fluid.imprint_half_life_ms = 0;
    assert!(cfg.validate().is_err());
    cfg.fluid.imprint_half_life_ms = -5;
    assert!(cfg.validate().is_err());
}

#[test]
fn sensitivity_outside_band_is_rejected() {
    let mut cfg = SomaConfig::default();
    cfg.fluid.phase_sensitivity = 0.05;
    assert!(cfg.validate().is_err());
    cfg.fluid.phase_sensitivity = 2.5;
    assert!(cfg.validate().is_err());
    cfg.fluid.phase_sensitivity = 2.0;
    assert!(cfg.validate().is_ok());
}

#[test]
fn base_pattern_values_must_be_unit_range() {
    let mut cfg = SomaConfig::default();
    cfg.fluid.base_plasticity = 1.2;
    assert!(cfg.validate().is_err());

    let mut cfg = SomaConfig::default();
    cfg.fluid.base_inertia = -0.1;
    assert!(cfg.validate().is_err());
}

#[test]
fn weights_must_be_unit_range() {
    let mut cfg = SomaConfig::default();
    cfg.wave.weights.weight_risk = 1.5;
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("wave.weights.weight_risk"));
}

#[test]
fn toml_round_trip_preserves_values() {
    let mut cfg = SomaConfig::default();
    cfg.fluid.phase_sensitivity = 1.4;
    cfg.wave.minimal_acceptable_score = Some(0.2);

    let text = cfg.to_toml_string().unwrap();
    let parsed: SomaConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed.fluid.phase_sensitivity, 1.4);
    assert_eq!(parsed.wave.minimal_acceptable_score, Some(0.2));
    assert!(parsed.validate().is_ok());
}

#[test]
fn partial_toml_is_rejected_cleanly() {
    // Sections are mandatory; a fragment parses as an error, not a panic.
    let fragment = "[pulse]\nmax_window = 4\n";
    let parsed: Result<SomaConfig, _> = toml::from_str(fragment);
    assert!(parsed.is_err());
}

#[test]
fn missing_file_reports_io_error() {
    let err = SomaConfig::from_file("/definitely/not/here.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn env_override_applies_and_validates() {
    let mut cfg = SomaConfig::default();
    std::env::set_var("SOMA_FLUID_PHASE_SENSITIVITY", "1.7");
    let result = cfg.apply_env_overrides();
    std::env::remove_var("SOMA_FLUID_PHASE_SENSITIVITY");
    assert!(result.is_ok());
    assert_eq!(cfg.fluid.phase_sensitivity, 1.7);
}

#[test]
fn malformed_env_override_is_a_validation_error() {
    let mut cfg = SomaConfig::default();
    std::env::set_var("SOMA_PULSE_MAX_WINDOW", "six");
    let result = cfg.apply_env_overrides();
    std::env::remove_var("SOMA_PULSE_MAX_WINDOW");
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}
