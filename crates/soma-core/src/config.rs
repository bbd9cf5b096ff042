use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SomaConfig {
    pub pulse: PulseConfig,
    pub fluid: FluidConfig,
    pub trajectory: TrajectoryConfig,
    pub wave: WaveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Maximum number of recent samples the drift classifier looks at.
    pub max_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluidConfig {
    /// Half-life of an imprint in milliseconds. Imprints are evicted once
    /// older than 4x this value (hard cutoff, not continuous decay).
    pub imprint_half_life_ms: i64,
    /// Scales the stress/support metrics before phase thresholds. [0.1, 2.0].
    pub phase_sensitivity: f32,
    /// Plasticity a freshly-created region starts with.
    pub base_plasticity: f32,
    /// Inertia a freshly-created region starts with.
    pub base_inertia: f32,
}

/// Criterion weights shared by both decision engines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub weight_resonance: f32,
    pub weight_luck: f32,
    pub weight_gain: f32,
    pub weight_risk: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrajectoryConfig {
    pub weights: ScoringWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WaveConfig {
    pub weights: ScoringWeights,
    /// When set, a top-ranked option whose combined score falls below this
    /// bar yields `chosen = None` instead of a pick.
    #[serde(default)]
    pub minimal_acceptable_score: Option<f32>,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self { max_window: 6 }
    }
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            imprint_half_life_ms: 60_000,
            phase_sensitivity: 1.0,
            base_plasticity: 0.5,
            base_inertia: 0.5,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            weight_resonance: 0.3,
            weight_luck: 0.2,
            weight_gain: 0.25,
            weight_risk: 0.25,
        }
    }
}

impl SomaConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: SomaConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    /// Environment variables are prefixed with SOMA_.
    /// Example: SOMA_FLUID_PHASE_SENSITIVITY=1.4
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if it exists)
    /// 3. Built-in defaults (lowest priority)
    pub fn load_layered(user_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = SomaConfig::default();

        if let Some(path) = user_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        use std::env;

        if let Ok(val) = env::var("SOMA_PULSE_MAX_WINDOW") {
            self.pulse.max_window = val
                .parse()
                .map_err(|_| ConfigError::Validation("Invalid SOMA_PULSE_MAX_WINDOW".to_string()))?;
        }

        if let Ok(val) = env::var("SOMA_FLUID_IMPRINT_HALF_LIFE_MS") {
            self.fluid.imprint_half_life_ms = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid SOMA_FLUID_IMPRINT_HALF_LIFE_MS".to_string())
            })?;
        }
        if let Ok(val) = env::var("SOMA_FLUID_PHASE_SENSITIVITY") {
            self.fluid.phase_sensitivity = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid SOMA_FLUID_PHASE_SENSITIVITY".to_string())
            })?;
        }

        if let Ok(val) = env::var("SOMA_TRAJECTORY_WEIGHT_RESONANCE") {
            self.trajectory.weights.weight_resonance = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid SOMA_TRAJECTORY_WEIGHT_RESONANCE".to_string())
            })?;
        }

        if let Ok(val) = env::var("SOMA_WAVE_MINIMAL_ACCEPTABLE_SCORE") {
            self.wave.minimal_acceptable_score = Some(val.parse().map_err(|_| {
                ConfigError::Validation("Invalid SOMA_WAVE_MINIMAL_ACCEPTABLE_SCORE".to_string())
            })?);
        }

        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pulse.max_window < 2 {
            return Err(ConfigError::Validation(
                "pulse.max_window must be >= 2".to_string(),
            ));
        }

        if self.fluid.imprint_half_life_ms <= 0 {
            return Err(ConfigError::Validation(
                "fluid.imprint_half_life_ms must be positive".to_string(),
            ));
        }
        if self.fluid.phase_sensitivity < 0.1 || self.fluid.phase_sensitivity > 2.0 {
            return Err(ConfigError::Validation(
                "fluid.phase_sensitivity must be in [0.1, 2.0]".to_string(),
            ));
        }
        if self.fluid.base_plasticity < 0.0 || self.fluid.base_plasticity > 1.0 {
            return Err(ConfigError::Validation(
                "fluid.base_plasticity must be in [0, 1]".to_string(),
            ));
        }
        if self.fluid.base_inertia < 0.0 || self.fluid.base_inertia > 1.0 {
            return Err(ConfigError::Validation(
                "fluid.base_inertia must be in [0, 1]".to_string(),
            ));
        }

        validate_weights("trajectory", &self.trajectory.weights)?;
        validate_weights("wave", &self.wave.weights)?;

        if let Some(bar) = self.wave.minimal_acceptable_score {
            if !bar.is_finite() {
                return Err(ConfigError::Validation(
                    "wave.minimal_acceptable_score must be finite".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Export configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

fn validate_weights(section: &str, w: &ScoringWeights) -> Result<(), ConfigError> {
    for (name, val) in [
        ("weight_resonance", w.weight_resonance),
        ("weight_luck", w.weight_luck),
        ("weight_gain", w.weight_gain),
        ("weight_risk", w.weight_risk),
    ] {
        if !(0.0..=1.0).contains(&val) {
            return Err(ConfigError::Validation(format!(
                "{}.weights.{} must be in [0, 1]",
                section, name
            )));
        }
    }
    Ok(())
}
