//! Soma core: physiological signal pipeline and trajectory decision engine.
//!
//! Three stages, strictly downstream: a raw pulse history is classified into
//! a drift trend and modulated into a bounded steering signal; decaying
//! regional imprints evolve into crystallized fluid phases coupled to that
//! pulse; and the combined environment snapshot ranks competing trajectory
//! and wave candidates under a multi-criteria scoring function.
//!
//! Every function is total over its domain: out-of-range numbers clamp,
//! missing inputs resolve to neutral defaults, and the only observable
//! "failure" is a withheld pick. The whole pipeline is a single-threaded,
//! deterministic fold with no I/O and no wall-clock reads.

pub mod config;
pub mod domain;
pub mod drift;
pub mod engine;
pub mod fluid;
pub mod modulation;
pub mod pulse;
pub mod scoring;
pub mod trajectory;
pub mod wave;

#[cfg(test)]
pub mod tests_config;
#[cfg(test)]
pub mod tests_determinism;
#[cfg(test)]
pub mod tests_proptest;

// Curated public API exports (no wildcard re-exports).

// Domain types
pub use domain::{
    clamp01,
    clamp_signed,
    dt_ms,
    BreathingMode,
    BreathingSnapshot,
    Drift,
    FlowState,
    FluidPhase,
    Imprint,
    LuckVector,
    ModulationInputs,
    ModulationState,
    PulseBaseline,
    PulseBridge,
    PulseModulation,
    PulsePhase,
    PulseSample,
    PulseState,
    Rhythm,
    Tone,
};

// Configuration
pub use config::{
    ConfigError, FluidConfig, PulseConfig, ScoringWeights, SomaConfig, TrajectoryConfig,
    WaveConfig,
};

// Pulse pipeline
pub use drift::classify_drift;
pub use modulation::modulate;
pub use pulse::{build_snapshot, PulseSnapshot};

// Informational fluid
pub use fluid::{CrystalPattern, FluidRegionState, FluidSnapshot, InformationalFluid};

// Decision engines
pub use scoring::{
    CandidateScores, Decision, DecisionContext, FlowContext, PhaseBias, RankedCandidate,
};
pub use trajectory::{TrajectoryCandidate, TrajectoryHarmonizer, TrajectoryStep};
pub use wave::{WaveChoiceEngine, WaveOption};

// Orchestrator
pub use engine::SomaEngine;
