//! Core domain types for the soma pipeline: pulse samples and snapshots,
//! imprints, luck vectors, and the reduced bridge records exchanged between
//! layers. Everything here is a plain value object with no hidden state.

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Time and range helpers
// ============================================================================

/// Compute a time delta in milliseconds with saturation: if clocks go
/// backwards (`now < last`), returns 0 instead of a negative delta.
#[inline]
pub fn dt_ms(now_ms: i64, last_ms: i64) -> i64 {
    if now_ms >= last_ms {
        now_ms - last_ms
    } else {
        0
    }
}

/// Clamp to the unit interval. Non-finite inputs collapse to 0.0 so that a
/// NaN can never propagate through the pipeline.
#[inline]
pub fn clamp01(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Clamp to [-1, 1]. Non-finite inputs collapse to 0.0.
#[inline]
pub fn clamp_signed(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

// ============================================================================
// Pulse layer enums
// ============================================================================

/// Position within the pulse cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PulsePhase {
    #[default]
    Rest,
    Rise,
    Peak,
    Recovery,
}

/// Short-window trend classification of the pulse signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Drift {
    Rising,
    Falling,
    #[default]
    Stable,
    Irregular,
}

/// Cadence recommendation derived from the modulation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rhythm {
    Slow,
    #[default]
    Neutral,
    Fast,
}

// ============================================================================
// Fluid layer enums
// ============================================================================

/// Tone tag carried by an imprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tone {
    Supportive,
    #[default]
    Neutral,
    Stress,
    Conflict,
}

/// Qualitative classification of a region's crystallized state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FluidPhase {
    Frozen,
    #[default]
    Fluid,
    Vapor,
    Metastable,
}

/// Global throughput classification of the informational fluid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlowState {
    Stalled,
    #[default]
    Normal,
    Amplified,
}

// ============================================================================
// Pulse layer records
// ============================================================================

/// A single raw pulse observation. All scalar fields are normalized to [0, 1]
/// and clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseSample {
    pub intensity: f32,
    pub variability: f32,
    pub phase: PulsePhase,
    pub overload_risk: f32,
}

impl PulseSample {
    pub fn new(intensity: f32, variability: f32, phase: PulsePhase, overload_risk: f32) -> Self {
        Self {
            intensity: clamp01(intensity),
            variability: clamp01(variability),
            phase,
            overload_risk: clamp01(overload_risk),
        }
    }
}

impl Default for PulseSample {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            variability: 0.0,
            phase: PulsePhase::Rest,
            overload_risk: 0.0,
        }
    }
}

/// Slow-moving reference level the current sample is judged against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseBaseline {
    pub intensity: f32,
    pub stability: f32,
}

impl PulseBaseline {
    pub fn new(intensity: f32, stability: f32) -> Self {
        Self {
            intensity: clamp01(intensity),
            stability: clamp01(stability),
        }
    }
}

impl Default for PulseBaseline {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            stability: 0.5,
        }
    }
}

/// External influence inputs declared alongside the latest sample. Every
/// field is optional; a missing value resolves to the neutral 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModulationInputs {
    pub sense_tension: Option<f32>,
    pub sense_uplift: Option<f32>,
    pub luck_resonance: Option<f32>,
    pub breathing_coherence: Option<f32>,
    pub foresight_phase: Option<f32>,
}

/// Fully-resolved influence values after default substitution and clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedInfluences {
    pub tension: f32,
    pub uplift: f32,
    pub luck: f32,
    pub breathing: f32,
    pub foresight: f32,
}

impl ModulationInputs {
    /// Total resolution: absent fields become 0.0, present fields are clamped
    /// to their declared range. `foresight_phase` is the only signed input.
    pub fn resolved(&self) -> ResolvedInfluences {
        ResolvedInfluences {
            tension: clamp01(self.sense_tension.unwrap_or(0.0)),
            uplift: clamp01(self.sense_uplift.unwrap_or(0.0)),
            luck: clamp01(self.luck_resonance.unwrap_or(0.0)),
            breathing: clamp01(self.breathing_coherence.unwrap_or(0.0)),
            foresight: clamp_signed(self.foresight_phase.unwrap_or(0.0)),
        }
    }
}

/// Bookkeeping record of which influences were applied to a pulse state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModulationState {
    pub breathing_influence: f32,
    pub luck_influence: f32,
    pub emotional_influence: f32,
}

impl Default for ModulationState {
    fn default() -> Self {
        Self {
            breathing_influence: 0.0,
            luck_influence: 0.0,
            emotional_influence: 0.5,
        }
    }
}

/// Complete pulse state for one tick. Produced by the snapshot builder as a
/// pure function of the sample history; the caller owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseState {
    pub baseline: PulseBaseline,
    pub current: PulseSample,
    pub modulation: ModulationState,
    pub readiness: f32,
    pub overload_level: f32,
    pub drift: Option<Drift>,
}

impl PulseState {
    /// Scalar projection used by the drift classifier: the mean of baseline
    /// intensity, current intensity, variability, and overload level.
    pub fn signal_level(&self) -> f32 {
        (clamp01(self.baseline.intensity)
            + clamp01(self.current.intensity)
            + clamp01(self.current.variability)
            + clamp01(self.overload_level))
            / 4.0
    }
}

/// Bounded modulation/phase-steering signal derived from drift and influences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseModulation {
    /// Overall intensity steer in [0, 1]; 0.5 is neutral.
    pub modulation_level: f32,
    /// Signed phase-steering coefficient in [-1, 1].
    pub phase_coefficient: f32,
    /// True when breathing coherence is high enough and the signal is neither
    /// irregular nor saturated.
    pub stabilized: bool,
    pub recommended_rhythm: Rhythm,
}

/// Reduced pulse snapshot consumed by the fluid and decision stages.
///
/// Downstream phase-bias decisions key off exactly these scalars, so the
/// reduction is part of the layer contract, not a convenience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseBridge {
    pub phase: PulsePhase,
    pub drift: Drift,
    pub modulation_level: f32,
    pub baseline_level: f32,
    pub overload_level: f32,
    pub readiness: f32,
    pub current: PulseSample,
    pub baseline: PulseBaseline,
}

// ============================================================================
// Fluid layer records
// ============================================================================

/// A single timestamped, tone-tagged event applied to a region. Immutable
/// once created; intensity is clamped on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imprint {
    pub id: Uuid,
    pub region_id: String,
    pub source_layer: String,
    pub timestamp_ms: i64,
    pub tone: Tone,
    pub intensity: f32,
    pub tags: Vec<String>,
}

impl Imprint {
    pub fn new(
        region_id: impl Into<String>,
        source_layer: impl Into<String>,
        timestamp_ms: i64,
        tone: Tone,
        intensity: f32,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            region_id: region_id.into(),
            source_layer: source_layer.into(),
            timestamp_ms,
            tone,
            intensity: clamp01(intensity),
            tags,
        }
    }
}

// ============================================================================
// Decision layer inputs
// ============================================================================

/// Risk appetite, change drive, and focus tags supplied by the caller to
/// steer candidate ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuckVector {
    pub risk_appetite: f32,
    pub change_drive: f32,
    pub focus_tags: Vec<String>,
}

impl Default for LuckVector {
    fn default() -> Self {
        Self {
            risk_appetite: 0.5,
            change_drive: 0.5,
            focus_tags: Vec::new(),
        }
    }
}

/// Cadence mode reported by the breathing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BreathingMode {
    #[default]
    Resting,
    Paced,
    Surge,
}

/// Reduced snapshot supplied by the breathing cadence layer. Consumed at the
/// interface only; this crate never generates cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreathingSnapshot {
    pub mode: BreathingMode,
    pub rate_bpm: f32,
    pub stability: f32,
}

// ============================================================================
// Canonical hashing
// ============================================================================

/// Convert an f32 to a canonical fixed-point representation for deterministic
/// hashing. Identical values hash identically across platforms; drift beyond
/// 1e-6 is detectable.
pub(crate) fn f32_to_canonical(val: f32) -> i64 {
    const SCALE: f32 = 1_000_000.0;

    if val.is_nan() {
        return i64::MAX;
    }
    if val == f32::INFINITY {
        return i64::MAX - 1;
    }
    if val == f32::NEG_INFINITY {
        return i64::MIN;
    }

    let clamped = val.clamp(-2147.0, 2147.0);
    (clamped * SCALE).round() as i64
}

pub(crate) fn hash_f32(hasher: &mut Hasher, val: f32) {
    hasher.update(&f32_to_canonical(val).to_le_bytes());
}

/// Length-prefixed string hashing so concatenated fields cannot collide.
pub(crate) fn hash_str(hasher: &mut Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}
