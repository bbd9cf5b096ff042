//! Informational fluid: a per-region store of decaying, tone-tagged imprints
//! from which each region derives a crystallized phase, a coherence score,
//! and plasticity/inertia that carry memory across updates.
//!
//! Decay is a hard cutoff at four half-lives with uniform weighting inside
//! the window, and plasticity/inertia accumulate without any pull toward a
//! resting value. Both are load-bearing behaviors of the layer contract and
//! must not be "fixed" into continuous decay.

use std::collections::BTreeMap;

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FluidConfig;
use crate::domain::{
    clamp01, hash_f32, hash_str, Drift, FlowState, FluidPhase, Imprint, PulseBridge, PulsePhase,
    Tone,
};

/// Imprints older than this many half-lives are evicted.
const DECAY_WINDOW_HALF_LIVES: i64 = 4;

/// Per-region derived state. Mutated in place on every imprint application;
/// never reset except by re-initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrystalPattern {
    pub coherence: f32,
    pub supportive_weight: f32,
    pub stress_weight: f32,
    pub conflict_weight: f32,
    pub neutral_weight: f32,
    pub phase: FluidPhase,
    pub plasticity: f32,
    pub inertia: f32,
    pub last_updated_ms: i64,
}

impl CrystalPattern {
    fn fresh(cfg: &FluidConfig, now_ms: i64) -> Self {
        Self {
            coherence: 0.0,
            supportive_weight: 0.0,
            stress_weight: 0.0,
            conflict_weight: 0.0,
            neutral_weight: 0.0,
            phase: FluidPhase::Fluid,
            plasticity: clamp01(cfg.base_plasticity),
            inertia: clamp01(cfg.base_inertia),
            last_updated_ms: now_ms,
        }
    }

    fn total_weight(&self) -> f32 {
        self.supportive_weight + self.stress_weight + self.conflict_weight + self.neutral_weight
    }

    fn max_weight(&self) -> f32 {
        self.supportive_weight
            .max(self.stress_weight)
            .max(self.conflict_weight)
            .max(self.neutral_weight)
    }
}

/// One region of the fluid: derived pattern plus the live imprint buffer.
/// Created lazily on first imprint and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidRegionState {
    pub region_id: String,
    pub pattern: CrystalPattern,
    pub recent_imprints: Vec<Imprint>,
}

/// Read-only export of the whole fluid, derived on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidSnapshot {
    pub regions: BTreeMap<String, FluidRegionState>,
    pub last_global_update_ms: Option<i64>,
    pub flow_state: FlowState,
}

impl FluidSnapshot {
    /// Deterministic content hash of the snapshot. Imprint ids are excluded
    /// so two stores built from identical event content hash identically;
    /// region iteration order is fixed by the BTreeMap.
    pub fn state_hash(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();

        hasher.update(&(self.regions.len() as u64).to_le_bytes());
        for (region_id, region) in &self.regions {
            hash_str(&mut hasher, region_id);

            let p = &region.pattern;
            hash_f32(&mut hasher, p.coherence);
            hash_f32(&mut hasher, p.supportive_weight);
            hash_f32(&mut hasher, p.stress_weight);
            hash_f32(&mut hasher, p.conflict_weight);
            hash_f32(&mut hasher, p.neutral_weight);
            hasher.update(&[p.phase as u8]);
            hash_f32(&mut hasher, p.plasticity);
            hash_f32(&mut hasher, p.inertia);
            hasher.update(&p.last_updated_ms.to_le_bytes());

            hasher.update(&(region.recent_imprints.len() as u64).to_le_bytes());
            for imprint in &region.recent_imprints {
                hash_str(&mut hasher, &imprint.source_layer);
                hasher.update(&imprint.timestamp_ms.to_le_bytes());
                hasher.update(&[imprint.tone as u8]);
                hash_f32(&mut hasher, imprint.intensity);
                hasher.update(&(imprint.tags.len() as u64).to_le_bytes());
                for tag in &imprint.tags {
                    hash_str(&mut hasher, tag);
                }
            }
        }

        match self.last_global_update_ms {
            Some(ts) => {
                hasher.update(&[1u8]);
                hasher.update(&ts.to_le_bytes());
            }
            None => {
                hasher.update(&[0u8]);
            }
        }
        hasher.update(&[self.flow_state as u8]);

        *hasher.finalize().as_bytes()
    }
}

/// The live fluid store. Owned by exactly one tick loop; regions are
/// independent, so a host may shard by region if it serializes per-region
/// calls.
#[derive(Debug, Clone)]
pub struct InformationalFluid {
    cfg: FluidConfig,
    regions: BTreeMap<String, FluidRegionState>,
    last_pulse: Option<PulseBridge>,
    last_global_update_ms: Option<i64>,
}

impl InformationalFluid {
    pub fn new(cfg: FluidConfig) -> Self {
        Self {
            cfg,
            regions: BTreeMap::new(),
            last_pulse: None,
            last_global_update_ms: None,
        }
    }

    pub fn config(&self) -> &FluidConfig {
        &self.cfg
    }

    pub fn region(&self, region_id: &str) -> Option<&FluidRegionState> {
        self.regions.get(region_id)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Apply one imprint to its region, optionally coupled to the current
    /// pulse bridge. "Now" is the imprint's own timestamp; the fluid never
    /// reads a wall clock.
    pub fn apply_imprint(&mut self, imprint: Imprint, pulse: Option<&PulseBridge>) {
        let now_ms = imprint.timestamp_ms;
        let region_id = imprint.region_id.clone();

        if let Some(bridge) = pulse {
            self.last_pulse = Some(bridge.clone());
        }

        let region = self
            .regions
            .entry(region_id.clone())
            .or_insert_with(|| FluidRegionState {
                region_id: region_id.clone(),
                pattern: CrystalPattern::fresh(&self.cfg, now_ms),
                recent_imprints: Vec::new(),
            });

        region.recent_imprints.push(imprint);

        // Hard decay cutoff: evict everything older than 4 half-lives.
        let cutoff_ms = now_ms - DECAY_WINDOW_HALF_LIVES * self.cfg.imprint_half_life_ms;
        region
            .recent_imprints
            .retain(|i| i.timestamp_ms >= cutoff_ms);

        let previous_phase = region.pattern.phase;
        recalculate_pattern(&mut region.pattern, &region.recent_imprints, &self.cfg, now_ms);

        if let Some(bridge) = pulse {
            couple_pulse(&mut region.pattern, bridge);
        }

        if region.pattern.phase != previous_phase {
            debug!(
                region = %region.region_id,
                from = ?previous_phase,
                to = ?region.pattern.phase,
                coherence = region.pattern.coherence,
                "region phase transition"
            );
        }

        self.last_global_update_ms = Some(now_ms);
    }

    /// Global throughput classification, derived from average coherence and
    /// the last pulse bridge seen. Without any recorded pulse, flow is
    /// always normal.
    pub fn flow_state(&self) -> FlowState {
        let pulse = match &self.last_pulse {
            Some(p) => p,
            None => return FlowState::Normal,
        };

        let coherence = self.average_coherence();
        let drift_blocked = matches!(pulse.drift, Drift::Falling | Drift::Irregular);

        if coherence > 0.6
            && pulse.modulation_level > 0.6
            && !drift_blocked
            && matches!(pulse.phase, PulsePhase::Rise | PulsePhase::Peak)
        {
            FlowState::Amplified
        } else if pulse.modulation_level < 0.25 && drift_blocked {
            FlowState::Stalled
        } else {
            FlowState::Normal
        }
    }

    /// Mean coherence across all regions; 0.0 with no regions.
    pub fn average_coherence(&self) -> f32 {
        if self.regions.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.regions.values().map(|r| r.pattern.coherence).sum();
        sum / self.regions.len() as f32
    }

    pub fn last_pulse(&self) -> Option<&PulseBridge> {
        self.last_pulse.as_ref()
    }

    /// Derive the read-only export of the current fluid state.
    pub fn snapshot(&self) -> FluidSnapshot {
        let flow_state = self.flow_state();
        debug!(
            regions = self.regions.len(),
            ?flow_state,
            "fluid snapshot derived"
        );
        FluidSnapshot {
            regions: self.regions.clone(),
            last_global_update_ms: self.last_global_update_ms,
            flow_state,
        }
    }
}

/// Recompute tone weights, phase, and coherence from the surviving imprints.
/// All survivors count equally regardless of age.
fn recalculate_pattern(
    pattern: &mut CrystalPattern,
    imprints: &[Imprint],
    cfg: &FluidConfig,
    now_ms: i64,
) {
    pattern.supportive_weight = 0.0;
    pattern.stress_weight = 0.0;
    pattern.conflict_weight = 0.0;
    pattern.neutral_weight = 0.0;

    for imprint in imprints {
        let bucket = match imprint.tone {
            Tone::Supportive => &mut pattern.supportive_weight,
            Tone::Stress => &mut pattern.stress_weight,
            Tone::Conflict => &mut pattern.conflict_weight,
            Tone::Neutral => &mut pattern.neutral_weight,
        };
        *bucket += clamp01(imprint.intensity);
    }

    let total = pattern.total_weight();
    if total <= 0.0 {
        pattern.phase = FluidPhase::Fluid;
        pattern.coherence = 0.0;
        pattern.last_updated_ms = now_ms;
        return;
    }

    let sensitivity = cfg.phase_sensitivity.clamp(0.1, 2.0);
    let stress_metric = (pattern.stress_weight + pattern.conflict_weight) / total * sensitivity;
    let support_metric = pattern.supportive_weight / total * sensitivity;

    // Threshold order is part of the contract: the fluid check runs before
    // vapor and frozen.
    pattern.phase = if stress_metric < 0.1 && support_metric > 0.6 {
        FluidPhase::Fluid
    } else if stress_metric > 0.7 {
        FluidPhase::Vapor
    } else if support_metric < 0.1 && stress_metric > 0.4 {
        FluidPhase::Frozen
    } else {
        FluidPhase::Metastable
    };

    pattern.coherence = pattern.max_weight() / total;
    pattern.last_updated_ms = now_ms;
}

fn phase_shift(phase: PulsePhase) -> f32 {
    match phase {
        PulsePhase::Rise => 0.4,
        PulsePhase::Peak => 0.25,
        PulsePhase::Recovery => -0.15,
        PulsePhase::Rest => 0.0,
    }
}

fn drift_stability(drift: Drift) -> f32 {
    match drift {
        Drift::Rising => -0.1,
        Drift::Falling => 0.2,
        Drift::Irregular => 0.3,
        Drift::Stable => 0.0,
    }
}

/// Couple the incoming pulse into the region pattern. Plasticity and inertia
/// accumulate across calls (scar tissue); each field is clamped to [0, 1]
/// after adjustment.
fn couple_pulse(pattern: &mut CrystalPattern, bridge: &PulseBridge) {
    let shift = phase_shift(bridge.phase);
    let stability = drift_stability(bridge.drift);
    let modulation = clamp01(bridge.modulation_level);

    pattern.plasticity =
        clamp01(pattern.plasticity + modulation * 0.12 + shift * 0.08 - stability * 0.05);
    pattern.inertia = clamp01(pattern.inertia + stability * 0.1 - modulation * 0.05);
    pattern.coherence =
        clamp01(pattern.coherence + clamp01(bridge.baseline_level) * 0.05 + modulation * 0.05);
}
