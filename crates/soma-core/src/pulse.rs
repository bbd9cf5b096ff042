//! Pulse snapshot builder: folds a short raw-sample history plus the latest
//! sample into a complete pulse state and the reduced bridge snapshot that
//! the fluid and decision stages consume.

use tracing::debug;

use crate::config::PulseConfig;
use crate::domain::{
    clamp01, Drift, ModulationInputs, ModulationState, PulseBaseline, PulseBridge,
    PulseModulation, PulseSample, PulseState,
};
use crate::drift::classify_drift;
use crate::modulation::modulate;

/// Builder output: the full pulse state plus the modulation signal derived
/// alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseSnapshot {
    pub state: PulseState,
    pub modulation: PulseModulation,
}

impl PulseSnapshot {
    /// Reduce to the bridge record exchanged with downstream layers.
    pub fn bridge(&self) -> PulseBridge {
        PulseBridge {
            phase: self.state.current.phase,
            drift: self.state.drift.unwrap_or_default(),
            modulation_level: self.modulation.modulation_level,
            baseline_level: self.state.baseline.intensity,
            overload_level: self.state.overload_level,
            readiness: self.state.readiness,
            current: self.state.current,
            baseline: self.state.baseline,
        }
    }
}

/// Derive the fallback baseline from the sample window: mean intensity, and
/// stability as one minus mean variability. An explicit override wins.
fn derive_baseline(
    history: &[PulseSample],
    latest: &PulseSample,
    override_baseline: Option<PulseBaseline>,
) -> PulseBaseline {
    if let Some(b) = override_baseline {
        return PulseBaseline::new(b.intensity, b.stability);
    }

    let window: Vec<&PulseSample> = if history.is_empty() {
        vec![latest]
    } else {
        history.iter().collect()
    };
    let n = window.len() as f32;
    let mean_intensity = window.iter().map(|s| clamp01(s.intensity)).sum::<f32>() / n;
    let mean_variability = window.iter().map(|s| clamp01(s.variability)).sum::<f32>() / n;

    PulseBaseline::new(mean_intensity, 1.0 - mean_variability)
}

fn overload_for(sample: &PulseSample, baseline: &PulseBaseline) -> f32 {
    clamp01(
        sample.overload_risk * 0.6
            + sample.variability * 0.25
            + (1.0 - baseline.stability) * 0.15,
    )
}

fn readiness_for(baseline: &PulseBaseline, overload_level: f32, drift: Drift) -> f32 {
    let drift_bonus = match drift {
        Drift::Rising => 0.07,
        Drift::Falling => -0.05,
        _ => 0.0,
    };
    clamp01(baseline.stability * 0.6 + (1.0 - overload_level) * 0.3 + drift_bonus)
}

/// Build the pulse snapshot for one tick.
///
/// Pure over its inputs: the same history, latest sample, influences, and
/// baseline override always produce the same snapshot.
pub fn build_snapshot(
    history: &[PulseSample],
    latest: &PulseSample,
    inputs: &ModulationInputs,
    baseline_override: Option<PulseBaseline>,
    cfg: &PulseConfig,
) -> PulseSnapshot {
    let baseline = derive_baseline(history, latest, baseline_override);
    let resolved = inputs.resolved();
    let modulation_state = ModulationState {
        breathing_influence: resolved.breathing,
        luck_influence: resolved.luck,
        emotional_influence: clamp01(0.5 + (resolved.uplift - resolved.tension) * 0.5),
    };

    // Interim states over history + latest feed the drift walk; readiness and
    // the drift label are filled in on the final state only.
    let states: Vec<PulseState> = history
        .iter()
        .chain(std::iter::once(latest))
        .map(|sample| PulseState {
            baseline,
            current: *sample,
            modulation: modulation_state,
            readiness: 0.0,
            overload_level: overload_for(sample, &baseline),
            drift: None,
        })
        .collect();

    let drift = classify_drift(&states, cfg);
    let modulation = modulate(drift, inputs);

    let overload_level = overload_for(latest, &baseline);
    let readiness = readiness_for(&baseline, overload_level, drift);

    debug!(
        ?drift,
        modulation_level = modulation.modulation_level,
        overload_level,
        readiness,
        "pulse snapshot built"
    );

    PulseSnapshot {
        state: PulseState {
            baseline,
            current: *latest,
            modulation: modulation_state,
            readiness,
            overload_level,
            drift: Some(drift),
        },
        modulation,
    }
}
