//! Pulse modulation: combines the drift label with external influences into
//! a bounded intensity/phase-steering signal.

use crate::domain::{clamp01, clamp_signed, Drift, ModulationInputs, PulseModulation, Rhythm};

/// Baseline adjustment contributed by the drift label.
fn drift_base_adjust(drift: Drift) -> f32 {
    match drift {
        Drift::Rising => 0.1,
        Drift::Stable => 0.0,
        Drift::Falling => -0.1,
        Drift::Irregular => -0.15,
    }
}

/// Derive the modulation signal for one tick. Total over its domain: missing
/// influences resolve to neutral values and every output is clamped.
pub fn modulate(drift: Drift, inputs: &ModulationInputs) -> PulseModulation {
    let r = inputs.resolved();

    let modulation_level = clamp01(
        0.5 + drift_base_adjust(drift) + r.uplift * 0.25 - r.tension * 0.25
            + r.luck * 0.15
            + r.breathing * 0.05,
    );

    let phase_coefficient = clamp_signed(r.luck * 0.4 + r.foresight * 0.4 - r.tension * 0.3);

    let stabilized = r.breathing >= 0.5 && drift != Drift::Irregular && modulation_level <= 0.95;

    let recommended_rhythm = if modulation_level < 0.3 {
        Rhythm::Slow
    } else if modulation_level > 0.7 {
        Rhythm::Fast
    } else {
        Rhythm::Neutral
    };

    PulseModulation {
        modulation_level,
        phase_coefficient,
        stabilized,
        recommended_rhythm,
    }
}
