//! Pulse drift classifier: reduces a short ordered history of pulse states to
//! a single trend label.
//!
//! The walk tracks monotonicity with a dead-band and counts direction flips
//! separately; two or more flips classify the window as irregular before any
//! net-trend check runs, so high-frequency oscillation always dominates a
//! weak net trend.

use crate::config::PulseConfig;
use crate::domain::{Drift, PulseState};

/// Dead-band for the monotonicity flags. A single excursion beyond this in
/// the wrong direction kills the flag for the whole window.
const MONO_TOLERANCE: f32 = 0.02;

/// A difference only counts as a directional sign once it exceeds this.
const FLIP_THRESHOLD: f32 = 0.08;

/// Minimum total window change for a rising/falling verdict.
const NET_CHANGE_THRESHOLD: f32 = 0.07;

/// Classify the drift of an ordered (oldest -> newest) pulse-state history.
///
/// Fails closed: fewer than 2 samples always yields `Drift::Stable`.
pub fn classify_drift(history: &[PulseState], cfg: &PulseConfig) -> Drift {
    let window = cfg.max_window.max(2);
    let start = history.len().saturating_sub(window);
    let recent = &history[start..];

    if recent.len() < 2 {
        return Drift::Stable;
    }

    let levels: Vec<f32> = recent.iter().map(PulseState::signal_level).collect();

    let mut mono_inc = true;
    let mut mono_dec = true;
    let mut flips = 0u32;
    let mut last_dir: Option<bool> = None;

    for pair in levels.windows(2) {
        let diff = pair[1] - pair[0];

        if diff < -MONO_TOLERANCE {
            mono_inc = false;
        }
        if diff > MONO_TOLERANCE {
            mono_dec = false;
        }

        if diff.abs() > FLIP_THRESHOLD {
            let dir_up = diff > 0.0;
            if let Some(prev) = last_dir {
                if prev != dir_up {
                    flips += 1;
                }
            }
            last_dir = Some(dir_up);
        }
    }

    // Oscillation check runs first: it wins over any net trend.
    if flips >= 2 {
        return Drift::Irregular;
    }

    let net = levels[levels.len() - 1] - levels[0];
    if mono_inc && net > NET_CHANGE_THRESHOLD {
        Drift::Rising
    } else if mono_dec && -net > NET_CHANGE_THRESHOLD {
        Drift::Falling
    } else {
        Drift::Stable
    }
}
