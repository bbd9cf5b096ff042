//! Shared multi-criteria scoring core for the trajectory and wave engines.
//!
//! Both engines lower their candidate shapes into a [`CandidateView`] and run
//! the same four independent criteria (resonance, environment risk, luck
//! alignment, structural risk) before combining them under configured
//! weights. Unknown region references contribute nothing; an empty region
//! set falls back to the neutral 0.5 on both environment criteria.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScoringWeights;
use crate::domain::{clamp01, BreathingSnapshot, Drift, FluidPhase, LuckVector, PulseBridge};
use crate::fluid::FluidSnapshot;

// ============================================================================
// Decision inputs and outputs
// ============================================================================

/// Caller-supplied constraints, goals, and horizon for one decision call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecisionContext {
    pub forbidden_regions: Vec<String>,
    pub preferred_regions: Vec<String>,
    /// Hard constraint strings; `avoid:<tag>` is the recognized form.
    pub hard_constraints: Vec<String>,
    pub goals: Vec<String>,
    /// Decision horizon in ticks. 0 disables the overrun penalty.
    pub horizon_ticks: u32,
}

/// Optional bias applied from the live organism state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseBias {
    Protective,
    Expansive,
}

/// Live pulse/breathing/fluid context a decision call may be biased by.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowContext {
    pub pulse: Option<PulseBridge>,
    pub breathing: Option<BreathingSnapshot>,
    /// Aggregate fluid coherence, when the caller has it at hand.
    pub coherence_hint: Option<f32>,
    pub phase_bias: Option<PhaseBias>,
}

/// The four criteria plus their weighted combination for one candidate.
/// `combined_score` is the only unbounded field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScores {
    pub resonance_score: f32,
    pub luck_alignment: f32,
    pub environment_risk: f32,
    pub structural_risk: f32,
    pub combined_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate<C> {
    pub candidate: C,
    pub scores: CandidateScores,
}

/// Ranked decision returned to the caller. The engines hold no history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision<C> {
    pub chosen: Option<C>,
    pub ranked: Vec<RankedCandidate<C>>,
    pub context: DecisionContext,
    pub reason_summary: String,
}

impl<C> Decision<C> {
    pub(crate) fn empty(context: DecisionContext) -> Self {
        Self {
            chosen: None,
            ranked: Vec::new(),
            context,
            reason_summary: "no candidates".to_string(),
        }
    }
}

// ============================================================================
// Candidate view
// ============================================================================

/// Uniform borrow of one candidate, as seen by the scoring core. The
/// trajectory engine repeats a region once per step touching it, so the
/// per-pair averaging weights regions by how often a candidate passes
/// through them.
#[derive(Debug, Clone)]
pub(crate) struct CandidateView<'a> {
    pub label: &'a str,
    pub gain: f32,
    pub cost: f32,
    pub risk: f32,
    pub horizon_ticks: u32,
    pub tags: &'a [String],
    pub region_pairs: Vec<&'a str>,
}

fn resonance_base(phase: FluidPhase) -> f32 {
    match phase {
        FluidPhase::Fluid => 0.8,
        FluidPhase::Metastable => 0.6,
        FluidPhase::Frozen => 0.3,
        FluidPhase::Vapor => 0.2,
    }
}

fn environment_base(phase: FluidPhase) -> f32 {
    match phase {
        FluidPhase::Fluid => 0.2,
        FluidPhase::Metastable => 0.4,
        FluidPhase::Frozen => 0.7,
        FluidPhase::Vapor => 0.8,
    }
}

/// Average resonance across all known (pair, region) references; 0.5 when
/// nothing matches.
fn resonance_score(view: &CandidateView<'_>, environment: &FluidSnapshot) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for region_id in &view.region_pairs {
        if let Some(region) = environment.regions.get(*region_id) {
            let p = &region.pattern;
            sum += resonance_base(p.phase) * 0.6 + p.coherence * 0.3 + (1.0 - p.inertia) * 0.1;
            count += 1;
        }
    }
    if count == 0 {
        0.5
    } else {
        clamp01(sum / count as f32)
    }
}

/// Symmetric mapping with inverted base scores.
fn environment_risk(view: &CandidateView<'_>, environment: &FluidSnapshot) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for region_id in &view.region_pairs {
        if let Some(region) = environment.regions.get(*region_id) {
            let p = &region.pattern;
            sum += environment_base(p.phase) * 0.6 + (1.0 - p.coherence) * 0.3 + p.inertia * 0.1;
            count += 1;
        }
    }
    if count == 0 {
        0.5
    } else {
        clamp01(sum / count as f32)
    }
}

/// How much upheaval a candidate implies: blend of gain, risk, cost, and
/// inverse horizon (short horizons read as more abrupt).
fn change_intensity(view: &CandidateView<'_>) -> f32 {
    let inv_horizon = 1.0 / (1.0 + view.horizon_ticks as f32);
    clamp01(view.gain * 0.35 + view.risk * 0.3 + view.cost * 0.2 + inv_horizon * 0.15)
}

fn luck_alignment(view: &CandidateView<'_>, luck: &LuckVector) -> f32 {
    let tag_fraction = if luck.focus_tags.is_empty() {
        0.5
    } else {
        let matched = luck
            .focus_tags
            .iter()
            .filter(|t| view.tags.contains(t))
            .count();
        matched as f32 / luck.focus_tags.len() as f32
    };

    let risk_fit = 1.0 - (view.risk - clamp01(luck.risk_appetite)).abs();
    let change_fit = 1.0 - (change_intensity(view) - clamp01(luck.change_drive)).abs();

    clamp01((tag_fraction + clamp01(risk_fit) + clamp01(change_fit)) / 3.0)
}

fn structural_risk(view: &CandidateView<'_>) -> f32 {
    clamp01(view.risk * 0.7 + view.cost * 0.3)
}

/// Combined-score bias from the live flow context. Protective and expansive
/// adjustments are independent checks, not an either/or.
fn flow_bias(
    scores: &CandidateScores,
    gain: f32,
    flow: &FlowContext,
) -> f32 {
    let mut bias = 0.0f32;
    let risk_signal = (scores.environment_risk + scores.structural_risk) / 2.0;

    let overloaded = flow
        .pulse
        .as_ref()
        .is_some_and(|p| p.overload_level > 0.6);
    if flow.phase_bias == Some(PhaseBias::Protective) || overloaded {
        bias -= risk_signal * 0.12;
        bias += (1.0 - risk_signal) * 0.06;
    }

    let surging = flow.pulse.as_ref().is_some_and(|p| {
        p.readiness > 0.62 && matches!(p.drift, Drift::Rising | Drift::Stable)
    });
    if flow.phase_bias == Some(PhaseBias::Expansive) || surging {
        bias += clamp01(gain) * 0.1;
    }

    if let Some(hint) = flow.coherence_hint {
        if hint > 0.6 {
            bias += (hint - 0.5) * 0.08;
        }
    }

    bias
}

/// Score one candidate against the environment, luck vector, and optional
/// flow context. `context_penalty` is pre-computed by the engine (only the
/// trajectory engine has one).
pub(crate) fn score_candidate(
    view: &CandidateView<'_>,
    environment: &FluidSnapshot,
    luck: &LuckVector,
    weights: &ScoringWeights,
    context_penalty: f32,
    flow: Option<&FlowContext>,
) -> CandidateScores {
    let resonance = resonance_score(view, environment);
    let luck_fit = luck_alignment(view, luck);
    let env_risk = environment_risk(view, environment);
    let struct_risk = structural_risk(view);

    let mut combined = resonance * weights.weight_resonance
        + luck_fit * weights.weight_luck
        + clamp01(view.gain) * weights.weight_gain
        - ((env_risk + struct_risk) / 2.0) * weights.weight_risk
        - context_penalty;

    let mut scores = CandidateScores {
        resonance_score: resonance,
        luck_alignment: luck_fit,
        environment_risk: env_risk,
        structural_risk: struct_risk,
        combined_score: combined,
    };

    if let Some(flow) = flow {
        combined += flow_bias(&scores, view.gain, flow);
        scores.combined_score = combined;
    }

    debug!(
        candidate = view.label,
        resonance,
        luck = luck_fit,
        env_risk,
        struct_risk,
        combined = scores.combined_score,
        "candidate scored"
    );

    scores
}

/// Sort scored candidates descending by combined score. The sort is stable,
/// so equal scores keep their input order and the ranking stays
/// deterministic.
pub(crate) fn sort_ranked<C>(ranked: &mut [RankedCandidate<C>]) {
    ranked.sort_by(|a, b| {
        b.scores
            .combined_score
            .partial_cmp(&a.scores.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Deterministic human-readable summary of a ranking: winning label, its
/// three sub-scores, and the runner-up's score delta, all to two decimals.
pub(crate) fn reason_summary<C>(
    ranked: &[RankedCandidate<C>],
    label_of: impl Fn(&C) -> &str,
    below_bar: bool,
) -> String {
    let top = match ranked.first() {
        Some(t) => t,
        None => return "no candidates".to_string(),
    };

    let mut summary = String::new();
    if below_bar {
        summary.push_str("below minimum bar; ");
    }
    summary.push_str(&format!(
        "chose '{}' (resonance {:.2}, luck {:.2}, risk {:.2})",
        label_of(&top.candidate),
        top.scores.resonance_score,
        top.scores.luck_alignment,
        top.scores.environment_risk,
    ));

    if let Some(runner_up) = ranked.get(1) {
        summary.push_str(&format!(
            "; runner-up '{}' trails by {:.2}",
            label_of(&runner_up.candidate),
            top.scores.combined_score - runner_up.scores.combined_score,
        ));
    }

    summary
}
