//! Trajectory harmonizer: ranks multi-step future-action candidates against
//! the fluid environment, the luck vector, and the decision context, with an
//! additive context penalty on top of the shared scoring core.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TrajectoryConfig;
use crate::domain::{clamp01, LuckVector};
use crate::fluid::FluidSnapshot;
use crate::scoring::{
    reason_summary, score_candidate, sort_ranked, CandidateView, Decision, DecisionContext,
    FlowContext, RankedCandidate,
};

/// One step of a candidate trajectory and the regions it passes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub label: String,
    pub regions: Vec<String>,
}

/// A caller-proposed future action path. Immutable per decision call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryCandidate {
    pub label: String,
    pub steps: Vec<TrajectoryStep>,
    pub predicted_gain: f32,
    pub predicted_cost: f32,
    pub predicted_risk: f32,
    pub horizon_ticks: u32,
    pub tags: Vec<String>,
}

impl TrajectoryCandidate {
    /// Every (step, region) pair, regions repeated once per step touching
    /// them. This is the unit the environment criteria average over.
    fn region_pairs(&self) -> Vec<&str> {
        self.steps
            .iter()
            .flat_map(|s| s.regions.iter().map(String::as_str))
            .collect()
    }

    fn touched_regions_contain(&self, region: &str) -> bool {
        self.steps.iter().any(|s| s.regions.iter().any(|r| r == region))
    }
}

#[derive(Debug, Clone)]
pub struct TrajectoryHarmonizer {
    cfg: TrajectoryConfig,
}

impl TrajectoryHarmonizer {
    pub fn new(cfg: TrajectoryConfig) -> Self {
        Self { cfg }
    }

    /// Rank the candidates and pick the top one. Total: an empty candidate
    /// list yields an empty decision, never an error.
    pub fn decide(
        &self,
        candidates: &[TrajectoryCandidate],
        context: &DecisionContext,
        environment: &FluidSnapshot,
        luck: &LuckVector,
        flow: Option<&FlowContext>,
    ) -> Decision<TrajectoryCandidate> {
        if candidates.is_empty() {
            warn!("trajectory decision requested with no candidates");
            return Decision::empty(context.clone());
        }

        let mut ranked: Vec<RankedCandidate<TrajectoryCandidate>> = candidates
            .iter()
            .map(|candidate| {
                let view = CandidateView {
                    label: &candidate.label,
                    gain: clamp01(candidate.predicted_gain),
                    cost: clamp01(candidate.predicted_cost),
                    risk: clamp01(candidate.predicted_risk),
                    horizon_ticks: candidate.horizon_ticks,
                    tags: &candidate.tags,
                    region_pairs: candidate.region_pairs(),
                };
                let penalty = context_penalty(candidate, context);
                let scores =
                    score_candidate(&view, environment, luck, &self.cfg.weights, penalty, flow);
                RankedCandidate {
                    candidate: candidate.clone(),
                    scores,
                }
            })
            .collect();

        sort_ranked(&mut ranked);
        let summary = reason_summary(&ranked, |c| c.label.as_str(), false);
        info!(
            chosen = %ranked[0].candidate.label,
            combined = ranked[0].scores.combined_score,
            "trajectory decided"
        );

        Decision {
            chosen: Some(ranked[0].candidate.clone()),
            ranked,
            context: context.clone(),
            reason_summary: summary,
        }
    }
}

/// Additive penalties for violating the decision context.
fn context_penalty(candidate: &TrajectoryCandidate, context: &DecisionContext) -> f32 {
    let mut penalty = 0.0f32;

    if context
        .forbidden_regions
        .iter()
        .any(|r| candidate.touched_regions_contain(r))
    {
        penalty += 0.5;
    }

    if !context.preferred_regions.is_empty() {
        let covered = context
            .preferred_regions
            .iter()
            .filter(|r| candidate.touched_regions_contain(r))
            .count();
        let coverage = covered as f32 / context.preferred_regions.len() as f32;
        penalty += 0.3 * (1.0 - coverage);
    }

    for constraint in &context.hard_constraints {
        if let Some(avoided_tag) = constraint.strip_prefix("avoid:") {
            if candidate.tags.iter().any(|t| t == avoided_tag) {
                penalty += 0.4;
            }
        }
    }

    if context.horizon_ticks > 0 && candidate.horizon_ticks > context.horizon_ticks {
        let overrun = (candidate.horizon_ticks - context.horizon_ticks) as f32
            / context.horizon_ticks as f32;
        penalty += (overrun * 0.2).min(0.2);
    }

    penalty
}
