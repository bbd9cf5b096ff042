//! Wave choice engine: the flat-option sibling of the trajectory harmonizer.
//! Same scoring core, no context penalty, and an optional minimum-score bar
//! that can withhold the pick while still returning the full ranking.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::WaveConfig;
use crate::domain::{clamp01, LuckVector};
use crate::fluid::FluidSnapshot;
use crate::scoring::{
    reason_summary, score_candidate, sort_ranked, CandidateView, Decision, DecisionContext,
    FlowContext, RankedCandidate,
};

/// A caller-proposed wave option. Immutable per decision call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveOption {
    pub label: String,
    pub regions: Vec<String>,
    pub expected_gain: f32,
    pub effort_cost: f32,
    pub turbulence: f32,
    pub span_ticks: u32,
    pub themes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WaveChoiceEngine {
    cfg: WaveConfig,
}

impl WaveChoiceEngine {
    pub fn new(cfg: WaveConfig) -> Self {
        Self { cfg }
    }

    /// Rank the options and pick the top one, unless a configured minimal
    /// acceptable score is unmet, in which case `chosen` is None and the
    /// ranking is still returned.
    pub fn decide(
        &self,
        options: &[WaveOption],
        context: &DecisionContext,
        environment: &FluidSnapshot,
        luck: &LuckVector,
        flow: Option<&FlowContext>,
    ) -> Decision<WaveOption> {
        if options.is_empty() {
            warn!("wave decision requested with no options");
            return Decision::empty(context.clone());
        }

        let mut ranked: Vec<RankedCandidate<WaveOption>> = options
            .iter()
            .map(|option| {
                let view = CandidateView {
                    label: &option.label,
                    gain: clamp01(option.expected_gain),
                    cost: clamp01(option.effort_cost),
                    risk: clamp01(option.turbulence),
                    horizon_ticks: option.span_ticks,
                    tags: &option.themes,
                    region_pairs: option.regions.iter().map(String::as_str).collect(),
                };
                let scores =
                    score_candidate(&view, environment, luck, &self.cfg.weights, 0.0, flow);
                RankedCandidate {
                    candidate: option.clone(),
                    scores,
                }
            })
            .collect();

        sort_ranked(&mut ranked);

        let below_bar = self
            .cfg
            .minimal_acceptable_score
            .is_some_and(|bar| ranked[0].scores.combined_score < bar);
        let summary = reason_summary(&ranked, |o| o.label.as_str(), below_bar);

        let chosen = if below_bar {
            info!(
                top = %ranked[0].candidate.label,
                combined = ranked[0].scores.combined_score,
                "wave ranking withheld below minimum bar"
            );
            None
        } else {
            info!(
                chosen = %ranked[0].candidate.label,
                combined = ranked[0].scores.combined_score,
                "wave decided"
            );
            Some(ranked[0].candidate.clone())
        };

        Decision {
            chosen,
            ranked,
            context: context.clone(),
            reason_summary: summary,
        }
    }
}
