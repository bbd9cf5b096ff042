//! High-level orchestrator tying the pipeline together for one tick loop:
//! pulse ingestion, imprint application with automatic pulse coupling, and
//! the two decision engines fed from the live environment.
//!
//! All state lives in this explicit object; there are no module-level
//! registries or singletons anywhere in the crate.

use blake3::Hasher;
use tracing::debug;

use crate::config::SomaConfig;
use crate::domain::{
    hash_f32, BreathingMode, BreathingSnapshot, Imprint, LuckVector, ModulationInputs,
    PulseBaseline, PulseBridge, PulseSample,
};
use crate::fluid::{FluidSnapshot, InformationalFluid};
use crate::pulse::{build_snapshot, PulseSnapshot};
use crate::scoring::{Decision, DecisionContext, FlowContext, PhaseBias};
use crate::trajectory::{TrajectoryCandidate, TrajectoryHarmonizer};
use crate::wave::{WaveChoiceEngine, WaveOption};

pub struct SomaEngine {
    cfg: SomaConfig,
    fluid: InformationalFluid,
    harmonizer: TrajectoryHarmonizer,
    waves: WaveChoiceEngine,
    last_bridge: Option<PulseBridge>,
}

impl SomaEngine {
    pub fn new(cfg: SomaConfig) -> Self {
        let fluid = InformationalFluid::new(cfg.fluid.clone());
        let harmonizer = TrajectoryHarmonizer::new(cfg.trajectory.clone());
        let waves = WaveChoiceEngine::new(cfg.wave.clone());
        Self {
            cfg,
            fluid,
            harmonizer,
            waves,
            last_bridge: None,
        }
    }

    pub fn config(&self) -> &SomaConfig {
        &self.cfg
    }

    /// Fold the caller's sample window into a pulse snapshot and retain its
    /// bridge for subsequent imprint coupling.
    pub fn ingest_pulse(
        &mut self,
        history: &[PulseSample],
        latest: &PulseSample,
        inputs: &ModulationInputs,
        baseline_override: Option<PulseBaseline>,
    ) -> PulseSnapshot {
        let snapshot = build_snapshot(history, latest, inputs, baseline_override, &self.cfg.pulse);
        self.last_bridge = Some(snapshot.bridge());
        snapshot
    }

    /// Apply one imprint, coupled to the most recent pulse bridge if one has
    /// been ingested this session.
    pub fn imprint(&mut self, imprint: Imprint) {
        let bridge = self.last_bridge.clone();
        self.fluid.apply_imprint(imprint, bridge.as_ref());
    }

    pub fn last_bridge(&self) -> Option<&PulseBridge> {
        self.last_bridge.as_ref()
    }

    pub fn fluid(&self) -> &InformationalFluid {
        &self.fluid
    }

    pub fn fluid_snapshot(&self) -> FluidSnapshot {
        self.fluid.snapshot()
    }

    /// Assemble the decision-stage flow context from live state. The phase
    /// bias maps from the breathing snapshot: an unstable cadence reads as
    /// protective, a stable surge as expansive.
    pub fn flow_context(&self, breathing: Option<BreathingSnapshot>) -> FlowContext {
        let phase_bias = breathing.and_then(|b| {
            if b.stability < 0.35 {
                Some(PhaseBias::Protective)
            } else if b.mode == BreathingMode::Surge && b.stability >= 0.6 {
                Some(PhaseBias::Expansive)
            } else {
                None
            }
        });

        let coherence_hint = if self.fluid.region_count() > 0 {
            Some(self.fluid.average_coherence())
        } else {
            None
        };

        debug!(?phase_bias, ?coherence_hint, "flow context assembled");

        FlowContext {
            pulse: self.last_bridge.clone(),
            breathing,
            coherence_hint,
            phase_bias,
        }
    }

    pub fn decide_trajectories(
        &self,
        candidates: &[TrajectoryCandidate],
        context: &DecisionContext,
        luck: &LuckVector,
        breathing: Option<BreathingSnapshot>,
    ) -> Decision<TrajectoryCandidate> {
        let environment = self.fluid.snapshot();
        let flow = self.flow_context(breathing);
        self.harmonizer
            .decide(candidates, context, &environment, luck, Some(&flow))
    }

    pub fn decide_waves(
        &self,
        options: &[WaveOption],
        context: &DecisionContext,
        luck: &LuckVector,
        breathing: Option<BreathingSnapshot>,
    ) -> Decision<WaveOption> {
        let environment = self.fluid.snapshot();
        let flow = self.flow_context(breathing);
        self.waves
            .decide(options, context, &environment, luck, Some(&flow))
    }

    /// Deterministic hash over the engine's evolved state: the fluid
    /// snapshot plus the retained pulse bridge.
    pub fn state_hash(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(&self.fluid.snapshot().state_hash());

        match &self.last_bridge {
            Some(bridge) => {
                hasher.update(&[1u8]);
                hasher.update(&[bridge.phase as u8]);
                hasher.update(&[bridge.drift as u8]);
                hash_f32(&mut hasher, bridge.modulation_level);
                hash_f32(&mut hasher, bridge.baseline_level);
                hash_f32(&mut hasher, bridge.overload_level);
                hash_f32(&mut hasher, bridge.readiness);
            }
            None => {
                hasher.update(&[0u8]);
            }
        }

        *hasher.finalize().as_bytes()
    }
}
