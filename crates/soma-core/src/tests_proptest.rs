//! Property-based tests for the pipeline's range and totality invariants.

use proptest::prelude::*;

use crate::config::{FluidConfig, PulseConfig, WaveConfig};
use crate::domain::{
    Drift, Imprint, ModulationInputs, ModulationState, PulseBaseline, PulsePhase, PulseSample,
    PulseState, Tone,
};
use crate::drift::classify_drift;
use crate::fluid::InformationalFluid;
use crate::modulation::modulate;
use crate::scoring::DecisionContext;
use crate::wave::{WaveChoiceEngine, WaveOption};
use crate::LuckVector;

fn any_drift() -> impl Strategy<Value = Drift> {
    prop_oneof![
        Just(Drift::Rising),
        Just(Drift::Falling),
        Just(Drift::Stable),
        Just(Drift::Irregular),
    ]
}

fn any_tone() -> impl Strategy<Value = Tone> {
    prop_oneof![
        Just(Tone::Supportive),
        Just(Tone::Neutral),
        Just(Tone::Stress),
        Just(Tone::Conflict),
    ]
}

fn state_at(level: f32) -> PulseState {
    PulseState {
        baseline: PulseBaseline::new(level, 0.5),
        current: PulseSample::new(level, level, PulsePhase::Rest, 0.0),
        modulation: ModulationState::default(),
        readiness: 0.0,
        overload_level: level,
        drift: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn modulation_outputs_stay_in_range(
        drift in any_drift(),
        tension in -10.0f32..10.0,
        uplift in -10.0f32..10.0,
        luck in -10.0f32..10.0,
        breathing in -10.0f32..10.0,
        foresight in -10.0f32..10.0,
    ) {
        let inputs = ModulationInputs {
            sense_tension: Some(tension),
            sense_uplift: Some(uplift),
            luck_resonance: Some(luck),
            breathing_coherence: Some(breathing),
            foresight_phase: Some(foresight),
        };
        let m = modulate(drift, &inputs);
        prop_assert!((0.0..=1.0).contains(&m.modulation_level));
        prop_assert!((-1.0..=1.0).contains(&m.phase_coefficient));
    }

    #[test]
    fn drift_is_total_and_idempotent(levels in proptest::collection::vec(0.0f32..=1.0, 0..10)) {
        let cfg = PulseConfig::default();
        let history: Vec<PulseState> = levels.iter().copied().map(state_at).collect();
        let first = classify_drift(&history, &cfg);
        let second = classify_drift(&history, &cfg);
        prop_assert_eq!(first, second);
        if history.len() < 2 {
            prop_assert_eq!(first, Drift::Stable);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn fluid_pattern_fields_stay_in_range(
        events in proptest::collection::vec(
            (0i64..100_000, any_tone(), -2.0f32..2.0),
            1..40,
        ),
    ) {
        let mut fluid = InformationalFluid::new(FluidConfig::default());
        let mut last_ts = 0i64;
        for (dt, tone, intensity) in events {
            last_ts += dt;
            fluid.apply_imprint(
                Imprint::new("alpha", "prop", last_ts, tone, intensity, Vec::new()),
                None,
            );
            let pattern = &fluid.region("alpha").unwrap().pattern;
            prop_assert!((0.0..=1.0).contains(&pattern.coherence));
            prop_assert!((0.0..=1.0).contains(&pattern.plasticity));
            prop_assert!((0.0..=1.0).contains(&pattern.inertia));
            prop_assert!(pattern.supportive_weight >= 0.0);
            prop_assert!(pattern.stress_weight >= 0.0);
        }
    }

    #[test]
    fn wave_ranking_is_a_permutation_with_bounded_subscores(
        gains in proptest::collection::vec(0.0f32..=1.0, 1..8),
    ) {
        let options: Vec<WaveOption> = gains
            .iter()
            .enumerate()
            .map(|(i, g)| WaveOption {
                label: format!("opt-{}", i),
                regions: Vec::new(),
                expected_gain: *g,
                effort_cost: 0.3,
                turbulence: 1.0 - *g,
                span_ticks: 3,
                themes: Vec::new(),
            })
            .collect();

        let engine = WaveChoiceEngine::new(WaveConfig::default());
        let fluid = InformationalFluid::new(FluidConfig::default());
        let decision = engine.decide(
            &options,
            &DecisionContext::default(),
            &fluid.snapshot(),
            &LuckVector::default(),
            None,
        );

        prop_assert_eq!(decision.ranked.len(), options.len());
        for option in &options {
            prop_assert!(decision.ranked.iter().any(|r| r.candidate.label == option.label));
        }
        for ranked in &decision.ranked {
            let s = &ranked.scores;
            prop_assert!((0.0..=1.0).contains(&s.resonance_score));
            prop_assert!((0.0..=1.0).contains(&s.luck_alignment));
            prop_assert!((0.0..=1.0).contains(&s.environment_risk));
            prop_assert!((0.0..=1.0).contains(&s.structural_risk));
        }
        for pair in decision.ranked.windows(2) {
            prop_assert!(pair[0].scores.combined_score >= pair[1].scores.combined_score);
        }
    }
}
