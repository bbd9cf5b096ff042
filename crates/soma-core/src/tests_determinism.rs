//! Determinism tests: canonical float hashing and snapshot state hashes.

use crate::config::FluidConfig;
use crate::domain::{Drift, Imprint, PulseBaseline, PulseBridge, PulsePhase, PulseSample, Tone};
use crate::fluid::InformationalFluid;

fn imprint(region: &str, ts: i64, tone: Tone, intensity: f32) -> Imprint {
    Imprint::new(region, "test", ts, tone, intensity, vec!["tag".to_string()])
}

fn populated_fluid() -> InformationalFluid {
    let mut fluid = InformationalFluid::new(FluidConfig::default());
    fluid.apply_imprint(imprint("alpha", 100, Tone::Supportive, 0.5), None);
    fluid.apply_imprint(imprint("beta", 200, Tone::Stress, 0.7), None);
    fluid.apply_imprint(imprint("alpha", 300, Tone::Neutral, 0.2), None);
    fluid
}

#[test]
fn identical_histories_hash_identically() {
    let a = populated_fluid().snapshot();
    let b = populated_fluid().snapshot();
    // Imprint ids differ between the two stores; the content hash must not.
    assert_eq!(a.state_hash(), b.state_hash());
}

#[test]
fn hash_is_stable_across_repeated_reads() {
    let fluid = populated_fluid();
    assert_eq!(fluid.snapshot().state_hash(), fluid.snapshot().state_hash());
}

#[test]
fn intensity_drift_beyond_epsilon_changes_the_hash() {
    let mut a = InformationalFluid::new(FluidConfig::default());
    a.apply_imprint(imprint("alpha", 100, Tone::Supportive, 0.123_456), None);

    let mut b = InformationalFluid::new(FluidConfig::default());
    b.apply_imprint(imprint("alpha", 100, Tone::Supportive, 0.123_458), None);

    assert_ne!(a.snapshot().state_hash(), b.snapshot().state_hash());
}

#[test]
fn tone_and_timestamp_affect_the_hash() {
    let mut a = InformationalFluid::new(FluidConfig::default());
    a.apply_imprint(imprint("alpha", 100, Tone::Supportive, 0.5), None);

    let mut b = InformationalFluid::new(FluidConfig::default());
    b.apply_imprint(imprint("alpha", 100, Tone::Neutral, 0.5), None);
    assert_ne!(a.snapshot().state_hash(), b.snapshot().state_hash());

    let mut c = InformationalFluid::new(FluidConfig::default());
    c.apply_imprint(imprint("alpha", 101, Tone::Supportive, 0.5), None);
    assert_ne!(a.snapshot().state_hash(), c.snapshot().state_hash());
}

#[test]
fn region_insertion_order_does_not_affect_the_hash() {
    let mut forward = InformationalFluid::new(FluidConfig::default());
    forward.apply_imprint(imprint("alpha", 100, Tone::Supportive, 0.5), None);
    forward.apply_imprint(imprint("beta", 100, Tone::Supportive, 0.5), None);

    let mut reverse = InformationalFluid::new(FluidConfig::default());
    reverse.apply_imprint(imprint("beta", 100, Tone::Supportive, 0.5), None);
    reverse.apply_imprint(imprint("alpha", 100, Tone::Supportive, 0.5), None);

    assert_eq!(
        forward.snapshot().state_hash(),
        reverse.snapshot().state_hash()
    );
}

#[test]
fn recorded_pulse_changes_the_hash_via_coupling() {
    let bridge = PulseBridge {
        phase: PulsePhase::Rise,
        drift: Drift::Rising,
        modulation_level: 0.7,
        baseline_level: 0.5,
        overload_level: 0.1,
        readiness: 0.8,
        current: PulseSample::default(),
        baseline: PulseBaseline::default(),
    };

    let mut bare = InformationalFluid::new(FluidConfig::default());
    bare.apply_imprint(imprint("alpha", 100, Tone::Supportive, 0.5), None);

    let mut coupled = InformationalFluid::new(FluidConfig::default());
    coupled.apply_imprint(imprint("alpha", 100, Tone::Supportive, 0.5), Some(&bridge));

    assert_ne!(bare.snapshot().state_hash(), coupled.snapshot().state_hash());
}

#[test]
fn snapshot_serializes_for_the_host() {
    let snapshot = populated_fluid().snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"alpha\""));
    assert!(json.contains("\"flow_state\""));

    let back: crate::fluid::FluidSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.state_hash(), snapshot.state_hash());
}
