//! Tests for the attractor oscillator.

use super::*;
use crate::config::OscillatorConfig;
use crate::smoother::SmoothedFrame;

fn flat_frame(value: f32) -> SmoothedFrame {
    SmoothedFrame {
        micro: value,
        meso: value,
        macro_scale: value,
    }
}

fn default_oscillator() -> AttractorOscillator {
    AttractorOscillator::new(&OscillatorConfig::default()).unwrap()
}

#[test]
fn test_reciprocity_is_approximate() {
    let k_stability = attractor_ratio(STABILITY_ATTRACTOR);
    let k_exploration = 1.0 / attractor_ratio(EXPLORATION_ATTRACTOR);

    assert!((k_stability - 3.0).abs() < 1e-6);
    assert!((k_stability - k_exploration).abs() < RECIPROCITY_TOLERANCE);
    // The constants are intentionally not exact reciprocals.
    assert!((k_stability - k_exploration).abs() > 1e-3);
}

#[test]
fn test_attractor_ratio_guards_division() {
    assert!((attractor_ratio(0.5) - 1.0).abs() < 1e-6);
    assert!(attractor_ratio(1.0).is_finite());
    assert!(attractor_ratio(1.0) > 1e5);
}

#[test]
fn test_initial_state_is_settled_stability() {
    let osc = default_oscillator();
    assert_eq!(osc.mode(), AttractorMode::Stability);
    assert_eq!(osc.coherence(), STABILITY_ATTRACTOR);
    assert!(!osc.is_transitioning());
    assert_eq!(osc.toggles_into(AttractorMode::Stability), 0);
    assert_eq!(osc.toggles_into(AttractorMode::Exploration), 0);
}

#[test]
fn test_combine_blends_and_pulls() {
    let mut osc = default_oscillator();

    // At the attractor with a matching frame the value is a fixed point.
    let settled = osc.combine(&flat_frame(STABILITY_ATTRACTOR));
    assert!((settled - STABILITY_ATTRACTOR).abs() < 1e-6);

    // A flat 0.5 frame: weighted = 0.5, pulled = 0.75*0.5 + 0.25*0.75.
    let pulled = osc.combine(&flat_frame(0.5));
    assert!((pulled - 0.5625).abs() < 1e-6);
}

#[test]
fn test_toggle_ramp_completes_exactly() {
    let mut osc = default_oscillator();
    let transition = osc.toggle_mode();

    assert_eq!(transition.from, AttractorMode::Stability);
    assert_eq!(transition.to, AttractorMode::Exploration);
    assert_eq!(transition.total_ticks, 20);
    // Mode flips immediately, before the ramp runs.
    assert_eq!(osc.mode(), AttractorMode::Exploration);
    assert!(osc.is_transitioning());

    let mut values = Vec::new();
    for _ in 0..20 {
        values.push(osc.combine(&flat_frame(STABILITY_ATTRACTOR)));
    }

    // Strictly monotonic toward the target, no overshoot, exact landing.
    for pair in values.windows(2) {
        assert!(pair[1] < pair[0], "ramp not monotonic: {:?}", pair);
    }
    for v in &values {
        assert!((EXPLORATION_ATTRACTOR..=STABILITY_ATTRACTOR).contains(v));
    }
    assert_eq!(*values.last().unwrap(), EXPLORATION_ATTRACTOR);
    assert!(!osc.is_transitioning());
    println!(
        "[PASS] toggle ramp: {:.4} -> {:.4} in {} ticks",
        STABILITY_ATTRACTOR,
        EXPLORATION_ATTRACTOR,
        values.len()
    );
}

#[test]
fn test_single_tick_ramp_lands_immediately() {
    let config = OscillatorConfig {
        transition_ticks: 1,
        ..Default::default()
    };
    let mut osc = AttractorOscillator::new(&config).unwrap();
    osc.toggle_mode();
    assert_eq!(
        osc.combine(&flat_frame(STABILITY_ATTRACTOR)),
        EXPLORATION_ATTRACTOR
    );
    assert!(!osc.is_transitioning());
}

#[test]
fn test_mid_ramp_retoggle_restarts_from_current_value() {
    let mut osc = default_oscillator();
    osc.toggle_mode();
    for _ in 0..10 {
        osc.combine(&flat_frame(STABILITY_ATTRACTOR));
    }
    let halfway = osc.coherence();
    assert!(halfway < STABILITY_ATTRACTOR && halfway > EXPLORATION_ATTRACTOR);

    // Re-toggle abandons the old ramp; the new one starts where we are.
    let transition = osc.toggle_mode();
    assert_eq!(osc.mode(), AttractorMode::Stability);
    assert_eq!(transition.start_value, halfway);
    assert_eq!(transition.elapsed_ticks, 0);

    let mut last = halfway;
    for _ in 0..20 {
        let v = osc.combine(&flat_frame(STABILITY_ATTRACTOR));
        assert!(v > last, "return ramp not monotonic");
        last = v;
    }
    assert_eq!(osc.coherence(), STABILITY_ATTRACTOR);
    assert!(!osc.is_transitioning());

    assert_eq!(osc.toggles_into(AttractorMode::Exploration), 1);
    assert_eq!(osc.toggles_into(AttractorMode::Stability), 1);
}

#[test]
fn test_set_coherence_clamps_and_rejects_non_finite() {
    let mut osc = default_oscillator();
    osc.set_coherence(1.5);
    assert_eq!(osc.coherence(), 1.0);
    osc.set_coherence(-0.2);
    assert_eq!(osc.coherence(), 0.0);
    osc.set_coherence(f32::NAN);
    assert_eq!(osc.coherence(), 0.0);
    osc.set_coherence(0.7);
    assert!((osc.coherence() - 0.7).abs() < 1e-6);
}

#[test]
fn test_reset_returns_to_stability_and_keeps_counters() {
    let mut osc = default_oscillator();
    osc.toggle_mode();
    osc.combine(&flat_frame(0.5));
    osc.reset();

    assert_eq!(osc.mode(), AttractorMode::Stability);
    assert_eq!(osc.coherence(), STABILITY_ATTRACTOR);
    assert!(!osc.is_transitioning());
    assert_eq!(osc.toggles_into(AttractorMode::Exploration), 1);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = OscillatorConfig {
        meso_weight: 0.9, // Weights no longer sum to 1.
        ..Default::default()
    };
    let err = AttractorOscillator::new(&config).unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_mode_serde_and_display() {
    assert_eq!(AttractorMode::Stability.to_string(), "stability");
    assert_eq!(AttractorMode::Exploration.opposite(), AttractorMode::Stability);
    assert_eq!(
        serde_json::to_string(&AttractorMode::Exploration).unwrap(),
        "\"exploration\""
    );
    let parsed: AttractorMode = serde_json::from_str("\"stability\"").unwrap();
    assert_eq!(parsed, AttractorMode::Stability);
}
