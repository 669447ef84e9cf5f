//! End-to-end flow through the engine: live ticks, a mode toggle, a
//! perturbation, a noise sweep, and a restart, observed through the same
//! interfaces an external consumer would use.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coherence_field_core::{
    AttractorMode, BalanceStatus, EngineConfig, FieldEngine, GateColor, NoiseConfig,
    EXPLORATION_ATTRACTOR, STABILITY_ATTRACTOR,
};

#[tokio::test]
async fn full_session_flow() {
    let mut engine = FieldEngine::new(EngineConfig::default()).unwrap();
    assert!(engine.field_state().is_none());

    // A consumer subscribes before any tick.
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    engine.subscribe_fn(move |state| {
        assert!((0.0..=1.0).contains(&state.coherence));
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Phase 1: settle under externally supplied samples.
    for _ in 0..5 {
        engine.tick(Some(STABILITY_ATTRACTOR));
    }
    let settled = engine.field_state().unwrap();
    assert!((settled.coherence - STABILITY_ATTRACTOR).abs() < 1e-4);
    assert_eq!(settled.gate, GateColor::Amber);
    assert_eq!(engine.balance_report().unwrap().status, BalanceStatus::Optimal);

    // Phase 2: perturb and watch the field come back.
    let run = engine.request_perturbation(0.70).await.unwrap();
    let cycles = run.return_time_cycles.expect("field did not return");
    assert!(cycles > 0 && cycles <= 60);
    println!("[PASS] perturbation returned in {} cycles", cycles);

    // Phase 3: sweep the built-in noise grid and adopt the winner.
    let outcome = engine.request_noise_optimization(None).await.unwrap();
    assert_eq!(engine.config().noise, outcome.best);
    assert!(outcome.stability > 0.0);

    // Phase 4: toggle into exploration and ride the ramp down.
    engine.toggle_attractor_mode();
    let mut last = engine.coherence();
    for _ in 0..20 {
        let state = engine.tick(Some(STABILITY_ATTRACTOR));
        assert!(state.coherence <= last);
        last = state.coherence;
    }
    assert!(!engine.is_transitioning());
    assert_eq!(engine.mode(), AttractorMode::Exploration);
    assert_eq!(engine.coherence(), EXPLORATION_ATTRACTOR);

    // Phase 5: restart and confirm what survives.
    let ledger_before = engine.ledger().len();
    let runs_before = engine.perturbation_history().len();
    engine.restart();
    assert!(engine.field_state().is_none());
    assert_eq!(engine.mode(), AttractorMode::Stability);
    assert_eq!(engine.ledger().len(), ledger_before + 1);
    assert_eq!(engine.perturbation_history().len(), runs_before);

    // The subscriber survived the restart and keeps receiving ticks.
    let before = seen.load(Ordering::SeqCst);
    engine.tick(Some(STABILITY_ATTRACTOR));
    assert_eq!(seen.load(Ordering::SeqCst), before + 1);
}

#[tokio::test]
async fn cancellation_is_observable_from_outside() {
    let mut engine = FieldEngine::with_defaults().unwrap();
    engine.tick(Some(STABILITY_ATTRACTOR));

    let cancel = engine.cancel_handle();
    cancel.cancel();
    let err = engine.request_perturbation(0.65).await.unwrap_err();
    assert!(err.is_recoverable());

    cancel.reset();
    let run = engine.request_perturbation(0.70).await.unwrap();
    assert!(run.returned());
}

#[tokio::test]
async fn explicit_candidates_drive_the_sweep() {
    let mut engine = FieldEngine::with_defaults().unwrap();

    let candidates = vec![
        NoiseConfig {
            base_level: 0.02,
            ..Default::default()
        },
        NoiseConfig {
            base_level: 0.12,
            ..Default::default()
        },
    ];
    let outcome = engine
        .request_noise_optimization(Some(candidates.clone()))
        .await
        .unwrap();
    assert!(candidates.contains(&outcome.best));
    // Two candidates at five trials each.
    assert_eq!(engine.perturbation_history().len(), 10);
}
