//! Coherence field engine.
//!
//! This crate computes the synthetic coherence value Zλ and everything
//! derived from it: a raw sample stream smoothed at three time scales, an
//! oscillator pulling the combined value toward one of two reciprocal
//! attractor states, a fixed-period breath clock phase-stamping every
//! update, a hysteresis gate over the coherence rate of change, a
//! perturbation harness measuring recovery, and a broadcaster publishing
//! immutable snapshots.
//!
//! # Modules
//!
//! - [`config`]: Configuration types for all engine subsystems
//! - [`error`]: Error types and result alias
//! - [`smoother`]: Multi-scale EWMA smoothing of raw samples
//! - [`attractor`]: Attractor constants, modes, and the oscillator
//! - [`breath`]: Fixed-period phase clock
//! - [`gate`]: Hysteresis decision gate over ΔC
//! - [`broadcast`]: Push/pull distribution of published states
//! - [`ledger`]: Bounded coherence history log
//! - [`harness`]: Perturbation and noise-sweep measurement
//! - [`field`]: Published snapshot and balance reporting
//! - [`engine`]: The facade owning the whole pipeline
//!
//! # Attractor pair
//!
//! The two attractors sit at 0.7500 (stability, the 3:1 state) and 0.2494
//! (exploration, the 1:3 state). Their ratios agree with the shared
//! constant k ≈ 3 only approximately; the relationship is checked against
//! a tolerance, never assumed exact.
//!
//! # Example
//!
//! ```
//! use coherence_field_core::{AttractorMode, FieldEngine};
//!
//! let mut engine = FieldEngine::with_defaults().unwrap();
//! let state = engine.tick(Some(0.75));
//! assert!((state.coherence - 0.75).abs() < 1e-6);
//! assert_eq!(state.mode, AttractorMode::Stability);
//! assert_eq!(engine.field_state(), Some(state));
//! ```

pub mod attractor;
pub mod breath;
pub mod broadcast;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod gate;
pub mod harness;
pub mod ledger;
pub mod smoother;

// Re-export the types consumers touch directly.
pub use attractor::{
    attractor_ratio, AttractorMode, AttractorOscillator, ModeTransition, EXPLORATION_ATTRACTOR,
    RECIPROCITY_TOLERANCE, STABILITY_ATTRACTOR,
};
pub use breath::{BreathClock, BreathTick};
pub use broadcast::{
    DeltaFilter, FieldStateBroadcaster, FieldStateListener, FnListener, SubscriptionId,
};
pub use config::EngineConfig;
pub use engine::FieldEngine;
pub use error::{FieldError, FieldResult};
pub use field::{BalanceReport, BalanceStatus, FieldState};
pub use gate::{DecisionGate, GateColor, GateDecision};
pub use harness::{
    default_candidate_grid, CancelHandle, NoiseConfig, PerturbationHarness, PerturbationRun,
    SweepOutcome,
};
pub use ledger::{CoherenceLedger, LedgerEntry, LedgerSource};
pub use smoother::{SmoothedFrame, SmoothedSignal, SmootherBank, TimeScale};
