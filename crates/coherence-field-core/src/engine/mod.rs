//! The field engine facade.
//!
//! [`FieldEngine`] owns every component of the pipeline and is the only
//! surface external consumers touch: pull the latest state, subscribe to
//! pushes, request a perturbation or a noise sweep, toggle the attractor
//! mode. One engine is instantiated per process and passed by reference to
//! whatever driver paces it; there is no global state.
//!
//! A tick runs the whole pipeline synchronously: breath clock reading, raw
//! sample (supplied or synthesized from the active noise model), smoother
//! bank, oscillator combine or ramp, gate evaluation, snapshot build,
//! ledger record, broadcast. The async harness operations borrow the
//! engine mutably, which pauses live ticking for their duration and gives
//! the harness exclusive control of the field.


use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use tracing::{debug, info};

use crate::attractor::{AttractorMode, AttractorOscillator, STABILITY_ATTRACTOR};
use crate::breath::BreathClock;
use crate::broadcast::{FieldStateBroadcaster, FieldStateListener, SubscriptionId};
use crate::config::EngineConfig;
use crate::error::{FieldError, FieldResult};
use crate::field::{BalanceReport, FieldState};
use crate::gate::DecisionGate;
use crate::harness::{
    default_candidate_grid, CancelHandle, NoiseConfig, PerturbationHarness, PerturbationRun,
    SweepOutcome,
};
use crate::ledger::{CoherenceLedger, LedgerSource};
use crate::smoother::SmootherBank;

/// Owns the coherence pipeline and exposes the external interface.
#[derive(Debug)]
pub struct FieldEngine {
    config: EngineConfig,
    clock: BreathClock,
    smoothers: SmootherBank,
    oscillator: AttractorOscillator,
    gate: DecisionGate,
    broadcaster: FieldStateBroadcaster,
    harness: PerturbationHarness,
    ledger: CoherenceLedger,
    noise_rng: ChaCha8Rng,
    tick_count: u64,
}

impl FieldEngine {
    /// Build an engine from a validated configuration.
    ///
    /// Every component validates its own section; the first invalid value
    /// fails construction with a configuration error. The smoothers start
    /// settled at the stability attractor so the first tick publishes a
    /// coherent state instead of a cold zero.
    pub fn new(config: EngineConfig) -> FieldResult<Self> {
        config.validate().map_err(FieldError::ConfigError)?;

        let clock = BreathClock::new(&config.breath)?;
        let mut smoothers = SmootherBank::new(&config.smoother)?;
        smoothers.reset(STABILITY_ATTRACTOR);
        let oscillator = AttractorOscillator::new(&config.oscillator)?;
        let gate = DecisionGate::new(&config.gate)?;
        let harness = PerturbationHarness::new(&config.harness)?;
        let mut ledger = CoherenceLedger::new(&config.ledger)?;
        ledger.record_coherence(
            STABILITY_ATTRACTOR,
            LedgerSource::System,
            Some("engine initialized".to_string()),
            None,
        );
        let noise_rng = ChaCha8Rng::seed_from_u64(config.harness.seed);

        info!(
            period_secs = config.breath.period_secs,
            pull = config.oscillator.pull_strength,
            "field engine ready"
        );
        Ok(Self {
            config,
            clock,
            smoothers,
            oscillator,
            gate,
            broadcaster: FieldStateBroadcaster::new(),
            harness,
            ledger,
            noise_rng,
            tick_count: 0,
        })
    }

    /// Build an engine with the default configuration.
    pub fn with_defaults() -> FieldResult<Self> {
        Self::new(EngineConfig::default())
    }

    /// Run one tick of the pipeline and return the published state.
    ///
    /// With `sample` the caller supplies the raw input; without it the
    /// engine synthesizes one from the active noise model. Either way the
    /// sample is clamped by the smoothers, never rejected.
    pub fn tick(&mut self, sample: Option<f32>) -> FieldState {
        let breath = self.clock.tick();
        let raw = sample.unwrap_or_else(|| {
            self.config.noise.sample(
                self.oscillator.coherence(),
                self.oscillator.mode().target(),
                &mut self.noise_rng,
            )
        });

        let frame = self.smoothers.ingest(raw);
        let previous = self.oscillator.coherence();
        let coherence = self.oscillator.combine(&frame);
        let decision = self.gate.evaluate(previous, coherence);

        let state = FieldState::new(
            coherence,
            self.oscillator.mode(),
            decision.delta_c,
            decision.gate,
            breath,
        );
        self.ledger
            .record_coherence(coherence, LedgerSource::Engine, None, None);
        self.broadcaster.publish(&state);
        self.tick_count += 1;

        if self.config.debug {
            debug!(
                raw,
                coherence,
                delta_c = decision.delta_c,
                gate = %decision.gate,
                phase = breath.phase,
                "tick published"
            );
        }
        state
    }

    /// Re-initialize the live pipeline without rebuilding the engine.
    ///
    /// Smoothers return to the stability attractor, the oscillator settles
    /// back into stability mode, the gate returns to AMBER, and the latest
    /// state is forgotten. The ledger, the harness run history, and all
    /// subscriptions survive.
    pub fn restart(&mut self) {
        self.smoothers.reset(STABILITY_ATTRACTOR);
        self.oscillator.reset();
        self.gate.reset();
        self.clock.restart();
        self.broadcaster.clear_latest();
        self.tick_count = 0;
        self.ledger.record_coherence(
            STABILITY_ATTRACTOR,
            LedgerSource::System,
            Some("engine restarted".to_string()),
            None,
        );
        info!("engine restarted");
    }

    /// Latest published state, or `None` before the first tick.
    pub fn field_state(&self) -> Option<FieldState> {
        self.broadcaster.latest()
    }

    /// Register a push listener.
    pub fn subscribe(&self, listener: Arc<dyn FieldStateListener>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    /// Register a closure as a push listener.
    pub fn subscribe_fn<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&FieldState) + Send + Sync + 'static,
    {
        self.broadcaster.subscribe_fn(f)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.broadcaster.unsubscribe(id)
    }

    /// Displace the field to `target` and measure the return time.
    ///
    /// Takes `&mut self`, so live ticking is paused while the harness runs
    /// and the measurement sees no interleaved samples. The run lands in
    /// the harness history and the ledger.
    pub async fn request_perturbation(&mut self, target: f32) -> FieldResult<PerturbationRun> {
        let noise = self.config.noise;
        let run = self
            .harness
            .perturb(&mut self.smoothers, &mut self.oscillator, target, &noise)
            .await?;
        self.ledger.record_coherence(
            self.oscillator.coherence(),
            LedgerSource::Harness,
            Some("perturbation".to_string()),
            Some(json!({
                "target": run.target_coherence,
                "return_time_cycles": run.return_time_cycles,
            })),
        );
        Ok(run)
    }

    /// Sweep noise candidates and adopt the winner as the live noise model.
    ///
    /// `None` sweeps the built-in candidate grid. An explicit empty list is
    /// a configuration error, not a silent default.
    pub async fn request_noise_optimization(
        &mut self,
        candidates: Option<Vec<NoiseConfig>>,
    ) -> FieldResult<SweepOutcome> {
        let candidates = match candidates {
            Some(list) => list,
            None => default_candidate_grid(),
        };
        let outcome = self
            .harness
            .sweep_noise(&mut self.smoothers, &mut self.oscillator, &candidates)
            .await?;

        self.config.noise = outcome.best;
        self.ledger.record_coherence(
            self.oscillator.coherence(),
            LedgerSource::Harness,
            Some("noise sweep".to_string()),
            Some(json!({
                "best_base_level": outcome.best.base_level,
                "return_time": outcome.return_time,
                "candidates": candidates.len(),
            })),
        );
        info!(
            base_level = outcome.best.base_level,
            "adopted swept noise model"
        );
        Ok(outcome)
    }

    /// Toggle between the stability and exploration attractors.
    ///
    /// The ramp plays out over the following ticks; a toggle mid-ramp
    /// restarts from the current interpolated value.
    pub fn toggle_attractor_mode(&mut self) {
        self.oscillator.toggle_mode();
    }

    /// Balance classification of the latest published state, or `None`
    /// before the first tick.
    pub fn balance_report(&self) -> Option<BalanceReport> {
        self.field_state()
            .map(|state| BalanceReport::classify(state.coherence, state.mode, &self.config.balance))
    }

    /// Cancel flag shared with in-flight harness operations.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.harness.cancel_handle()
    }

    /// The coherence ledger.
    pub fn ledger(&self) -> &CoherenceLedger {
        &self.ledger
    }

    /// Completed perturbation runs, oldest first.
    pub fn perturbation_history(&self) -> &[PerturbationRun] {
        self.harness.history()
    }

    /// The active configuration (the noise section may have been replaced
    /// by a sweep).
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current coherence value.
    #[inline]
    pub fn coherence(&self) -> f32 {
        self.oscillator.coherence()
    }

    /// Active attractor mode.
    #[inline]
    pub fn mode(&self) -> AttractorMode {
        self.oscillator.mode()
    }

    /// Whether a mode transition ramp is in flight.
    #[inline]
    pub fn is_transitioning(&self) -> bool {
        self.oscillator.is_transitioning()
    }

    /// Ticks published since construction or the last restart.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// How many times the oscillator has toggled into `mode`.
    pub fn toggles_into(&self, mode: AttractorMode) -> u64 {
        self.oscillator.toggles_into(mode)
    }

    /// Listener panics isolated by the broadcaster so far.
    pub fn fault_count(&self) -> u64 {
        self.broadcaster.fault_count()
    }

    /// Breath period in seconds, for drivers pacing the tick loop.
    pub fn breath_period_secs(&self) -> f64 {
        self.clock.period_secs()
    }
}
