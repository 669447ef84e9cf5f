//! The oscillator itself.

use tracing::{debug, info, warn};

use crate::config::OscillatorConfig;
use crate::error::{FieldError, FieldResult};
use crate::smoother::SmoothedFrame;

use super::types::{AttractorMode, ModeTransition, STABILITY_ATTRACTOR};

/// Owns the coherence value and drives it toward the active attractor.
///
/// Outside a transition, each [`combine`](Self::combine) call blends the
/// smoothed frame by the configured weights and pulls the result toward the
/// active attractor by the pull strength. During a transition the value is
/// the linear interpolation sample for that tick; the blend resumes once
/// the ramp lands.
#[derive(Debug, Clone)]
pub struct AttractorOscillator {
    config: OscillatorConfig,
    mode: AttractorMode,
    coherence: f32,
    transition: Option<ModeTransition>,
    toggles_to_stability: u64,
    toggles_to_exploration: u64,
}

impl AttractorOscillator {
    /// Create an oscillator settled at the stability attractor.
    ///
    /// Fails with a configuration error if the weights do not sum to 1,
    /// the pull strength leaves `[0, 1]`, or the transition length is zero.
    pub fn new(config: &OscillatorConfig) -> FieldResult<Self> {
        config.validate().map_err(FieldError::ConfigError)?;
        Ok(Self {
            config: config.clone(),
            mode: AttractorMode::Stability,
            coherence: STABILITY_ATTRACTOR,
            transition: None,
            toggles_to_stability: 0,
            toggles_to_exploration: 0,
        })
    }

    /// Advance one tick: blend the frame and pull toward the attractor, or
    /// take the next ramp sample if a transition is in flight.
    pub fn combine(&mut self, frame: &SmoothedFrame) -> f32 {
        if let Some(next) = self.advance_transition() {
            self.coherence = next;
            return self.coherence;
        }

        let weighted = self.config.micro_weight * frame.micro
            + self.config.meso_weight * frame.meso
            + self.config.macro_weight * frame.macro_scale;
        let target = self.mode.target();
        let pulled =
            (1.0 - self.config.pull_strength) * weighted + self.config.pull_strength * target;
        self.coherence = pulled.clamp(0.0, 1.0);
        self.coherence
    }

    /// Switch to the other attractor and start a linear ramp toward it
    /// from the current coherence value.
    ///
    /// The mode flips immediately; the value walks over
    /// `transition_ticks` combine calls and lands exactly on the new
    /// attractor. A toggle while a ramp is in flight abandons it and starts
    /// a fresh ramp from the current interpolated value. Transitions are
    /// never queued.
    pub fn toggle_mode(&mut self) -> ModeTransition {
        let from = self.mode;
        let to = from.opposite();
        self.mode = to;
        match to {
            AttractorMode::Stability => self.toggles_to_stability += 1,
            AttractorMode::Exploration => self.toggles_to_exploration += 1,
        }

        let transition = ModeTransition {
            from,
            to,
            start_value: self.coherence,
            target_value: to.target(),
            total_ticks: self.config.transition_ticks,
            elapsed_ticks: 0,
        };
        if self.transition.is_some() {
            debug!(from = %from, to = %to, "re-toggle mid-ramp, restarting from current value");
        }
        self.transition = Some(transition);
        info!(
            from = %from,
            to = %to,
            start = transition.start_value,
            target = transition.target_value,
            ticks = transition.total_ticks,
            "attractor mode toggled"
        );
        transition
    }

    /// Take the next ramp sample, or `None` when no transition is active.
    fn advance_transition(&mut self) -> Option<f32> {
        let transition = self.transition.as_mut()?;
        transition.elapsed_ticks += 1;
        if transition.elapsed_ticks >= transition.total_ticks {
            // Land exactly on the attractor, then resume blending.
            let target = transition.target_value;
            self.transition = None;
            return Some(target);
        }
        let t = transition.progress();
        Some(transition.start_value + (transition.target_value - transition.start_value) * t)
    }

    /// Overwrite the coherence value (clamped). Used by the perturbation
    /// harness for the one-shot displacement.
    pub fn set_coherence(&mut self, value: f32) {
        if !value.is_finite() {
            warn!(value = ?value, "ignoring non-finite coherence override");
            return;
        }
        self.coherence = value.clamp(0.0, 1.0);
    }

    /// Current coherence value.
    #[inline]
    pub fn coherence(&self) -> f32 {
        self.coherence
    }

    /// Active attractor mode.
    #[inline]
    pub fn mode(&self) -> AttractorMode {
        self.mode
    }

    /// Whether a mode transition ramp is in flight.
    #[inline]
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// The in-flight transition, if any.
    pub fn transition(&self) -> Option<&ModeTransition> {
        self.transition.as_ref()
    }

    /// How many times the oscillator has toggled into `mode`.
    pub fn toggles_into(&self, mode: AttractorMode) -> u64 {
        match mode {
            AttractorMode::Stability => self.toggles_to_stability,
            AttractorMode::Exploration => self.toggles_to_exploration,
        }
    }

    /// Return to the settled stability state. Toggle counters survive.
    pub fn reset(&mut self) {
        self.mode = AttractorMode::Stability;
        self.coherence = STABILITY_ATTRACTOR;
        self.transition = None;
    }
}
