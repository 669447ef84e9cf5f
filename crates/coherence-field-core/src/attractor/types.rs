//! Attractor constants and mode types.

use serde::{Deserialize, Serialize};

/// Coherence value of the stability attractor (the 3:1 state).
pub const STABILITY_ATTRACTOR: f32 = 0.7500;

/// Coherence value of the exploration attractor (the 1:3 state).
///
/// Deliberately 0.2494 rather than 0.2500. The stability ratio and the
/// inverted exploration ratio therefore agree only within
/// [`RECIPROCITY_TOLERANCE`], and the constant must not be rounded to make
/// them exact.
pub const EXPLORATION_ATTRACTOR: f32 = 0.2494;

/// Tolerance for the approximate reciprocity between the two attractors:
/// `attractor_ratio(STABILITY)` vs `1 / attractor_ratio(EXPLORATION)`.
pub const RECIPROCITY_TOLERANCE: f32 = 0.01;

/// Ratio of a coherence value against its complement, `a / (1 - a)`.
///
/// The denominator is floored so values at or above 1.0 yield a large
/// finite ratio instead of infinity.
pub fn attractor_ratio(a: f32) -> f32 {
    a / (1.0 - a).max(1e-6)
}

/// Which attractor the oscillator is pulling toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttractorMode {
    /// Pull toward [`STABILITY_ATTRACTOR`].
    Stability,
    /// Pull toward [`EXPLORATION_ATTRACTOR`].
    Exploration,
}

impl AttractorMode {
    /// The coherence value this mode pulls toward.
    pub fn target(&self) -> f32 {
        match self {
            AttractorMode::Stability => STABILITY_ATTRACTOR,
            AttractorMode::Exploration => EXPLORATION_ATTRACTOR,
        }
    }

    /// The other mode.
    pub fn opposite(&self) -> Self {
        match self {
            AttractorMode::Stability => AttractorMode::Exploration,
            AttractorMode::Exploration => AttractorMode::Stability,
        }
    }
}

impl std::fmt::Display for AttractorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttractorMode::Stability => write!(f, "stability"),
            AttractorMode::Exploration => write!(f, "exploration"),
        }
    }
}

/// State of an in-flight mode transition ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeTransition {
    /// Mode the ramp is leaving.
    pub from: AttractorMode,
    /// Mode the ramp is entering.
    pub to: AttractorMode,
    /// Coherence value at the moment the toggle happened.
    pub start_value: f32,
    /// Attractor value the ramp lands on.
    pub target_value: f32,
    /// Total ticks the ramp takes.
    pub total_ticks: u32,
    /// Ticks consumed so far.
    pub elapsed_ticks: u32,
}

impl ModeTransition {
    /// Fraction of the ramp completed, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.elapsed_ticks as f32 / self.total_ticks as f32
    }
}
