//! Types for the temporal smoothing subsystem.

use serde::{Deserialize, Serialize};

/// The three smoothing horizons applied to every raw coherence sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    /// Fast response (default alpha 0.6).
    Micro,
    /// Mid response (default alpha 0.3).
    Meso,
    /// Slow response (default alpha 0.1).
    Macro,
}

impl TimeScale {
    /// All scales, fastest to slowest.
    pub const ALL: [TimeScale; 3] = [TimeScale::Micro, TimeScale::Meso, TimeScale::Macro];
}

impl std::fmt::Display for TimeScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeScale::Micro => write!(f, "micro"),
            TimeScale::Meso => write!(f, "meso"),
            TimeScale::Macro => write!(f, "macro"),
        }
    }
}

/// A single EWMA-smoothed signal at one time scale.
///
/// `value` is always inside `[0, 1]`; `previous_value` holds the value from
/// before the most recent update so callers can observe per-scale movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSignal {
    /// The scale this signal tracks.
    pub scale: TimeScale,
    /// Smoothing factor, fixed at construction.
    pub alpha: f32,
    /// Current smoothed value in `[0, 1]`.
    pub value: f32,
    /// Value before the most recent update.
    pub previous_value: f32,
}

/// The smoothed values of one sample across all three scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedFrame {
    /// Micro-scale smoothed value.
    pub micro: f32,
    /// Meso-scale smoothed value.
    pub meso: f32,
    /// Macro-scale smoothed value. `macro` is a keyword, hence the rename.
    #[serde(rename = "macro")]
    pub macro_scale: f32,
}

impl SmoothedFrame {
    /// Value for a given scale.
    pub fn get(&self, scale: TimeScale) -> f32 {
        match scale {
            TimeScale::Micro => self.micro,
            TimeScale::Meso => self.meso,
            TimeScale::Macro => self.macro_scale,
        }
    }
}
