//! EWMA smoothing bank.

use tracing::{debug, warn};

use crate::config::SmootherConfig;
use crate::error::{FieldError, FieldResult};

use super::types::{SmoothedFrame, SmoothedSignal, TimeScale};

/// Bank of three independent EWMA smoothers, one per [`TimeScale`].
///
/// The same raw sample feeds all three scales. Out-of-range input is clamped
/// into `[0, 1]` and logged, never rejected; non-finite input holds the
/// signal at its previous value.
#[derive(Debug, Clone)]
pub struct SmootherBank {
    signals: [SmoothedSignal; 3],
}

impl SmootherBank {
    /// Create a bank with all signals initialized to zero.
    ///
    /// Fails with a configuration error if any alpha lies outside `(0, 1]`.
    pub fn new(config: &SmootherConfig) -> FieldResult<Self> {
        config.validate().map_err(FieldError::ConfigError)?;
        Ok(Self {
            signals: TimeScale::ALL.map(|scale| SmoothedSignal {
                scale,
                alpha: config.alpha_for(scale),
                value: 0.0,
                previous_value: 0.0,
            }),
        })
    }

    /// Feed one raw sample into a single scale and return the new value.
    pub fn update(&mut self, scale: TimeScale, raw: f32) -> f32 {
        let signal = &mut self.signals[scale as usize];
        if !raw.is_finite() {
            warn!(scale = %signal.scale, raw = ?raw, "non-finite raw sample, holding value");
            return signal.value;
        }
        if !(0.0..=1.0).contains(&raw) {
            debug!(scale = %signal.scale, raw, "raw sample outside [0, 1], clamping");
        }
        let raw = raw.clamp(0.0, 1.0);
        signal.previous_value = signal.value;
        signal.value =
            (signal.alpha * raw + (1.0 - signal.alpha) * signal.previous_value).clamp(0.0, 1.0);
        signal.value
    }

    /// Feed one raw sample into all three scales and return the frame.
    pub fn ingest(&mut self, raw: f32) -> SmoothedFrame {
        SmoothedFrame {
            micro: self.update(TimeScale::Micro, raw),
            meso: self.update(TimeScale::Meso, raw),
            macro_scale: self.update(TimeScale::Macro, raw),
        }
    }

    /// Current values without updating.
    pub fn frame(&self) -> SmoothedFrame {
        SmoothedFrame {
            micro: self.signals[TimeScale::Micro as usize].value,
            meso: self.signals[TimeScale::Meso as usize].value,
            macro_scale: self.signals[TimeScale::Macro as usize].value,
        }
    }

    /// Borrow the full signal state for one scale.
    pub fn signal(&self, scale: TimeScale) -> &SmoothedSignal {
        &self.signals[scale as usize]
    }

    /// Re-initialize every signal to `initial` (clamped into `[0, 1]`).
    ///
    /// The signals are reset in place, not rebuilt, so alphas survive.
    pub fn reset(&mut self, initial: f32) {
        let initial = if initial.is_finite() {
            initial.clamp(0.0, 1.0)
        } else {
            warn!(value = ?initial, "non-finite reset value, using 0.0");
            0.0
        };
        for signal in &mut self.signals {
            signal.value = initial;
            signal.previous_value = initial;
        }
    }
}
