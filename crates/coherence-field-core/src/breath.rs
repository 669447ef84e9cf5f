//! Fixed-period breath clock.
//!
//! Every published state carries a phase in `[0, 2π)` derived from
//! wall-clock time elapsed since the clock was built, modulo the breath
//! period (about 3.12 seconds by default). Phase comes from elapsed time
//! rather than a tick counter, so a stalled or skipped driver tick cannot
//! skew the phase of later states.

use std::f64::consts::TAU;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::BreathConfig;
use crate::error::{FieldError, FieldResult};

/// One reading of the breath clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreathTick {
    /// Phase within the current cycle, in `[0, 2π)`.
    pub phase: f32,
    /// Number of whole cycles completed since the clock started.
    pub cycle_index: u64,
}

/// Wall-clock phase generator with a fixed period.
#[derive(Debug, Clone)]
pub struct BreathClock {
    period_secs: f64,
    started: Instant,
}

impl BreathClock {
    /// Create a clock starting now.
    ///
    /// A non-positive or non-finite period is a configuration error.
    pub fn new(config: &BreathConfig) -> FieldResult<Self> {
        config.validate().map_err(FieldError::ConfigError)?;
        Ok(Self {
            period_secs: f64::from(config.period_secs),
            started: Instant::now(),
        })
    }

    /// Read the clock at the current wall-clock time.
    pub fn tick(&self) -> BreathTick {
        self.at(self.started.elapsed().as_secs_f64())
    }

    /// Read the clock at an explicit elapsed time in seconds.
    ///
    /// Deterministic for a given elapsed value, which is what the tests
    /// drive instead of sleeping.
    pub fn at(&self, elapsed_secs: f64) -> BreathTick {
        let cycles = elapsed_secs.max(0.0) / self.period_secs;
        let cycle_index = cycles.floor() as u64;
        // fract() is in [0, 1) but the multiply can round up to TAU.
        let phase = (cycles.fract() * TAU).rem_euclid(TAU);
        BreathTick {
            phase: phase as f32,
            cycle_index,
        }
    }

    /// The configured period in seconds.
    #[inline]
    pub fn period_secs(&self) -> f64 {
        self.period_secs
    }

    /// Restart the cycle count and phase from the current instant.
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }
}
