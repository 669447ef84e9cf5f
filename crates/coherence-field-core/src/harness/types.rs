//! Types for the perturbation harness.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Noise model driving self-generated samples.
///
/// Each synthesized sample moves the raw input from the current coherence
/// toward the active attractor (the stability share of the ratio pair) and
/// adds bounded uniform jitter (the adaptability share). All fields are
/// unitless multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Half-width of the uniform jitter, in `[0, 0.2]`.
    pub base_level: f32,
    /// Relative weight of the pull toward the attractor.
    pub stability_ratio: f32,
    /// Relative weight of the jitter term.
    pub adaptability_ratio: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            base_level: 0.05,
            stability_ratio: 3.0,
            adaptability_ratio: 1.0,
        }
    }
}

impl NoiseConfig {
    /// Validate the noise parameters.
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_level.is_finite() || !(0.0..=0.2).contains(&self.base_level) {
            return Err(format!(
                "base_level must be in [0, 0.2], got {}",
                self.base_level
            ));
        }
        for (name, ratio) in [
            ("stability_ratio", self.stability_ratio),
            ("adaptability_ratio", self.adaptability_ratio),
        ] {
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(format!("{} must be >= 0, got {}", name, ratio));
            }
        }
        if self.stability_ratio + self.adaptability_ratio <= 0.0 {
            return Err("stability_ratio and adaptability_ratio must not both be zero".to_string());
        }
        Ok(())
    }

    /// Synthesize one raw sample from the current coherence.
    ///
    /// `raw = clamp(current + (sr/w)·(target − current) + (ar/w)·U(−b, b))`
    /// with `w = sr + ar`. With `base_level` zero the sample is the pure
    /// attractor pull, which is what the deterministic tests use.
    pub fn sample<R: Rng>(&self, current: f32, target: f32, rng: &mut R) -> f32 {
        let weight = self.stability_ratio + self.adaptability_ratio;
        let pull = (self.stability_ratio / weight) * (target - current);
        let jitter = if self.base_level > 0.0 {
            (self.adaptability_ratio / weight)
                * rng.gen_range(-self.base_level..=self.base_level)
        } else {
            0.0
        };
        (current + pull + jitter).clamp(0.0, 1.0)
    }
}

/// The default candidate grid for a noise sweep when the caller supplies
/// none: a spread of jitter levels around the recommended 0.06 midpoint,
/// all at the default 3:1 ratio split.
pub fn default_candidate_grid() -> Vec<NoiseConfig> {
    [0.02f32, 0.04, 0.06, 0.08, 0.10, 0.14]
        .into_iter()
        .map(|base_level| NoiseConfig {
            base_level,
            ..Default::default()
        })
        .collect()
}

/// Outcome of one perturb-and-recover run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationRun {
    pub id: Uuid,
    /// Coherence the field was displaced to.
    pub target_coherence: f32,
    /// Simulated ticks until coherence re-entered tolerance around the
    /// stability attractor, or `None` when the budget ran out.
    pub return_time_cycles: Option<u32>,
    /// Noise model active during the run.
    pub noise: NoiseConfig,
    pub started_at: DateTime<Utc>,
}

impl PerturbationRun {
    /// Whether the field returned within the budget.
    pub fn returned(&self) -> bool {
        self.return_time_cycles.is_some()
    }
}

/// Result of a noise sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// The candidate with the lowest average return time.
    pub best: NoiseConfig,
    /// Mean coherence observed across the winning candidate's trials.
    pub stability: f32,
    /// The winning average return time in ticks, or `None` when none of
    /// the winner's trials returned within budget.
    pub return_time: Option<f32>,
}

/// Shared cooperative-cancellation flag for sweep and perturbation runs.
///
/// Clones observe the same flag. The harness checks it between simulated
/// ticks and abandons the remaining work, leaving the field in its
/// last-simulated state.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the in-flight operation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the next operation can run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
