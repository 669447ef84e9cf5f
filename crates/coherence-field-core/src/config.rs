//! Engine configuration types.
//!
//! This module defines the configuration for every subsystem of the
//! coherence field engine: temporal smoothing, attractor oscillation, the
//! breath clock, the decision gate, the perturbation harness, broadcasting,
//! the coherence ledger, and balance classification.
//!
//! Configuration is layered at load time: `config/default.toml`, then
//! `config/{COHERENCE_FIELD_ENV}.toml`, then environment variables with the
//! `COHERENCE_FIELD` prefix and `__` separator. Every load path validates
//! the result and fails fast on the first invalid value.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};
use crate::harness::NoiseConfig;
use crate::smoother::TimeScale;

/// Main engine configuration containing all subsystem settings.
///
/// # Example
///
/// ```
/// use coherence_field_core::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.oscillator.transition_ticks, 20);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Temporal smoothing settings.
    #[serde(default)]
    pub smoother: SmootherConfig,

    /// Attractor oscillator settings.
    #[serde(default)]
    pub oscillator: OscillatorConfig,

    /// Breath clock settings.
    #[serde(default)]
    pub breath: BreathConfig,

    /// Decision gate hysteresis settings.
    #[serde(default)]
    pub gate: GateConfig,

    /// Perturbation harness settings.
    #[serde(default)]
    pub harness: HarnessConfig,

    /// Broadcast settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Coherence ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Balance ratio classification bands.
    #[serde(default)]
    pub balance: BalanceConfig,

    /// Active noise model for self-generated samples.
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Enable per-tick debug logging.
    #[serde(default)]
    pub debug: bool,
}

impl EngineConfig {
    /// Load configuration from layered sources.
    ///
    /// Order of precedence (later wins): `config/default.toml`,
    /// `config/{COHERENCE_FIELD_ENV}.toml`, environment variables prefixed
    /// `COHERENCE_FIELD` with `__` as the section separator. Missing files
    /// are fine; an invalid merged result is not.
    pub fn load() -> FieldResult<Self> {
        let environment =
            std::env::var("COHERENCE_FIELD_ENV").unwrap_or_else(|_| "default".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::File::with_name(&format!("config/{}", environment)).required(false),
            )
            .add_source(config::Environment::with_prefix("COHERENCE_FIELD").separator("__"))
            .build()
            .map_err(FieldError::config)?;

        let loaded: EngineConfig = settings.try_deserialize().map_err(FieldError::config)?;
        loaded.validate().map_err(FieldError::ConfigError)?;
        Ok(loaded)
    }

    /// Load configuration from a single TOML file, then validate.
    pub fn from_file(path: impl AsRef<Path>) -> FieldResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FieldError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let loaded: EngineConfig = toml::from_str(&raw).map_err(FieldError::config)?;
        loaded.validate().map_err(FieldError::ConfigError)?;
        Ok(loaded)
    }

    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        self.smoother.validate()?;
        self.oscillator.validate()?;
        self.breath.validate()?;
        self.gate.validate()?;
        self.harness.validate()?;
        self.broadcast.validate()?;
        self.ledger.validate()?;
        self.balance.validate()?;
        self.noise.validate()?;
        Ok(())
    }
}

/// Temporal smoothing constants, one per time scale.
///
/// Each alpha is the EWMA smoothing factor for its scale. Values must lie in
/// `(0, 1]`; an alpha of 1 disables smoothing for that scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmootherConfig {
    /// Micro scale alpha (fast response).
    pub micro_alpha: f32,

    /// Meso scale alpha (mid response).
    pub meso_alpha: f32,

    /// Macro scale alpha (slow response).
    pub macro_alpha: f32,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            micro_alpha: 0.6,
            meso_alpha: 0.3,
            macro_alpha: 0.1,
        }
    }
}

impl SmootherConfig {
    /// Get the alpha for a given time scale.
    pub fn alpha_for(&self, scale: TimeScale) -> f32 {
        match scale {
            TimeScale::Micro => self.micro_alpha,
            TimeScale::Meso => self.meso_alpha,
            TimeScale::Macro => self.macro_alpha,
        }
    }

    /// Validate the smoothing constants.
    pub fn validate(&self) -> Result<(), String> {
        for (name, alpha) in [
            ("micro_alpha", self.micro_alpha),
            ("meso_alpha", self.meso_alpha),
            ("macro_alpha", self.macro_alpha),
        ] {
            if !alpha.is_finite() || alpha <= 0.0 || alpha > 1.0 {
                return Err(format!("{} must be in (0, 1], got {}", name, alpha));
            }
        }
        Ok(())
    }
}

/// Attractor oscillator settings: combine weights, pull strength, and the
/// mode transition length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscillatorConfig {
    /// Weight of the micro smoothed signal in the combined value.
    pub micro_weight: f32,

    /// Weight of the meso smoothed signal in the combined value.
    pub meso_weight: f32,

    /// Weight of the macro smoothed signal in the combined value.
    pub macro_weight: f32,

    /// Attractor pull strength `p`.
    /// Range: `[0, 1]`. Zero disables the pull; one snaps to the attractor.
    pub pull_strength: f32,

    /// Number of ticks a mode transition ramp takes to complete.
    pub transition_ticks: u32,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            micro_weight: 0.2,
            meso_weight: 0.5,
            macro_weight: 0.3,
            pull_strength: 0.25,
            transition_ticks: 20,
        }
    }
}

impl OscillatorConfig {
    /// Sum of the three combine weights.
    pub fn weight_sum(&self) -> f32 {
        self.micro_weight + self.meso_weight + self.macro_weight
    }

    /// Validate weights, pull strength, and transition length.
    pub fn validate(&self) -> Result<(), String> {
        for (name, w) in [
            ("micro_weight", self.micro_weight),
            ("meso_weight", self.meso_weight),
            ("macro_weight", self.macro_weight),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(format!("{} must be in [0, 1], got {}", name, w));
            }
        }
        let sum = self.weight_sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(format!("combine weights must sum to 1.0, got {}", sum));
        }
        if !(0.0..=1.0).contains(&self.pull_strength) {
            return Err(format!(
                "pull_strength must be in [0, 1], got {}",
                self.pull_strength
            ));
        }
        if self.transition_ticks == 0 {
            return Err("transition_ticks must be > 0".to_string());
        }
        Ok(())
    }
}

/// Breath clock settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathConfig {
    /// Breath cycle period in seconds.
    pub period_secs: f32,
}

impl Default for BreathConfig {
    fn default() -> Self {
        Self { period_secs: 3.12 }
    }
}

impl BreathConfig {
    /// Validate the period. Zero or negative periods are fatal.
    pub fn validate(&self) -> Result<(), String> {
        if !self.period_secs.is_finite() || self.period_secs <= 0.0 {
            return Err(format!(
                "period_secs must be > 0, got {}",
                self.period_secs
            ));
        }
        Ok(())
    }
}

/// Decision gate hysteresis bands.
///
/// A delta beyond `entry_delta` enters GREEN (positive) or RED (negative).
/// Once entered, the gate holds as long as the delta stays inside the
/// opposing `sticky_delta` band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Magnitude of ΔC that enters GREEN or RED.
    pub entry_delta: f32,

    /// Magnitude of the sticky band that keeps GREEN or RED held.
    /// Must be strictly smaller than `entry_delta`.
    pub sticky_delta: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            entry_delta: 0.01,
            sticky_delta: 0.005,
        }
    }
}

impl GateConfig {
    /// Validate the hysteresis bands.
    pub fn validate(&self) -> Result<(), String> {
        if !self.entry_delta.is_finite() || self.entry_delta <= 0.0 {
            return Err(format!(
                "entry_delta must be > 0, got {}",
                self.entry_delta
            ));
        }
        if !self.sticky_delta.is_finite() || self.sticky_delta <= 0.0 {
            return Err(format!(
                "sticky_delta must be > 0, got {}",
                self.sticky_delta
            ));
        }
        if self.sticky_delta >= self.entry_delta {
            return Err(format!(
                "sticky_delta ({}) must be < entry_delta ({})",
                self.sticky_delta, self.entry_delta
            ));
        }
        Ok(())
    }
}

/// Perturbation harness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Return tolerance around the stability attractor.
    pub tolerance: f32,

    /// Maximum simulated ticks before a perturbation is declared
    /// non-returning.
    pub budget: u32,

    /// Perturb-and-recover trials per sweep candidate.
    pub trials: u32,

    /// Lower bound of randomized sweep targets.
    pub target_low: f32,

    /// Upper bound of randomized sweep targets.
    pub target_high: f32,

    /// Empirically recommended base level midpoint used for tie-breaking.
    pub preferred_base_level: f32,

    /// Bounded run history capacity (oldest evicted).
    pub history_cap: usize,

    /// Seed for the sweep RNG, for reproducible measurements.
    pub seed: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            budget: 60,
            trials: 5,
            target_low: 0.65,
            target_high: 0.85,
            preferred_base_level: 0.06,
            history_cap: 100,
            seed: 42,
        }
    }
}

impl HarnessConfig {
    /// Validate harness parameters.
    pub fn validate(&self) -> Result<(), String> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(format!("tolerance must be > 0, got {}", self.tolerance));
        }
        if self.budget == 0 {
            return Err("budget must be > 0".to_string());
        }
        if self.trials == 0 {
            return Err("trials must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.target_low)
            || !(0.0..=1.0).contains(&self.target_high)
            || self.target_low >= self.target_high
        {
            return Err(format!(
                "sweep target range must satisfy 0 <= low < high <= 1, got [{}, {}]",
                self.target_low, self.target_high
            ));
        }
        if !(0.0..=0.2).contains(&self.preferred_base_level) {
            return Err(format!(
                "preferred_base_level must be in [0, 0.2], got {}",
                self.preferred_base_level
            ));
        }
        if self.history_cap == 0 {
            return Err("history_cap must be > 0".to_string());
        }
        Ok(())
    }
}

/// Broadcast settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Default minimum coherence delta for filtered subscriptions.
    pub min_delta: f32,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self { min_delta: 0.01 }
    }
}

impl BroadcastConfig {
    /// Validate the filter threshold.
    pub fn validate(&self) -> Result<(), String> {
        if !self.min_delta.is_finite() || self.min_delta < 0.0 {
            return Err(format!("min_delta must be >= 0, got {}", self.min_delta));
        }
        Ok(())
    }
}

/// Coherence ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Maximum retained entries (oldest evicted).
    pub cap: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { cap: 256 }
    }
}

impl LedgerConfig {
    /// Validate the retention cap.
    pub fn validate(&self) -> Result<(), String> {
        if self.cap == 0 {
            return Err("ledger cap must be > 0".to_string());
        }
        Ok(())
    }
}

/// Balance ratio classification bands.
///
/// The normalized stability:exploration ratio is compared against these
/// bands: inside `[optimal_low, optimal_high]` is Optimal, outside
/// `[critical_low, critical_high]` is Critical, anything between is
/// Adjusting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Lower edge of the optimal band.
    pub optimal_low: f32,

    /// Upper edge of the optimal band.
    pub optimal_high: f32,

    /// Below this the balance is critical.
    pub critical_low: f32,

    /// Above this the balance is critical.
    pub critical_high: f32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            optimal_low: 2.9,
            optimal_high: 3.1,
            critical_low: 1.5,
            critical_high: 4.5,
        }
    }
}

impl BalanceConfig {
    /// Validate band ordering.
    pub fn validate(&self) -> Result<(), String> {
        let bands = [
            ("critical_low", self.critical_low),
            ("optimal_low", self.optimal_low),
            ("optimal_high", self.optimal_high),
            ("critical_high", self.critical_high),
        ];
        for (name, v) in bands {
            if !v.is_finite() || v <= 0.0 {
                return Err(format!("{} must be > 0, got {}", name, v));
            }
        }
        if !(self.critical_low < self.optimal_low
            && self.optimal_low < self.optimal_high
            && self.optimal_high < self.critical_high)
        {
            return Err(format!(
                "balance bands must be ordered critical_low < optimal_low < optimal_high < critical_high, got [{}, {}, {}, {}]",
                self.critical_low, self.optimal_low, self.optimal_high, self.critical_high
            ));
        }
        Ok(())
    }
}
