//! Published field state and balance reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attractor::{attractor_ratio, AttractorMode, STABILITY_ATTRACTOR};
use crate::breath::BreathTick;
use crate::config::BalanceConfig;
use crate::gate::GateColor;

/// One immutable snapshot of the coherence field.
///
/// Built by the engine on every tick and handed to consumers by value;
/// nothing outside the engine can mutate the authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    /// Coherence value Zλ in `[0, 1]`.
    pub coherence: f32,
    /// Active attractor mode.
    pub mode: AttractorMode,
    /// Change in coherence since the previous published state.
    pub delta_c: f32,
    /// Gate color for this tick.
    pub gate: GateColor,
    /// Breath phase in `[0, 2π)`.
    pub breath_phase: f32,
    /// Whole breath cycles completed.
    pub cycle_index: u64,
    /// When the snapshot was built.
    pub timestamp: DateTime<Utc>,
}

impl FieldState {
    /// Build a snapshot stamped with the current time.
    ///
    /// Coherence and delta are sanitized here so a snapshot can never
    /// carry a non-finite value: coherence clamps into `[0, 1]` (NaN
    /// becomes 0), a non-finite delta becomes 0.
    pub fn new(
        coherence: f32,
        mode: AttractorMode,
        delta_c: f32,
        gate: GateColor,
        breath: BreathTick,
    ) -> Self {
        let coherence = if coherence.is_finite() {
            coherence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let delta_c = if delta_c.is_finite() { delta_c } else { 0.0 };
        Self {
            coherence,
            mode,
            delta_c,
            gate,
            breath_phase: breath.phase,
            cycle_index: breath.cycle_index,
            timestamp: Utc::now(),
        }
    }
}

/// Health classification of the stability:exploration balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    /// Normalized ratio inside the optimal band.
    Optimal,
    /// Outside optimal but not yet critical.
    Adjusting,
    /// Far from the target ratio.
    Critical,
}

impl std::fmt::Display for BalanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceStatus::Optimal => write!(f, "optimal"),
            BalanceStatus::Adjusting => write!(f, "adjusting"),
            BalanceStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Where the current coherence sits relative to the 3:1 target ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Stability:exploration ratio, normalized toward the stability
    /// orientation (inverted in exploration mode so the target is shared).
    pub ratio: f32,
    /// The ratio both modes aim for.
    pub target_ratio: f32,
    /// Band classification of `ratio`.
    pub status: BalanceStatus,
}

impl BalanceReport {
    /// Classify a coherence value against the configured bands.
    pub fn classify(coherence: f32, mode: AttractorMode, bands: &BalanceConfig) -> Self {
        let coherence = if coherence.is_finite() {
            coherence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let raw = attractor_ratio(coherence);
        let ratio = match mode {
            AttractorMode::Stability => raw,
            AttractorMode::Exploration => 1.0 / raw.max(1e-6),
        };
        let status = if (bands.optimal_low..=bands.optimal_high).contains(&ratio) {
            BalanceStatus::Optimal
        } else if ratio < bands.critical_low || ratio > bands.critical_high {
            BalanceStatus::Critical
        } else {
            BalanceStatus::Adjusting
        };
        Self {
            ratio,
            target_ratio: attractor_ratio(STABILITY_ATTRACTOR),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick() -> BreathTick {
        BreathTick {
            phase: 1.0,
            cycle_index: 3,
        }
    }

    #[test]
    fn test_field_state_sanitizes_inputs() {
        let state = FieldState::new(1.7, AttractorMode::Stability, 0.02, GateColor::Green, tick());
        assert_eq!(state.coherence, 1.0);

        let state = FieldState::new(
            f32::NAN,
            AttractorMode::Stability,
            f32::INFINITY,
            GateColor::Amber,
            tick(),
        );
        assert_eq!(state.coherence, 0.0);
        assert_eq!(state.delta_c, 0.0);
        assert_eq!(state.cycle_index, 3);
    }

    #[test]
    fn test_field_state_serde_roundtrip() {
        let state = FieldState::new(0.75, AttractorMode::Stability, 0.0, GateColor::Amber, tick());
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"stability\""));
        assert!(json.contains("\"AMBER\""));
        let back: FieldState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_balance_optimal_at_both_attractors() {
        let bands = BalanceConfig::default();

        let at_stability = BalanceReport::classify(0.75, AttractorMode::Stability, &bands);
        assert_eq!(at_stability.status, BalanceStatus::Optimal);
        assert!((at_stability.ratio - 3.0).abs() < 1e-4);
        assert!((at_stability.target_ratio - 3.0).abs() < 1e-6);

        let at_exploration = BalanceReport::classify(0.2494, AttractorMode::Exploration, &bands);
        assert_eq!(at_exploration.status, BalanceStatus::Optimal);
        assert!((at_exploration.ratio - 3.0096).abs() < 1e-3);
    }

    #[test]
    fn test_balance_bands() {
        let bands = BalanceConfig::default();

        // 0.78 -> ratio about 3.55: off target but not critical.
        let report = BalanceReport::classify(0.78, AttractorMode::Stability, &bands);
        assert_eq!(report.status, BalanceStatus::Adjusting);

        // 0.5 -> ratio 1.0: under the critical floor.
        let report = BalanceReport::classify(0.5, AttractorMode::Stability, &bands);
        assert_eq!(report.status, BalanceStatus::Critical);

        // 0.85 -> ratio about 5.7: over the critical ceiling.
        let report = BalanceReport::classify(0.85, AttractorMode::Stability, &bands);
        assert_eq!(report.status, BalanceStatus::Critical);
    }

    #[test]
    fn test_balance_ratio_is_always_finite() {
        let bands = BalanceConfig::default();
        for (coherence, mode) in [
            (1.0, AttractorMode::Stability),
            (0.0, AttractorMode::Stability),
            (0.0, AttractorMode::Exploration),
            (1.0, AttractorMode::Exploration),
            (f32::NAN, AttractorMode::Stability),
        ] {
            let report = BalanceReport::classify(coherence, mode, &bands);
            assert!(report.ratio.is_finite());
            serde_json::to_string(&report).unwrap();
        }
    }
}
