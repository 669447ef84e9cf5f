//! Hysteresis decision gate over the coherence rate of change.
//!
//! The gate turns the per-tick coherence delta into a three-level signal:
//! GREEN (proceed), AMBER (pause), RED (realign). Entry into GREEN or RED
//! requires a delta beyond the entry band; once entered, the gate holds
//! through small opposing deltas inside the sticky band, so consumers do
//! not flap on noise.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GateConfig;
use crate::error::{FieldError, FieldResult};

/// The three gate levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateColor {
    /// Coherence is rising; proceed.
    Green,
    /// No significant movement; pause.
    Amber,
    /// Coherence is falling; realign.
    Red,
}

impl std::fmt::Display for GateColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateColor::Green => write!(f, "GREEN"),
            GateColor::Amber => write!(f, "AMBER"),
            GateColor::Red => write!(f, "RED"),
        }
    }
}

/// One gate evaluation: the delta that was judged and the resulting color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    /// Coherence delta between the two compared values.
    pub delta_c: f32,
    /// Gate color after this evaluation.
    pub gate: GateColor,
}

/// Stateful hysteresis gate. Starts at AMBER.
#[derive(Debug, Clone)]
pub struct DecisionGate {
    config: GateConfig,
    state: GateColor,
}

impl DecisionGate {
    /// Create a gate in the AMBER state.
    pub fn new(config: &GateConfig) -> FieldResult<Self> {
        config.validate().map_err(FieldError::ConfigError)?;
        Ok(Self {
            config: config.clone(),
            state: GateColor::Amber,
        })
    }

    /// Judge the move from `previous` to `current` coherence.
    ///
    /// GREEN when the delta reaches `entry_delta`, or when already GREEN
    /// and the delta has not dropped below `-sticky_delta`. RED mirrors
    /// that on the negative side. Everything else, including a non-finite
    /// delta, is AMBER.
    pub fn evaluate(&mut self, previous: f32, current: f32) -> GateDecision {
        let delta_c = current - previous;
        let entry = self.config.entry_delta;
        let sticky = self.config.sticky_delta;

        let gate = if delta_c >= entry {
            GateColor::Green
        } else if delta_c <= -entry {
            GateColor::Red
        } else if self.state == GateColor::Green && delta_c >= -sticky {
            GateColor::Green
        } else if self.state == GateColor::Red && delta_c <= sticky {
            GateColor::Red
        } else {
            // NaN deltas land here too: every comparison above is false.
            GateColor::Amber
        };

        if gate != self.state {
            debug!(delta_c, from = %self.state, to = %gate, "gate changed");
        }
        self.state = gate;
        GateDecision { delta_c, gate }
    }

    /// Current gate color.
    #[inline]
    pub fn current(&self) -> GateColor {
        self.state
    }

    /// Return to the initial AMBER state.
    pub fn reset(&mut self) {
        self.state = GateColor::Amber;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> DecisionGate {
        DecisionGate::new(&GateConfig::default()).unwrap()
    }

    /// Evaluate against a zero baseline so the delta is the literal itself.
    fn step(gate: &mut DecisionGate, delta: f32) -> GateColor {
        gate.evaluate(0.0, delta).gate
    }

    #[test]
    fn test_initial_state_is_amber() {
        assert_eq!(gate().current(), GateColor::Amber);
    }

    #[test]
    fn test_canonical_sequence() {
        let mut gate = gate();
        let sequence = [0.02f32, -0.02, -0.003];
        let colors: Vec<GateColor> = sequence.iter().map(|d| step(&mut gate, *d)).collect();
        assert_eq!(
            colors,
            vec![GateColor::Green, GateColor::Red, GateColor::Red]
        );
        println!("[PASS] gate sequence {:?} -> {:?}", sequence, colors);
    }

    #[test]
    fn test_entry_boundaries_are_inclusive() {
        let mut g = gate();
        assert_eq!(step(&mut g, 0.01), GateColor::Green);
        g.reset();
        assert_eq!(step(&mut g, -0.01), GateColor::Red);
        g.reset();
        assert_eq!(step(&mut g, 0.009), GateColor::Amber);
    }

    #[test]
    fn test_green_is_sticky_within_band() {
        let mut g = gate();
        assert_eq!(step(&mut g, 0.02), GateColor::Green);
        // Small dips keep GREEN held.
        assert_eq!(step(&mut g, -0.005), GateColor::Green);
        assert_eq!(step(&mut g, 0.0), GateColor::Green);
        // Past the sticky band the hold breaks.
        assert_eq!(step(&mut g, -0.0051), GateColor::Amber);
    }

    #[test]
    fn test_red_is_sticky_within_band() {
        let mut g = gate();
        assert_eq!(step(&mut g, -0.02), GateColor::Red);
        assert_eq!(step(&mut g, 0.005), GateColor::Red);
        assert_eq!(step(&mut g, 0.0051), GateColor::Amber);
    }

    #[test]
    fn test_large_reversal_crosses_directly() {
        let mut g = gate();
        assert_eq!(step(&mut g, 0.02), GateColor::Green);
        // A big drop goes straight to RED without an AMBER stop.
        assert_eq!(step(&mut g, -0.02), GateColor::Red);
        assert_eq!(step(&mut g, 0.02), GateColor::Green);
    }

    #[test]
    fn test_non_finite_delta_is_amber() {
        let mut g = gate();
        step(&mut g, 0.02);
        assert_eq!(step(&mut g, f32::NAN), GateColor::Amber);
    }

    #[test]
    fn test_evaluate_reports_delta() {
        let mut g = gate();
        let decision = g.evaluate(0.50, 0.52);
        assert!((decision.delta_c - 0.02).abs() < 1e-6);
        assert_eq!(decision.gate, GateColor::Green);
    }

    #[test]
    fn test_reset_returns_to_amber() {
        let mut g = gate();
        step(&mut g, 0.02);
        g.reset();
        assert_eq!(g.current(), GateColor::Amber);
    }

    #[test]
    fn test_gate_serde_uppercase() {
        assert_eq!(serde_json::to_string(&GateColor::Green).unwrap(), "\"GREEN\"");
        let parsed: GateColor = serde_json::from_str("\"RED\"").unwrap();
        assert_eq!(parsed, GateColor::Red);
        assert_eq!(GateColor::Amber.to_string(), "AMBER");
    }
}
