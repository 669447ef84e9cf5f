//! Perturbation harness.
//!
//! The harness answers two questions about the field: how long does it take
//! to recover from a synthetic displacement (the return time), and which
//! noise configuration recovers fastest on average (the sweep). Both
//! operations simulate ticks over the same smoother/oscillator pipeline the
//! live engine drives, with a seeded RNG for reproducible measurements and
//! cooperative cancellation between simulated ticks.

pub mod core;
pub mod types;

#[cfg(test)]
mod tests;

pub use self::core::PerturbationHarness;
pub use self::types::{
    default_candidate_grid, CancelHandle, NoiseConfig, PerturbationRun, SweepOutcome,
};
