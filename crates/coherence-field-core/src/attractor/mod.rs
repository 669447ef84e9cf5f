//! Attractor oscillation.
//!
//! The oscillator owns the published coherence value. Each tick it combines
//! the three smoothed scales into a weighted value and pulls it toward the
//! active attractor: stability (0.7500) or exploration (0.2494), the two
//! ends of the approximate 3:1 / 1:3 ratio pair. Toggling the mode ramps
//! the value linearly to the other attractor over a fixed number of ticks
//! instead of jumping.

pub mod core;
pub mod types;

#[cfg(test)]
mod tests;

pub use self::core::AttractorOscillator;
pub use self::types::{
    attractor_ratio, AttractorMode, ModeTransition, EXPLORATION_ATTRACTOR,
    RECIPROCITY_TOLERANCE, STABILITY_ATTRACTOR,
};
