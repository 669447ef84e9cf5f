//! Multi-scale temporal smoothing.
//!
//! Every raw coherence sample is smoothed at three time scales (micro, meso,
//! macro) by independent exponentially weighted moving averages. The micro
//! scale tracks the input quickly, the macro scale drifts slowly, and the
//! meso scale sits between them. The [`SmootherBank`] feeds one sample to
//! all three and hands the resulting frame to the attractor oscillator.

pub mod core;
pub mod types;


pub use self::core::SmootherBank;
pub use self::types::{SmoothedFrame, SmoothedSignal, TimeScale};
