//! LED strip state and drivers
//!
//! This module handles:
//! - The in-memory pixel buffer and brightness scalar
//! - Pushing frames to any `smart_leds` driver on Show
//! - A simulated strip for running without hardware

mod simulated;
mod state;

pub use simulated::{FrameProbe, SimulatedStrip};
pub use state::{FrameSink, LedState, SharedStrip, StripError};
