//! Small helpers shared by the driver and the recorder.

pub mod env;
pub mod timing;

pub use timing::{Phase, PhaseTimer};
