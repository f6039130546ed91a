//! # scaradraw motion
//!
//! The cancellable sequencer that plays a compiled trajectory back against a
//! [`MotionSink`](scaradraw_communication::MotionSink), plus the pieces it
//! reports through: run reports and simulation frames.

pub mod frame;
pub mod report;
pub mod sequencer;
pub mod signal;

pub use frame::arm_frame;
pub use report::RunReport;
pub use sequencer::{MotionSequencer, SequencerConfig, SequencerHandle, DEFAULT_PACING};
pub use signal::StopSignal;
