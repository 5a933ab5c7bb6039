//! # Capture
//!
//! The capture controller: a command-driven state machine that owns the
//! camera/recorder lifecycle, runs the pose sampling loop, finalizes rep
//! metrics, and sequences analysis, reconciliation and save.
//!
//! All state transitions flow through one reducer over explicit command
//! types; timers and background tasks communicate by sending commands back
//! into the same channel, so cancellation and staleness are auditable in
//! one place.

mod command;
mod controller;
mod reducer;
mod state;

pub use command::{CaptureCommand, SaveOutcome};
pub use controller::{CaptureHandle, Collaborators, SessionSpec};
pub use state::{CaptureSnapshot, CaptureState, FaultKind};
