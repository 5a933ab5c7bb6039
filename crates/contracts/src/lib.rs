//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Frame timestamps are seconds since the start of the capture session (f64)
//! - Keypoint coordinates are normalized to [0, 1] in image space, y growing downward

mod analysis;
mod blueprint;
mod capability;
mod collaborator;
mod error;
mod frame;
mod keypoint;
mod overrides;
mod pattern;
mod rep;

pub use analysis::*;
pub use blueprint::*;
pub use capability::*;
pub use collaborator::*;
pub use error::*;
pub use frame::*;
pub use keypoint::*;
pub use overrides::Override;
pub use pattern::*;
pub use rep::*;
