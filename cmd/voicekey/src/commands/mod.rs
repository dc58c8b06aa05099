//! CLI commands module.

mod enroll;
mod pitch;
mod util;
mod vad;
mod verify;

pub use enroll::EnrollCommand;
pub use pitch::PitchCommand;
pub use vad::VadCommand;
pub use verify::VerifyCommand;

pub(crate) use util::*;
