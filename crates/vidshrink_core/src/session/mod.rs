//! One user session: engine lifecycle, current selection and result.
//!
//! [`Session`] is a synchronous state machine. The UI starts async work
//! from the tickets it hands out and feeds results back in.

mod controller;
mod intake;
mod state;
mod ticket;

pub use controller::{Session, SessionError};
pub use intake::{SelectedFile, VIDEO_EXTENSIONS};
pub use state::{Failure, FailureStage, SessionState};
pub use ticket::{RequestSequence, TranscodeTicket};
