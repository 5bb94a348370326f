#![no_std]

extern crate alloc;

pub mod error;
pub mod net;
pub mod reporter;
pub mod responder;
pub mod schedule;
pub mod sensor;

pub use error::*;
pub use reporter::{Report, Reporter};
pub use responder::Responder;
pub use schedule::PeriodicSchedule;
