//! Timer engine: session clock arithmetic and the phase state machine.

pub mod clock;
pub mod timer;

pub use clock::{format_mm_ss, ManualTimeSource, SessionClock, SystemTimeSource, TimeSource};
pub use timer::{Completion, TimerEngine, TimerEvent};
