//! Scheduling - recurrence policies and the per-backend gate
//!
//! - `recurrence`: the fixed enumeration of run modes and their intervals
//! - `gate`: decides "due now" from the persisted `last_run` timestamp
//! - `time`: timestamp format shared with the state file

mod gate;
mod recurrence;
mod time;

pub use gate::{due_backends, RecurrenceGate};
pub use recurrence::Recurrence;
pub use time::{format_time, now, parse_time, TIME_FORMAT};
