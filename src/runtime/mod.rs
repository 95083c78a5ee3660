//! Runtime Module - batch execution
//!
//! Contains the runtime execution components:
//! - `runner`: one tokio task per backend, dependency waits via signals
//! - `signal`: one-shot completion signals
//! - `report`: per-backend outcomes of a batch
//!
//! This module represents the "how" - runtime execution.
//! For where backends come from, see the `config` module.

mod report;
mod runner;
mod signal;

// Re-export public types
pub use report::{BackendOutcome, BackendStatus, RunReport};
pub use runner::Runner;
pub use signal::{CompletionSignal, CompletionWaiter};
