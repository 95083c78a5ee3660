//! Bots - pluggable task runner
//!
//! Layers, from the bottom up:
//! - `error`: error codes and fix suggestions
//! - `store`: persisted key/value state shared by all backends
//! - `schedule`: recurrence modes and the gate that consults the store
//! - `backend`: the runnable contract, the type registry, built-in types
//! - `config`: TOML sections → instantiated [`BackendSet`]
//! - `dag`: `depends` edges, cycle and dangling-name checks
//! - `runtime`: concurrent, dependency-ordered batch execution

pub mod backend;
pub mod config;
pub mod dag;
pub mod error;
pub mod runtime;
pub mod schedule;
pub mod store;

pub use backend::{Backend, BackendCore, BackendType, BuildError, Registry, RunError, ShellBackend};
pub use config::{BackendFilter, BackendLoader, BackendSet, ConfigModel, ConfigSection};
pub use dag::DependencyGraph;
pub use error::{BotsError, FixSuggestion, Result};
pub use runtime::{BackendOutcome, BackendStatus, RunReport, Runner};
pub use schedule::{Recurrence, RecurrenceGate};
pub use store::StateStore;
