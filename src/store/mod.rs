//! Store Module - persisted key/value state
//!
//! Contains:
//! - `state`: StateStore (task → key → value, JSON file, saved once at exit)

mod state;

pub use state::{state_path, StateData, StateStore, STATE_PATH_ENV};
