//! RecurrenceGate - "is this backend due now?"
//!
//! Decision at `now`, given the recorded `last_run`:
//!
//! | mode    | no `last_run` | `last_run` recorded               |
//! |---------|---------------|-----------------------------------|
//! | never   | not due       | not due                           |
//! | other   | due           | due iff `now - last_run >= interval` |
//!
//! When due, `now` is recorded as the new `last_run` in the same locked
//! step, before the backend has run. A backend that then fails waits for the
//! next interval.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::config::BackendSet;
use crate::store::StateStore;

use super::time::{format_time, parse_time};
use super::Recurrence;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceGate {
    task: String,
    mode: Recurrence,
}

impl RecurrenceGate {
    /// State key holding the last time the gate let the task through
    pub const LAST_RUN_KEY: &'static str = "last_run";

    pub fn new(task: impl Into<String>, mode: Recurrence) -> Self {
        Self {
            task: task.into(),
            mode,
        }
    }

    /// Gate for a backend that opted into recurrence
    pub fn for_backend(backend: &dyn Backend) -> Option<Self> {
        backend
            .recurrence()
            .map(|mode| Self::new(backend.name(), mode))
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn mode(&self) -> Recurrence {
        self.mode
    }

    /// Pure decision, no state access
    pub fn is_due(&self, last_run: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
        let Some(interval) = self.mode.interval() else {
            return false;
        };
        match last_run {
            None => true,
            Some(last_run) => now - last_run >= interval,
        }
    }

    /// Decide and, when due, record `now` as the new `last_run`
    pub fn should_run(&self, state: &StateStore, now: NaiveDateTime) -> bool {
        state.update(|data| {
            let last_run = data.get(&self.task, Self::LAST_RUN_KEY).and_then(|raw| {
                let parsed = parse_time(raw);
                if parsed.is_none() {
                    warn!(task = %self.task, value = raw, "unparseable last_run, treating as never run");
                }
                parsed
            });

            let due = self.is_due(last_run, now);
            debug!(task = %self.task, mode = %self.mode, ?last_run, due, "recurrence check");

            if due {
                data.set(&self.task, Self::LAST_RUN_KEY, format_time(now));
            }
            due
        })
    }
}

/// Names of the recurring backends that are due at `now`, in config order
///
/// Each due backend has its `last_run` updated as a side effect.
pub fn due_backends(backends: &BackendSet, state: &StateStore, now: NaiveDateTime) -> Vec<String> {
    backends
        .iter()
        .filter_map(|backend| RecurrenceGate::for_backend(backend.as_ref()))
        .filter(|gate| gate.should_run(state, now))
        .map(|gate| gate.task)
        .collect()
}
