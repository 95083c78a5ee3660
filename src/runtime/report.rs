//! Outcomes of one batch run

use std::time::Duration;

/// How a backend's run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Success,
    Failed(String),
}

/// Result of one backend in a batch
#[derive(Debug, Clone)]
pub struct BackendOutcome {
    pub name: String,
    pub status: BackendStatus,
    pub duration: Duration,
}

impl BackendOutcome {
    pub fn success(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: BackendStatus::Success,
            duration,
        }
    }

    pub fn failed(name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: BackendStatus::Failed(error.into()),
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, BackendStatus::Success)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            BackendStatus::Failed(e) => Some(e),
            BackendStatus::Success => None,
        }
    }
}

/// All outcomes of a batch, in completion order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    outcomes: Vec<BackendOutcome>,
}

impl RunReport {
    pub fn push(&mut self, outcome: BackendOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[BackendOutcome] {
        &self.outcomes
    }

    pub fn get(&self, name: &str) -> Option<&BackendOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BackendOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(BackendOutcome::is_success)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
