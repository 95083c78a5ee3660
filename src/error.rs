//! Error types with error codes and fix suggestions
//!
//! Error code ranges:
//! - BOTS-000-009: Configuration source errors
//! - BOTS-010-019: Registry / factory errors
//! - BOTS-020-029: Dependency graph errors
//! - BOTS-030-039: Persisted state errors
//!
//! Failures raised by a backend's `run()` are not `BotsError`s: they live in
//! [`crate::backend::RunError`] and stay isolated to that backend.

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::BuildError;

pub type Result<T> = std::result::Result<T, BotsError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum BotsError {
    // ═══════════════════════════════════════════
    // CONFIG SOURCE ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[BOTS-001] Config file not found: {reason}")]
    ConfigNotFound { reason: String },

    #[error("[BOTS-002] Failed to parse config {path}: {details}")]
    ConfigParse { path: String, details: String },

    #[error("[BOTS-003] Top-level key '{key}' is not a section")]
    NotASection { key: String },

    // ═══════════════════════════════════════════
    // REGISTRY / FACTORY ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[BOTS-010] Backend type '{type_name}' already registered")]
    DuplicateBackendType { type_name: String },

    #[error("[BOTS-011] Section [{section}]: backend type '{type_name}' not found; available: {}", .available.join(", "))]
    UnknownBackendType {
        section: String,
        type_name: String,
        available: Vec<String>,
    },

    #[error("[BOTS-012] Section [{section}]: unexpected config keys: {}", .keys.join(", "))]
    UnexpectedConfigKeys { section: String, keys: Vec<String> },

    #[error("[BOTS-013] Section [{section}]: {source}")]
    BackendBuild {
        section: String,
        #[source]
        source: BuildError,
    },

    // ═══════════════════════════════════════════
    // DEPENDENCY GRAPH ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[BOTS-020] Dependency cycle: {cycle}")]
    DependencyCycle { cycle: String },

    // ═══════════════════════════════════════════
    // STATE ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[BOTS-030] No state recorded for '{task}.{key}'")]
    StateKeyNotFound { task: String, key: String },

    #[error("[BOTS-031] Failed to load state from {}: {details}", .path.display())]
    StateLoad { path: PathBuf, details: String },

    #[error("[BOTS-032] Failed to save state to {}: {details}", .path.display())]
    StateSave { path: PathBuf, details: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotsError {
    /// Stable error code, e.g. `BOTS-011`
    pub fn code(&self) -> &'static str {
        match self {
            BotsError::ConfigNotFound { .. } => "BOTS-001",
            BotsError::ConfigParse { .. } => "BOTS-002",
            BotsError::NotASection { .. } => "BOTS-003",
            BotsError::DuplicateBackendType { .. } => "BOTS-010",
            BotsError::UnknownBackendType { .. } => "BOTS-011",
            BotsError::UnexpectedConfigKeys { .. } => "BOTS-012",
            BotsError::BackendBuild { .. } => "BOTS-013",
            BotsError::DependencyCycle { .. } => "BOTS-020",
            BotsError::StateKeyNotFound { .. } => "BOTS-030",
            BotsError::StateLoad { .. } => "BOTS-031",
            BotsError::StateSave { .. } => "BOTS-032",
            BotsError::Io(_) => "BOTS-099",
        }
    }

    /// Errors raised while turning the config source into backends.
    ///
    /// All of them abort the whole parse before anything runs.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BotsError::ConfigNotFound { .. }
                | BotsError::ConfigParse { .. }
                | BotsError::NotASection { .. }
                | BotsError::UnknownBackendType { .. }
                | BotsError::UnexpectedConfigKeys { .. }
                | BotsError::BackendBuild { .. }
        )
    }
}

impl FixSuggestion for BotsError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BotsError::ConfigNotFound { .. } => {
                Some("Create ~/.config/bots/bots.toml or point BOTS_CONFIG at a config file")
            }
            BotsError::ConfigParse { .. } => Some("Check TOML syntax: [section] headers and quoting"),
            BotsError::NotASection { .. } => {
                Some("Move the key under a [backend-name] section header")
            }
            BotsError::DuplicateBackendType { .. } => {
                Some("Give each backend implementation a unique type name")
            }
            BotsError::UnknownBackendType { .. } => {
                Some("Use one of the types listed by `bots list`")
            }
            BotsError::UnexpectedConfigKeys { .. } => {
                Some("Check the key names for typos; unknown keys are rejected")
            }
            BotsError::BackendBuild { .. } => {
                Some("Check the required keys and value formats for this backend type")
            }
            BotsError::DependencyCycle { .. } => {
                Some("Remove one of the `depends` entries in the cycle")
            }
            BotsError::StateKeyNotFound { .. } => None,
            BotsError::StateLoad { .. } => {
                Some("Fix or delete the state file (BOTS_STATE_CONFIG); it is recreated on exit")
            }
            BotsError::StateSave { .. } => Some("Check permissions on the state file directory"),
            BotsError::Io(_) => Some("Check file path and permissions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_lists_available() {
        let err = BotsError::UnknownBackendType {
            section: "fetch".into(),
            type_name: "shel".into(),
            available: vec!["shell".into(), "touch".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("[BOTS-011]"));
        assert!(msg.contains("'shel'"));
        assert!(msg.contains("shell, touch"));
        assert_eq!(err.code(), "BOTS-011");
        assert!(err.is_config_error());
    }

    #[test]
    fn unexpected_keys_names_section() {
        let err = BotsError::UnexpectedConfigKeys {
            section: "report".into(),
            keys: vec!["comand".into()],
        };
        assert_eq!(
            err.to_string(),
            "[BOTS-012] Section [report]: unexpected config keys: comand"
        );
        assert!(err.fix_suggestion().is_some());
    }

    #[test]
    fn build_error_carries_section_and_source() {
        let err = BotsError::BackendBuild {
            section: "fetch".into(),
            source: BuildError::MissingKey {
                key: "command".into(),
            },
        };
        assert!(err.to_string().starts_with("[BOTS-013] Section [fetch]:"));
        assert!(err.to_string().contains("command"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn state_errors_are_not_config_errors() {
        let err = BotsError::StateKeyNotFound {
            task: "fetch".into(),
            key: "last_run".into(),
        };
        assert!(!err.is_config_error());
        assert_eq!(err.code(), "BOTS-030");
        assert!(err.fix_suggestion().is_none());
    }
}
