//! Backend contract - the runnable unit every configured section becomes
//!
//! - `registry`: type name → constructor table
//! - `shell`: built-in `shell` backend
//!
//! Construction is split in two: the factory parses the shared keys into a
//! [`BackendCore`], then hands the remaining [`ConfigSection`] to the
//! type's constructor, which takes every key it understands. Whatever is
//! left afterwards is rejected by the factory.

mod registry;
mod shell;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use async_trait::async_trait;
use indexmap::IndexSet;
use thiserror::Error;

use crate::config::ConfigSection;
use crate::schedule::Recurrence;
use crate::store::StateStore;

pub use registry::{BackendType, BuildFn, Registry};
pub use shell::ShellBackend;

/// Error raised by a backend constructor (wrapped with the section name by the factory)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing required key '{key}'")]
    MissingKey { key: String },

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Error raised by a backend's `run()`; isolated to that backend
#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}")]
    ExitStatus { command: String, status: String },

    #[error("{0}")]
    Failed(String),
}

/// Fields every backend owns: its unique name and its dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCore {
    pub name: String,
    pub depends: IndexSet<String>,
}

impl BackendCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends: IndexSet::new(),
        }
    }

    pub fn with_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = depends.into_iter().map(Into::into).collect();
        self
    }

    /// Take the shared keys (`depends`) out of a section
    ///
    /// `depends` is a JSON list of names; repeated names keep their first position.
    pub fn from_section(section: &mut ConfigSection) -> Result<Self, BuildError> {
        let depends: Vec<String> = section.take_json("depends")?.unwrap_or_default();
        Ok(Self::new(section.name()).with_depends(depends))
    }
}

/// Capability set of a runnable unit
///
/// `run()` may be called concurrently with other backends' `run()`; the
/// only shared resource is the [`crate::store::StateStore`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Shared fields (name, depends)
    fn core(&self) -> &BackendCore;

    /// Type name as registered, used for diagnostics
    fn type_name(&self) -> &'static str;

    /// Execute once; `state` is the process-wide store, keyed by backend name
    async fn run(&self, state: &StateStore) -> Result<(), RunError>;

    /// Descriptive key/values; implementations extend their parent's props
    fn props(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Recurrence policy for backends that opt into the recurrence gate
    fn recurrence(&self) -> Option<Recurrence> {
        None
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    fn depends(&self) -> &IndexSet<String> {
        &self.core().depends
    }

    /// `type{k=v, ...}` rendering for listings and logs
    fn describe(&self) -> String {
        let mut out = format!("{}{{", self.type_name());
        for (i, (k, v)) in self.props().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}={}", k, v);
        }
        out.push('}');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(BackendCore);

    #[async_trait]
    impl Backend for Named {
        fn core(&self) -> &BackendCore {
            &self.0
        }

        fn type_name(&self) -> &'static str {
            "named"
        }

        async fn run(&self, _state: &StateStore) -> Result<(), RunError> {
            Ok(())
        }
    }

    #[test]
    fn core_parses_depends_in_order_without_duplicates() {
        let mut section = ConfigSection::from_pairs(
            "report",
            [("depends", r#"["fetch", "clean", "fetch"]"#)],
        );
        let core = BackendCore::from_section(&mut section).unwrap();

        assert_eq!(core.name, "report");
        let deps: Vec<&str> = core.depends.iter().map(String::as_str).collect();
        assert_eq!(deps, ["fetch", "clean"]);
        assert!(section.is_empty());
    }

    #[test]
    fn core_defaults_to_no_depends() {
        let mut section = ConfigSection::from_pairs("solo", [("command", "true")]);
        let core = BackendCore::from_section(&mut section).unwrap();

        assert!(core.depends.is_empty());
        assert_eq!(section.remaining_keys(), ["command"]);
    }

    #[test]
    fn core_rejects_non_list_depends() {
        let mut section = ConfigSection::from_pairs("bad", [("depends", "fetch")]);
        let err = BackendCore::from_section(&mut section).unwrap_err();

        assert!(matches!(err, BuildError::InvalidValue { ref key, .. } if key == "depends"));
    }

    #[tokio::test]
    async fn default_contract_methods() {
        let backend = Named(BackendCore::new("a").with_depends(["b"]));

        assert_eq!(backend.name(), "a");
        assert!(backend.depends().contains("b"));
        assert!(backend.props().is_empty());
        assert!(backend.recurrence().is_none());
        assert_eq!(backend.describe(), "named{}");
        backend.run(&StateStore::with_data("unused.json", Default::default()))
            .await
            .unwrap();
    }
}
