//! Registry - type name → constructor table
//!
//! Built once at process start through an explicit call list
//! ([`Registry::with_builtins`]), then only read.

use std::collections::BTreeMap;
use std::sync::Arc;

use colored::Colorize;

use crate::config::ConfigSection;
use crate::error::{BotsError, Result};

use super::shell::ShellBackend;
use super::{Backend, BackendCore, BuildError};

/// Constructor for one backend type
///
/// Receives the parsed shared fields and the section with `type` and
/// `depends` already taken; must take every key it recognises.
pub type BuildFn =
    fn(BackendCore, &mut ConfigSection) -> std::result::Result<Arc<dyn Backend>, BuildError>;

/// A registered backend type
#[derive(Clone, Copy)]
pub struct BackendType {
    /// Name written as `type = "..."` in config
    pub name: &'static str,
    /// Help text shown by `bots list`
    pub summary: &'static str,
    /// Whether instances opt into the recurrence gate
    pub recurring: bool,
    pub build: BuildFn,
}

impl std::fmt::Debug for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendType")
            .field("name", &self.name)
            .field("recurring", &self.recurring)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    types: BTreeMap<&'static str, BackendType>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in backend type
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(ShellBackend::backend_type())?;
        Ok(registry)
    }

    /// Record a type; a name can only be registered once
    pub fn register(&mut self, backend_type: BackendType) -> Result<()> {
        if self.types.contains_key(backend_type.name) {
            return Err(BotsError::DuplicateBackendType {
                type_name: backend_type.name.to_string(),
            });
        }
        self.types.insert(backend_type.name, backend_type);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<&BackendType> {
        self.types.get(type_name)
    }

    /// All known type names, sorted
    pub fn types(&self) -> Vec<String> {
        self.types.keys().map(|name| name.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Help listing: one entry per type with its summary
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for backend_type in self.types.values() {
            out.push_str(&format!("{}", backend_type.name.green().bold()));
            if backend_type.recurring {
                out.push_str(&format!(" {}", "(recurring)".dimmed()));
            }
            out.push('\n');
            for line in backend_type.summary.lines() {
                out.push_str(&format!("    {}\n", line.trim().cyan()));
            }
        }
        out
    }
}
