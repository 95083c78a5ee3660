//! Backend factory - config model + registry → instantiated backends
//!
//! All-or-nothing: an unknown type, a failed constructor or an untaken key
//! in any section aborts the whole parse, so nothing runs on a bad config.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::backend::{Backend, BackendCore, BackendType, Registry};
use crate::error::{BotsError, Result};

use super::model::ConfigModel;

/// Which sections to instantiate
///
/// Skipped sections are simply absent from the result. The filter applies
/// after type lookup, so an unknown type still fails the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendFilter {
    #[default]
    All,
    /// Only types that opt into the recurrence gate
    Recurring,
}

impl BackendFilter {
    pub fn accepts(&self, backend_type: &BackendType) -> bool {
        match self {
            BackendFilter::All => true,
            BackendFilter::Recurring => backend_type.recurring,
        }
    }
}

/// Instantiated backends keyed by name, in config order
#[derive(Default, Clone)]
pub struct BackendSet {
    backends: IndexMap<String, Arc<dyn Backend>>,
}

impl BackendSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Backend>> {
        self.backends.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Backend>> {
        self.backends.values()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for BackendSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.backends.iter().map(|(name, b)| (name, b.describe())))
            .finish()
    }
}

impl FromIterator<Arc<dyn Backend>> for BackendSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Backend>>>(iter: I) -> Self {
        let mut set = Self::new();
        for backend in iter {
            set.insert(backend);
        }
        set
    }
}

/// Build every accepted backend declared in `model`
pub fn instantiate(
    registry: &Registry,
    model: &ConfigModel,
    filter: BackendFilter,
) -> Result<BackendSet> {
    let mut set = BackendSet::new();

    for descriptor in model.descriptors() {
        let name = descriptor.name().to_string();
        let backend_type =
            registry
                .get(&descriptor.type_name)
                .ok_or_else(|| BotsError::UnknownBackendType {
                    section: name.clone(),
                    type_name: descriptor.type_name.clone(),
                    available: registry.types(),
                })?;

        if !filter.accepts(backend_type) {
            debug!(section = %name, ?filter, "skipped by filter");
            continue;
        }

        let mut config = descriptor.config;
        let wrap = |source| BotsError::BackendBuild {
            section: name.clone(),
            source,
        };
        let core = BackendCore::from_section(&mut config).map_err(wrap)?;
        let backend = (backend_type.build)(core, &mut config).map_err(wrap)?;
        config.ensure_consumed()?;

        debug!(section = %name, backend = %backend.describe(), "instantiated");
        set.insert(backend);
    }

    Ok(set)
}

/// Factory front door with a per-(source, filter) cache
///
/// A config file is read and instantiated at most once per filter for the
/// lifetime of the loader.
pub struct BackendLoader {
    registry: Arc<Registry>,
    cache: Mutex<HashMap<(PathBuf, BackendFilter), Arc<BackendSet>>>,
}

impl BackendLoader {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Instantiate backends from a config file (cached)
    pub fn load(&self, path: &Path, filter: BackendFilter) -> Result<Arc<BackendSet>> {
        let key = (path.to_path_buf(), filter);
        if let Some(set) = self.cache.lock().get(&key) {
            return Ok(Arc::clone(set));
        }

        let text = std::fs::read_to_string(path).map_err(|e| BotsError::ConfigParse {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        let model = ConfigModel::parse(&text, &path.display().to_string())?;
        let set = Arc::new(instantiate(&self.registry, &model, filter)?);

        self.cache.lock().insert(key, Arc::clone(&set));
        Ok(set)
    }

    /// Instantiate backends from config text (not cached)
    pub fn load_str(&self, text: &str, filter: BackendFilter) -> Result<BackendSet> {
        let model = ConfigModel::parse(text, "<inline>")?;
        instantiate(&self.registry, &model, filter)
    }
}
