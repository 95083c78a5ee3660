//! StateStore - task → {key → value} memory that survives between runs
//!
//! The whole map is one JSON document, loaded once at start and rewritten
//! wholesale by [`StateStore::save`]. In-memory writes are visible to every
//! clone immediately; durability waits for the save at exit.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BotsError, Result};

/// Environment variable overriding the state file location
pub const STATE_PATH_ENV: &str = "BOTS_STATE_CONFIG";

/// State file location: `$BOTS_STATE_CONFIG`, else `<config dir>/bots/state.json`
pub fn state_path() -> PathBuf {
    match std::env::var_os(STATE_PATH_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bots")
            .join("state.json"),
    }
}

/// Plain state map, serialized as `{"task": {"key": "value"}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateData(BTreeMap<String, BTreeMap<String, String>>);

impl StateData {
    pub fn get(&self, task: &str, key: &str) -> Option<&str> {
        self.0.get(task)?.get(key).map(String::as_str)
    }

    /// Upsert, creating the task's sub-map if needed
    pub fn set(&mut self, task: &str, key: &str, value: impl Into<String>) {
        self.0
            .entry(task.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn task(&self, task: &str) -> Option<&BTreeMap<String, String>> {
        self.0.get(task)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Shared handle to the process-wide state
///
/// Cheap to clone; every clone sees the same map. One mutex guards the whole
/// map because it is serialized as a single unit.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    data: Arc<Mutex<StateData>>,
}

impl StateStore {
    /// Load from `path`; a missing or empty file gives an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| BotsError::StateLoad {
                path: path.clone(),
                details: e.to_string(),
            })?;
            if content.trim().is_empty() {
                warn!(path = %path.display(), "state file is empty, starting with no recorded runs");
                StateData::default()
            } else {
                serde_json::from_str(&content).map_err(|e| BotsError::StateLoad {
                    path: path.clone(),
                    details: e.to_string(),
                })?
            }
        } else {
            StateData::default()
        };

        debug!(path = %path.display(), "state loaded");
        Ok(Self::with_data(path, data))
    }

    /// Load from the default location (see [`state_path`])
    pub fn load_default() -> Result<Self> {
        Self::load(state_path())
    }

    pub fn with_data(path: impl Into<PathBuf>, data: StateData) -> Self {
        Self {
            path: path.into(),
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value for `task.key`, or [`BotsError::StateKeyNotFound`]
    pub fn get(&self, task: &str, key: &str) -> Result<String> {
        self.get_opt(task, key)
            .ok_or_else(|| BotsError::StateKeyNotFound {
                task: task.to_string(),
                key: key.to_string(),
            })
    }

    pub fn get_or(&self, task: &str, key: &str, default: impl Into<String>) -> String {
        self.get_opt(task, key).unwrap_or_else(|| default.into())
    }

    pub fn get_opt(&self, task: &str, key: &str) -> Option<String> {
        self.data.lock().get(task, key).map(str::to_string)
    }

    pub fn set(&self, task: &str, key: &str, value: impl Into<String>) {
        self.data.lock().set(task, key, value);
    }

    /// Run `f` with the lock held, for read-modify-write sequences
    pub fn update<R>(&self, f: impl FnOnce(&mut StateData) -> R) -> R {
        f(&mut self.data.lock())
    }

    /// `state.json` → `state.json.tmp`, in the same directory so rename stays atomic
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Copy of the current map
    pub fn snapshot(&self) -> StateData {
        self.data.lock().clone()
    }

    /// Rewrite the whole state file, creating parent directories as needed
    ///
    /// Atomic: the content goes to a sibling temp file which is then renamed
    /// over the target, so an interrupted save leaves the previous file intact.
    pub fn save(&self) -> Result<()> {
        let content = {
            let data = self.data.lock();
            serde_json::to_string_pretty(&*data).map_err(|e| BotsError::StateSave {
                path: self.path.clone(),
                details: e.to_string(),
            })?
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| BotsError::StateSave {
                path: self.path.clone(),
                details: format!("failed to create directory: {}", e),
            })?;
        }

        let temp_path = self.temp_path();
        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(BotsError::StateSave {
                path: self.path.clone(),
                details: format!("failed to write temp file: {}", e),
            });
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            BotsError::StateSave {
                path: self.path.clone(),
                details: format!("failed to replace state file: {}", e),
            }
        })?;

        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
