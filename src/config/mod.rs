//! Config Module - where backends come from
//!
//! - `model`: TOML source → sections of string key/values
//! - `factory`: sections + registry → [`BackendSet`], with caching
//!
//! ## Config file lookup (highest to lowest)
//!
//! 1. `--config <path>` on the command line
//! 2. `BOTS_CONFIG` (must point at an existing file)
//! 3. `~/.config/bots/bots.toml`
//! 4. `~/.botsrc`

mod factory;
mod model;

use std::path::{Path, PathBuf};

use crate::error::{BotsError, Result};

pub use factory::{instantiate, BackendFilter, BackendLoader, BackendSet};
pub use model::{BackendDescriptor, ConfigModel, ConfigSection};

/// Environment variable selecting the config file
pub const CONFIG_PATH_ENV: &str = "BOTS_CONFIG";

/// Default locations, in lookup order
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("bots").join("bots.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".botsrc"));
    }
    candidates
}

/// Resolve the config file to use
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return existing_file(path.to_path_buf(), "--config");
    }

    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return existing_file(PathBuf::from(path), CONFIG_PATH_ENV);
    }

    let candidates = config_candidates();
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| BotsError::ConfigNotFound {
            reason: format!(
                "none of {}",
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
}

fn existing_file(path: PathBuf, source: &str) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(BotsError::ConfigNotFound {
            reason: format!("{} specified by {}", path.display(), source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn candidates_end_with_known_names() {
        let candidates = config_candidates();
        assert!(candidates.iter().any(|p| p.ends_with("bots/bots.toml")));
        assert!(candidates.iter().any(|p| p.ends_with(".botsrc")));
    }

    #[test]
    #[serial]
    fn explicit_path_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bots.toml");
        std::fs::write(&path, "").unwrap();

        std::env::set_var(CONFIG_PATH_ENV, "/nope/bots.toml");
        assert_eq!(config_path(Some(&path)).unwrap(), path);
        std::env::remove_var(CONFIG_PATH_ENV);
    }

    #[test]
    #[serial]
    fn env_path_must_exist() {
        std::env::set_var(CONFIG_PATH_ENV, "/nope/bots.toml");
        let err = config_path(None).unwrap_err();
        std::env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(err, BotsError::ConfigNotFound { .. }));
        assert!(err.to_string().contains(CONFIG_PATH_ENV));
    }

    #[test]
    #[serial]
    fn env_path_is_used() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "").unwrap();

        std::env::set_var(CONFIG_PATH_ENV, &path);
        let resolved = config_path(None);
        std::env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(resolved.unwrap(), path);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = config_path(Some(Path::new("/nope/explicit.toml"))).unwrap_err();
        assert!(err.to_string().contains("--config"));
    }
}
