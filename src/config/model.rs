//! Config model - sections of string key/values
//!
//! The source is TOML. Each top-level table is one section named after the
//! backend. Values are flattened to strings so every backend sees the same
//! shape: strings verbatim, arrays/tables as JSON text, scalars as text.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::backend::BuildError;
use crate::error::{BotsError, Result};

/// Raw key/values of one section
///
/// Constructors `take` the keys they understand; whatever remains is
/// reported as unexpected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSection {
    name: String,
    values: IndexMap<String, String>,
}

impl ConfigSection {
    pub fn new(name: impl Into<String>, values: IndexMap<String, String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn from_pairs<I, K, V>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            name,
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Remove and return a key
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.values.shift_remove(key)
    }

    pub fn require(&mut self, key: &str) -> std::result::Result<String, BuildError> {
        self.take(key).ok_or_else(|| BuildError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Remove a key and decode its value as JSON
    pub fn take_json<T: DeserializeOwned>(
        &mut self,
        key: &str,
    ) -> std::result::Result<Option<T>, BuildError> {
        let Some(raw) = self.take(key) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| BuildError::InvalidValue {
                key: key.to_string(),
                reason: format!("expected JSON ({}): {}", e, raw),
            })
    }

    pub fn remaining_keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail with [`BotsError::UnexpectedConfigKeys`] if anything was left untaken
    pub fn ensure_consumed(&self) -> Result<()> {
        if self.values.is_empty() {
            return Ok(());
        }
        Err(BotsError::UnexpectedConfigKeys {
            section: self.name.clone(),
            keys: self.remaining_keys(),
        })
    }
}

/// One section with a `type`, ready for the factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub type_name: String,
    pub config: ConfigSection,
}

impl BackendDescriptor {
    pub fn name(&self) -> &str {
        self.config.name()
    }
}

/// Parsed config source, sections in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigModel {
    sections: Vec<ConfigSection>,
}

impl ConfigModel {
    /// Key selecting the registered backend type
    pub const TYPE_KEY: &'static str = "type";

    /// Parse TOML text; `origin` is only used in error messages
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let table: toml::Table = text.parse().map_err(|e: toml::de::Error| BotsError::ConfigParse {
            path: origin.to_string(),
            details: e.message().to_string(),
        })?;

        let mut sections = Vec::with_capacity(table.len());
        for (name, value) in table {
            let toml::Value::Table(entries) = value else {
                return Err(BotsError::NotASection { key: name });
            };
            let values = entries
                .into_iter()
                .map(|(k, v)| (k, flatten_value(v)))
                .collect();
            sections.push(ConfigSection::new(name, values));
        }

        Ok(Self { sections })
    }

    pub fn from_sections(sections: Vec<ConfigSection>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[ConfigSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections that declare a `type`; the rest are skipped with a warning
    pub fn descriptors(&self) -> Vec<BackendDescriptor> {
        self.sections
            .iter()
            .filter_map(|section| {
                let mut config = section.clone();
                match config.take(Self::TYPE_KEY) {
                    Some(type_name) => Some(BackendDescriptor { type_name, config }),
                    None => {
                        warn!(section = %section.name(), "section missing `type` key; skipping");
                        None
                    }
                }
            })
            .collect()
    }
}

fn flatten_value(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        nested @ (toml::Value::Array(_) | toml::Value::Table(_)) => to_json(nested).to_string(),
    }
}

fn to_json(value: toml::Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        toml::Value::String(s) => Json::String(s),
        toml::Value::Integer(i) => Json::from(i),
        toml::Value::Float(f) => Json::from(f),
        toml::Value::Boolean(b) => Json::Bool(b),
        toml::Value::Datetime(d) => Json::String(d.to_string()),
        toml::Value::Array(items) => Json::Array(items.into_iter().map(to_json).collect()),
        toml::Value::Table(entries) => Json::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k, to_json(v)))
                .collect(),
        ),
    }
}
