//! Recurrence modes - how often a recurring backend may run

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::backend::BuildError;
use crate::config::ConfigSection;

/// How often a recurring backend may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recurrence {
    Never,
    Always,
    Hourly,
    Daily,
    Monthly,
    Yearly,
}

impl Recurrence {
    /// Config key holding the recurrence name
    pub const KEY: &'static str = "cron";

    pub const ALL: [Recurrence; 6] = [
        Recurrence::Never,
        Recurrence::Always,
        Recurrence::Hourly,
        Recurrence::Daily,
        Recurrence::Monthly,
        Recurrence::Yearly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Never => "never",
            Recurrence::Always => "always",
            Recurrence::Hourly => "hourly",
            Recurrence::Daily => "daily",
            Recurrence::Monthly => "monthly",
            Recurrence::Yearly => "yearly",
        }
    }

    /// Minimum time between two runs; `None` means no further runs
    pub fn interval(self) -> Option<Duration> {
        match self {
            Recurrence::Never => None,
            Recurrence::Always => Some(Duration::zero()),
            Recurrence::Hourly => Some(Duration::hours(1)),
            Recurrence::Daily => Some(Duration::days(1)),
            Recurrence::Monthly => Some(Duration::days(30)),
            Recurrence::Yearly => Some(Duration::days(365)),
        }
    }

    /// Take the `cron` key from a section, defaulting to `never`
    pub fn from_section(section: &mut ConfigSection) -> Result<Self, BuildError> {
        match section.take(Self::KEY) {
            None => Ok(Recurrence::Never),
            Some(value) => value.parse().map_err(|reason| BuildError::InvalidValue {
                key: Self::KEY.to_string(),
                reason,
            }),
        }
    }

    pub fn props(self) -> BTreeMap<String, String> {
        BTreeMap::from([(Self::KEY.to_string(), self.as_str().to_string())])
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // "none" is what older configs used for never
        if s.eq_ignore_ascii_case("none") {
            return Ok(Recurrence::Never);
        }
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown recurrence '{}', expected one of: {}", s, valid.join(", "))
            })
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
