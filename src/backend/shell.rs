//! `shell` backend - runs a command through `sh -c`
//!
//! Mostly useful so plain commands can take part in `depends` chains.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::config::ConfigSection;
use crate::schedule::Recurrence;
use crate::store::StateStore;

use super::{Backend, BackendCore, BackendType, BuildError, RunError};

#[derive(Debug)]
pub struct ShellBackend {
    core: BackendCore,
    command: String,
    cron: Recurrence,
}

impl ShellBackend {
    pub const TYPE_NAME: &'static str = "shell";

    pub fn new(core: BackendCore, command: impl Into<String>, cron: Recurrence) -> Self {
        Self {
            core,
            command: command.into(),
            cron,
        }
    }

    pub fn backend_type() -> BackendType {
        BackendType {
            name: Self::TYPE_NAME,
            summary: "Runs an arbitrary shell command.\n\
                      Keys: command (required), cron (optional recurrence, default never).\n\
                      Lets plain commands depend on, or be depended on by, other backends.",
            recurring: true,
            build: Self::build,
        }
    }

    fn build(
        core: BackendCore,
        section: &mut ConfigSection,
    ) -> Result<Arc<dyn Backend>, BuildError> {
        let command = section.require("command")?;
        let cron = Recurrence::from_section(section)?;
        Ok(Arc::new(Self::new(core, command, cron)))
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Backend for ShellBackend {
    fn core(&self) -> &BackendCore {
        &self.core
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    #[instrument(skip(self, _state), fields(backend = %self.core.name))]
    async fn run(&self, _state: &StateStore) -> Result<(), RunError> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .status()
            .await
            .map_err(|source| RunError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        debug!(%status, "command exited");
        if !status.success() {
            return Err(RunError::ExitStatus {
                command: self.command.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn props(&self) -> BTreeMap<String, String> {
        let mut props = self.cron.props();
        props.insert("command".into(), self.command.clone());
        props
    }

    fn recurrence(&self) -> Option<Recurrence> {
        Some(self.cron)
    }
}
