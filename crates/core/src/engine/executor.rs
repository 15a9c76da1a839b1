//! Shared run sequence of the command line engines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::metrics;
use crate::profile::EncodingProfile;

use super::error::EngineError;
use super::listener::{EngineEvent, Listeners};
use super::params::{EngineInputs, ParamMap, ParameterTable};
use super::runner::ProcessRunner;
use super::template;

/// Builds the parameter table, resolves the profile's command for this
/// engine, runs it and reports the outcome to the listeners.
pub(crate) struct CommandExecutor {
    engine: String,
    binary: String,
    runner: Arc<dyn ProcessRunner>,
    listeners: Listeners,
}

impl CommandExecutor {
    pub fn new(
        engine: impl Into<String>,
        binary: impl Into<String>,
        runner: Arc<dyn ProcessRunner>,
        listeners: Listeners,
    ) -> Self {
        Self {
            engine: engine.into(),
            binary: binary.into(),
            runner,
            listeners,
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Runs the profile against the inputs and returns the produced file.
    pub async fn execute(
        &self,
        inputs: EngineInputs<'_>,
        profile: &EncodingProfile,
        extra: &ParamMap,
    ) -> Result<PathBuf, EngineError> {
        if inputs.is_empty() {
            return Err(EngineError::NoInput);
        }

        let table = ParameterTable::build(&inputs, profile, extra)?;
        let options =
            profile
                .command(&self.engine)
                .ok_or_else(|| EngineError::MissingCommand {
                    profile: profile.identifier.clone(),
                    engine: self.engine.clone(),
                })?;
        let output = table
            .output_path()
            .ok_or_else(|| EngineError::invalid_parameter("output path cannot be derived"))?;

        let sources = inputs
            .paths()
            .map(std::path::absolute)
            .collect::<Result<Vec<_>, _>>()?;
        if sources.iter().any(|source| *source == output) {
            return Err(EngineError::invalid_parameter(format!(
                "output {} would overwrite its input",
                output.display()
            )));
        }

        let argv = template::resolve(&self.binary, options, &table);
        info!(
            "Running {} with profile {} on {}",
            self.engine,
            profile.identifier,
            sources
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let engine = self.engine.as_str();
        let on_line = |line: &str| {
            debug!(engine, "{}", line);
            self.listeners.output_line(engine, line);
        };
        let exit_code = self.runner.run(&argv, &on_line).await?;

        let event = EngineEvent {
            engine: self.engine.clone(),
            profile_id: profile.identifier.clone(),
            sources,
            output: output.clone(),
            exit_code,
        };

        if exit_code != 0 {
            metrics::SUBPROCESS_EXITS
                .with_label_values(&[engine, "failure"])
                .inc();
            warn!("{} exited with code {}", self.binary, exit_code);
            remove_partial(&output).await;
            self.listeners.failed(&event);
            return Err(EngineError::NonZeroExit {
                binary: self.binary.clone(),
                code: exit_code,
            });
        }
        metrics::SUBPROCESS_EXITS
            .with_label_values(&[engine, "success"])
            .inc();

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            warn!("{} reported success but produced no {}", self.binary, output.display());
            self.listeners.failed(&event);
            return Err(EngineError::OutputMissing { path: output });
        }

        info!("Produced {}", output.display());
        self.listeners.produced(&event);
        Ok(output)
    }
}

/// Best-effort removal of whatever a failed run left behind.
async fn remove_partial(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => debug!("Removed partial output {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial output {}: {}", output.display(), e),
    }
}
