//! A composer service wired to in-memory and mock collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::composer::{ComposerConfig, ComposerService, DispatchMode};
use crate::engine::{CommandEngineFactory, EngineConfig, Listeners};
use crate::job::{InMemoryJobStore, JobStatus, JobStore};
use crate::profile::{EncodingProfile, StaticProfileRegistry};
use crate::workspace::{FsWorkspace, WorkspaceConfig};

use super::failing_store::FailingJobStore;
use super::fixtures;
use super::mock_inspection::{InspectionMode, MockInspectionService};
use super::mock_runner::MockProcessRunner;

/// Composer plus handles on every collaborator for assertions.
pub struct ComposerHarness {
    pub service: ComposerService,
    pub jobs: Arc<dyn JobStore>,
    pub runner: Arc<MockProcessRunner>,
    pub inspection: Arc<MockInspectionService>,
    pub workspace: Arc<FsWorkspace>,
    root: PathBuf,
}

impl ComposerHarness {
    /// Starts a builder for a workspace rooted at `root`.
    pub fn builder(root: impl Into<PathBuf>) -> ComposerHarnessBuilder {
        ComposerHarnessBuilder::new(root.into())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a file at a workspace location.
    pub async fn stage(&self, location: &str) -> std::io::Result<PathBuf> {
        let path = self.root.join(location);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, b"media").await?;
        Ok(path)
    }
}

pub struct ComposerHarnessBuilder {
    root: PathBuf,
    config: ComposerConfig,
    runner: MockProcessRunner,
    mode: InspectionMode,
    fail_on: Vec<JobStatus>,
    profiles: Vec<EncodingProfile>,
}

impl ComposerHarnessBuilder {
    fn new(root: PathBuf) -> Self {
        let config = ComposerConfig {
            inspection_poll_interval_ms: 10,
            inspection_timeout_secs: 5,
            ..Default::default()
        };
        Self {
            root,
            config,
            runner: MockProcessRunner::new(),
            mode: InspectionMode::Succeed,
            fail_on: Vec::new(),
            profiles: fixtures::profiles(),
        }
    }

    pub fn dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.config.dispatch = dispatch;
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.max_workers = workers;
        self
    }

    pub fn runner(mut self, runner: MockProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn inspection(mut self, mode: InspectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn inspection_timeout(mut self, timeout: Duration) -> Self {
        self.config.inspection_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Registers a profile next to the fixture profiles.
    pub fn profile(mut self, profile: EncodingProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Makes the composer's job store reject writes of `status`.
    pub fn fail_on(mut self, status: JobStatus) -> Self {
        self.fail_on.push(status);
        self
    }

    pub fn build(self) -> ComposerHarness {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let jobs: Arc<dyn JobStore> = if self.fail_on.is_empty() {
            Arc::clone(&store)
        } else {
            let failing = self
                .fail_on
                .into_iter()
                .fold(FailingJobStore::new(Arc::clone(&store)), FailingJobStore::fail_on);
            Arc::new(failing)
        };

        let runner = Arc::new(self.runner);
        let inspection = Arc::new(MockInspectionService::new(store).with_mode(self.mode));
        let workspace = Arc::new(FsWorkspace::new(WorkspaceConfig::with_root(self.root.clone())));
        let engines = CommandEngineFactory::new(
            &EngineConfig::default(),
            runner.clone(),
            Listeners::new(),
        );

        let service = ComposerService::new(
            self.config,
            Arc::clone(&jobs),
            workspace.clone(),
            Arc::new(StaticProfileRegistry::new(self.profiles)),
            Arc::new(engines),
            inspection.clone(),
        );

        ComposerHarness {
            service,
            jobs,
            runner,
            inspection,
            workspace,
            root: self.root,
        }
    }
}
