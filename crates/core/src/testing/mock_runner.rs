//! Mock process runner for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::{EngineError, LineSink, ProcessRunner};

/// Mock implementation of the ProcessRunner trait.
///
/// Nothing is spawned. Every argument vector is recorded, the configured
/// lines are fed to the sink and the configured exit code is returned. On
/// exit code 0 the last argument is created as an empty file, matching the
/// convention that profile commands end with the output path.
///
/// # Example
///
/// ```rust,ignore
/// use composer_core::testing::MockProcessRunner;
///
/// let runner = Arc::new(MockProcessRunner::new().with_exit_code(1));
/// // Build engines with `runner`...
/// assert_eq!(runner.invocation_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockProcessRunner {
    exit_code: i32,
    lines: Vec<String>,
    create_output: bool,
    delay: Option<Duration>,
    invocations: Arc<RwLock<Vec<Vec<String>>>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessRunner {
    /// Create a runner that succeeds and creates the output file.
    pub fn new() -> Self {
        Self {
            exit_code: 0,
            lines: Vec::new(),
            create_output: true,
            delay: None,
            invocations: Arc::new(RwLock::new(Vec::new())),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Lines emitted before exiting.
    pub fn with_lines(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Succeed without creating the output file.
    pub fn without_output(mut self) -> Self {
        self.create_output = false;
        self
    }

    /// Simulated run time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all recorded argument vectors.
    pub async fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.read().await.clone()
    }

    /// Get the number of runs.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Highest number of runs that were in progress at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, argv: &[String], on_line: LineSink<'_>) -> Result<i32, EngineError> {
        self.invocations.write().await.push(argv.to_vec());

        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        for line in &self.lines {
            on_line(line);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.running.fetch_sub(1, Ordering::SeqCst);

        if self.exit_code == 0 && self.create_output {
            if let Some(output) = argv.last().filter(|_| argv.len() > 1) {
                tokio::fs::write(Path::new(output), b"").await?;
            }
        }
        Ok(self.exit_code)
    }
}
