//! Observers of engine activity.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

/// Summary of one finished engine invocation.
#[derive(Debug, Clone)]
pub struct EngineEvent {
    pub engine: String,
    pub profile_id: String,
    pub sources: Vec<PathBuf>,
    pub output: PathBuf,
    pub exit_code: i32,
}

/// Receives engine notifications. All methods default to no-ops.
///
/// A panicking listener is logged and skipped; it never fails the operation.
pub trait EngineListener: Send + Sync {
    fn on_output_line(&self, _engine: &str, _line: &str) {}

    fn on_produced(&self, _event: &EngineEvent) {}

    fn on_failed(&self, _event: &EngineEvent) {}
}

/// An ordered set of listeners.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Vec<Arc<dyn EngineListener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Arc<dyn EngineListener>) {
        self.inner.push(listener);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn output_line(&self, engine: &str, line: &str) {
        self.each("on_output_line", |l| l.on_output_line(engine, line));
    }

    pub fn produced(&self, event: &EngineEvent) {
        self.each("on_produced", |l| l.on_produced(event));
    }

    pub fn failed(&self, event: &EngineEvent) {
        self.each("on_failed", |l| l.on_failed(event));
    }

    fn each<F>(&self, hook: &str, f: F)
    where
        F: Fn(&dyn EngineListener),
    {
        for listener in &self.inner {
            if catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))).is_err() {
                warn!("Engine listener panicked in {}", hook);
            }
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.inner.len())
            .finish()
    }
}

impl FromIterator<Arc<dyn EngineListener>> for Listeners {
    fn from_iter<I: IntoIterator<Item = Arc<dyn EngineListener>>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
