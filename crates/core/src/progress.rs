//! Progress reporting for transfers and folder operations
//!
//! PathStore reports progress through an injected [`Progress`] observer.
//! Callers that want no output pass [`NoProgress`].

use std::sync::Arc;

/// What a progress total counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUnit {
    /// Bytes of a single file transfer
    Bytes,
    /// Items (files or folders) of a folder operation
    Items,
}

/// A running progress task
#[cfg_attr(test, mockall::automock)]
pub trait ProgressHandle: Send + Sync {
    /// Advance by `delta` units
    fn inc(&self, delta: u64);

    /// Mark the task complete
    fn finish(&self);
}

/// Observer that opens progress tasks
#[cfg_attr(test, mockall::automock)]
pub trait Progress: Send + Sync {
    /// Start a task labelled `label` expecting `total` units
    fn start(&self, label: &str, total: u64, unit: ProgressUnit) -> Box<dyn ProgressHandle>;
}

/// Observer that discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

struct NoopHandle;

impl ProgressHandle for NoopHandle {
    fn inc(&self, _delta: u64) {}

    fn finish(&self) {}
}

impl Progress for NoProgress {
    fn start(&self, _label: &str, _total: u64, _unit: ProgressUnit) -> Box<dyn ProgressHandle> {
        Box::new(NoopHandle)
    }
}

/// Shared no-op observer
pub fn no_progress() -> Arc<dyn Progress> {
    Arc::new(NoProgress)
}
