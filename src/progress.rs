use std::path::Path;

/// Receives a tick for every export the aggregator reads.
///
/// The scan passes its own position into every call, so one reporter can be
/// shared by scans running at the same time. Implementations only observe
/// the scan, they can not change what it returns.
pub trait Progress: Send + Sync {
    fn start(&self, total: usize);
    fn tick(&self, done: usize, total: usize, source: &Path);
    fn finish(&self, total: usize);
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _total: usize) {}
    fn tick(&self, _done: usize, _total: usize, _source: &Path) {}
    fn finish(&self, _total: usize) {}
}

#[derive(Default)]
pub struct LogProgress;

impl LogProgress {
    pub fn new() -> Self {
        LogProgress
    }
}

impl Progress for LogProgress {
    fn start(&self, total: usize) {
        tracing::debug!(total, "reading exports");
    }

    fn tick(&self, done: usize, total: usize, source: &Path) {
        tracing::info!(done, total, "{} : processing...", source.display());
    }

    fn finish(&self, total: usize) {
        tracing::debug!(files = total, "scan complete");
    }
}
