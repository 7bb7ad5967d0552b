//! Progress reporting side channel.
//!
//! Progress is decoupled from the fetch logic: the pipeline calls an
//! injected observer exactly once per completed batch, whether the batch
//! succeeded or exhausted its retries. Presentation (a terminal bar, a log
//! line, nothing at all) is the observer's business.

/// Observer invoked once per unit of completed work.
pub trait ProgressObserver: Send + Sync {
    /// A batch finished, successfully or not. `completed` counts batches
    /// done so far out of `total`.
    fn batch_completed(&self, completed: usize, total: usize);
}

/// Observer that ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn batch_completed(&self, _completed: usize, _total: usize) {}
}
