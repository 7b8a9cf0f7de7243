use super::aggregate::BatchReport;

/// Observer hook for batch progress (rendering, audit, metrics).
pub trait BatchObserver: Send + Sync {
    fn name(&self) -> &str;
    fn on_event(&self, event: &BatchEvent);
}

/// Lifecycle events emitted by the batch engine.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    BatchStart {
        batch_id: String,
        total_tasks: usize,
    },
    TaskStart {
        batch_id: String,
        task_id: String,
        module: String,
        tool: String,
    },
    TaskSkipped {
        batch_id: String,
        task_id: String,
        /// First dependency found not to have succeeded.
        blocked_by: String,
    },
    TaskEnd {
        batch_id: String,
        task_id: String,
        success: bool,
        duration_ms: u64,
    },
    BatchEnd {
        batch_id: String,
        duration_ms: u64,
        report: BatchReport,
    },
}

impl BatchEvent {
    pub fn batch_id(&self) -> &str {
        match self {
            Self::BatchStart { batch_id, .. }
            | Self::TaskStart { batch_id, .. }
            | Self::TaskSkipped { batch_id, .. }
            | Self::TaskEnd { batch_id, .. }
            | Self::BatchEnd { batch_id, .. } => batch_id,
        }
    }
}

