use toolgate_core::batch::{BatchEvent, BatchObserver};

/// Mirrors batch events into `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn name(&self) -> &str {
        "tracing"
    }

    fn on_event(&self, event: &BatchEvent) {
        match event {
            BatchEvent::BatchStart {
                batch_id,
                total_tasks,
            } => tracing::info!(batch_id = %batch_id, total_tasks, "batch.start"),
            BatchEvent::TaskStart {
                batch_id,
                task_id,
                module,
                tool,
            } => tracing::debug!(batch_id = %batch_id, task_id = %task_id, module = %module, tool = %tool, "task.start"),
            BatchEvent::TaskSkipped {
                batch_id,
                task_id,
                blocked_by,
            } => tracing::info!(batch_id = %batch_id, task_id = %task_id, blocked_by = %blocked_by, "task.skipped"),
            BatchEvent::TaskEnd {
                batch_id,
                task_id,
                success,
                duration_ms,
            } => tracing::debug!(batch_id = %batch_id, task_id = %task_id, success, duration_ms, "task.end"),
            BatchEvent::BatchEnd {
                batch_id,
                duration_ms,
                report,
            } => tracing::info!(
                batch_id = %batch_id,
                duration_ms,
                succeeded = report.success_count,
                errors = report.response.errors.len(),
                "batch.end"
            ),
        }
    }
}
