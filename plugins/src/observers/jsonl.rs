use std::io::Write;
use std::sync::Mutex;

use chrono::Local;
use serde_json::{json, Value};
use toolgate_core::batch::{BatchEvent, BatchObserver};

/// Writes one JSON event per line, by default to stderr.
pub struct JsonlObserver {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonlObserver {
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn event_to_json(event: &BatchEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            BatchEvent::BatchStart {
                batch_id,
                total_tasks,
            } => json!({
                "v": 1,
                "event_type": "batch.start",
                "ts": ts,
                "batch_id": batch_id,
                "metadata": { "total_tasks": total_tasks }
            }),
            BatchEvent::TaskStart {
                batch_id,
                task_id,
                module,
                tool,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "batch_id": batch_id,
                "task_id": task_id,
                "metadata": { "module": module, "tool": tool }
            }),
            BatchEvent::TaskSkipped {
                batch_id,
                task_id,
                blocked_by,
            } => json!({
                "v": 1,
                "event_type": "task.skipped",
                "ts": ts,
                "batch_id": batch_id,
                "task_id": task_id,
                "metadata": { "blocked_by": blocked_by }
            }),
            BatchEvent::TaskEnd {
                batch_id,
                task_id,
                success,
                duration_ms,
            } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "batch_id": batch_id,
                "task_id": task_id,
                "metadata": { "success": success, "duration_ms": duration_ms }
            }),
            BatchEvent::BatchEnd {
                batch_id,
                duration_ms,
                report,
            } => json!({
                "v": 1,
                "event_type": "batch.end",
                "ts": ts,
                "batch_id": batch_id,
                "metadata": {
                    "duration_ms": duration_ms,
                    "success_count": report.success_count,
                    "error_count": report.response.errors.len(),
                }
            }),
        }
    }
}

impl BatchObserver for JsonlObserver {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn on_event(&self, event: &BatchEvent) {
        let line = Self::event_to_json(event).to_string();
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "failed to write batch event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_enveloped_event_per_line() {
        let buf = SharedBuf::default();
        let observer = JsonlObserver::new(Box::new(buf.clone()));

        observer.on_event(&BatchEvent::BatchStart {
            batch_id: "b1".into(),
            total_tasks: 2,
        });
        observer.on_event(&BatchEvent::TaskSkipped {
            batch_id: "b1".into(),
            task_id: "t2".into(),
            blocked_by: "t1".into(),
        });

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event_type"], "batch.start");
        assert_eq!(lines[0]["metadata"]["total_tasks"], 2);
        assert_eq!(lines[1]["task_id"], "t2");
        assert_eq!(lines[1]["metadata"]["blocked_by"], "t1");
        assert!(lines[1]["ts"].is_string());
    }
}
