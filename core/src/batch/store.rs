use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Raw JSON results of completed tasks, keyed by task id.
///
/// Each key is written once, by the worker that owns the task, before that
/// task's completion is announced. Readers only look up ids whose
/// completion they have already observed.
#[derive(Debug, Default)]
pub struct ResultStore {
    inner: RwLock<HashMap<String, Arc<str>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, task_id: &str, json: &str) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.insert(task_id.to_string(), Arc::from(json)).is_some() {
            tracing::warn!(task_id, "result published twice, keeping the latest");
        }
    }

    pub fn get(&self, task_id: &str) -> Option<Arc<str>> {
        let guard = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(task_id).cloned()
    }
}
