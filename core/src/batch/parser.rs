//! JSONL batch parsing.
//!
//! ```text
//! {"id":"search","module":"docs","tool":"search","params":{"query":"design"}}
//! {"id":"page","module":"docs","tool":"get","params":{"id":"${search.results[0].id}"},"after":["search"],"output":true}
//! ```
//!
//! Structural problems reject the whole batch: nothing is ever partially
//! parsed.

use std::collections::HashMap;

use crate::error::BatchError;

use super::types::{BatchPlan, TaskDescriptor};

/// Parse a newline-delimited batch of task descriptors.
///
/// Blank lines are ignored. More than `max_commands` commands, a line that
/// is not a JSON object, a missing `id`/`module`/`tool`, a duplicate id or an
/// `after` entry naming a task outside the batch all fail the whole batch.
pub fn parse_batch(input: &str, max_commands: usize) -> Result<BatchPlan, BatchError> {
    let lines: Vec<(usize, &str)> = input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    if lines.len() > max_commands {
        return Err(BatchError::TooManyCommands {
            count: lines.len(),
            max: max_commands,
        });
    }

    let mut order = Vec::with_capacity(lines.len());
    let mut tasks: HashMap<String, TaskDescriptor> = HashMap::with_capacity(lines.len());

    for (line_no, line) in lines {
        let task: TaskDescriptor =
            serde_json::from_str(line).map_err(|e| BatchError::Parse {
                line: line_no,
                message: e.to_string(),
            })?;

        require(&task.id, line_no, "id")?;
        require(&task.module, line_no, "module")?;
        require(&task.tool, line_no, "tool")?;

        if tasks.contains_key(&task.id) {
            return Err(BatchError::DuplicateTaskId(task.id));
        }

        order.push(task.id.clone());
        tasks.insert(task.id.clone(), task);
    }

    for id in &order {
        let task = &tasks[id];
        if let Some(missing) = task.after.iter().find(|dep| !tasks.contains_key(*dep)) {
            return Err(BatchError::DependencyNotFound {
                task_id: id.clone(),
                missing_dep: missing.clone(),
            });
        }
    }

    Ok(BatchPlan { order, tasks })
}

fn require(value: &str, line: usize, field: &'static str) -> Result<(), BatchError> {
    if value.trim().is_empty() {
        return Err(BatchError::MissingField { line, field });
    }
    Ok(())
}
