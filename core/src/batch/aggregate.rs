use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::module::ModuleRegistry;

use super::types::{BatchPlan, TaskOutcome};

/// Error text recorded for a task whose upstream failed or was skipped.
pub const SKIPPED_MESSAGE: &str = "skipped due to dependency failure";

/// Wire response of a batch. Empty maps are omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub results: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

/// A task that executed without error; one credit each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessfulTask {
    pub task_id: String,
    pub module: String,
    pub tool: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub response: BatchResponse,
    /// Number of tasks that neither errored nor were skipped. This is what
    /// usage credits are charged against.
    pub success_count: usize,
    pub successful: Vec<SuccessfulTask>,
}

/// Receives the successful-task list of every finished batch.
pub trait CreditReporter: Send + Sync {
    fn report(&self, batch_id: &str, successful: &[SuccessfulTask]);
}

/// Fold per-task outcomes into the response, walking tasks in parse order.
pub fn aggregate(
    plan: &BatchPlan,
    outcomes: &HashMap<String, TaskOutcome>,
    registry: &ModuleRegistry,
) -> BatchReport {
    let mut report = BatchReport::default();

    for task in plan.iter() {
        match outcomes.get(&task.id) {
            Some(TaskOutcome::Succeeded(json)) => {
                report.success_count += 1;
                report.successful.push(SuccessfulTask {
                    task_id: task.id.clone(),
                    module: task.module.clone(),
                    tool: task.tool.clone(),
                });

                if task.output {
                    let rendered = if task.wants_json() {
                        json.clone()
                    } else {
                        registry
                            .get(&task.module)
                            .and_then(|m| m.to_compact(&task.tool, json))
                            .unwrap_or_else(|| json.clone())
                    };
                    report.response.results.insert(task.id.clone(), rendered);
                }
            }
            Some(TaskOutcome::Failed(err)) => {
                report.response.errors.insert(task.id.clone(), err.clone());
            }
            Some(TaskOutcome::Skipped) => {
                report
                    .response
                    .errors
                    .insert(task.id.clone(), SKIPPED_MESSAGE.to_string());
            }
            None => {
                report
                    .response
                    .errors
                    .insert(task.id.clone(), "task did not complete".to_string());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::parse_batch;
    use crate::error::ModuleError;
    use crate::module::{Module, Params, ToolDef};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct Csvish;

    #[async_trait]
    impl Module for Csvish {
        fn name(&self) -> &str {
            "m"
        }

        fn tools(&self) -> Vec<ToolDef> {
            vec![ToolDef::new("t", "")]
        }

        async fn execute_tool(&self, _: &str, _: &Params) -> Result<String, ModuleError> {
            Ok("[]".into())
        }

        fn to_compact(&self, _tool: &str, _json: &str) -> Option<String> {
            Some("compact!".into())
        }
    }

    #[test]
    fn splits_outcomes_and_counts_credits() {
        let plan = parse_batch(
            r#"{"id":"a","module":"m","tool":"t","output":true}
{"id":"b","module":"m","tool":"t","output":true,"params":{"format":"json"}}
{"id":"c","module":"m","tool":"t"}
{"id":"d","module":"m","tool":"t","output":true}
{"id":"e","module":"m","tool":"t","after":["d"],"output":true}"#,
            10,
        )
        .unwrap();
        let outcomes: HashMap<String, TaskOutcome> = [
            ("a", TaskOutcome::Succeeded("[1]".into())),
            ("b", TaskOutcome::Succeeded("[2]".into())),
            ("c", TaskOutcome::Succeeded("[3]".into())),
            ("d", TaskOutcome::Failed("boom".into())),
            ("e", TaskOutcome::Skipped),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let registry = ModuleRegistry::new().with(Arc::new(Csvish));

        let report = aggregate(&plan, &outcomes, &registry);

        assert_eq!(report.success_count, 3);
        assert_eq!(
            report.successful.iter().map(|t| t.task_id.as_str()).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
        assert_eq!(report.response.results.get("a").map(String::as_str), Some("compact!"));
        assert_eq!(report.response.results.get("b").map(String::as_str), Some("[2]"));
        assert!(!report.response.results.contains_key("c"));
        assert_eq!(report.response.errors["d"], "boom");
        assert_eq!(report.response.errors["e"], SKIPPED_MESSAGE);
    }

    #[test]
    fn empty_maps_are_omitted_on_the_wire() {
        assert_eq!(serde_json::to_string(&BatchResponse::default()).unwrap(), "{}");

        let mut only_errors = BatchResponse::default();
        only_errors.errors.insert("a".into(), "x".into());
        assert_eq!(
            serde_json::to_string(&only_errors).unwrap(),
            r#"{"errors":{"a":"x"}}"#
        );
    }

    #[test]
    fn successful_task_uses_camel_case() {
        let t = SuccessfulTask {
            task_id: "a".into(),
            module: "m".into(),
            tool: "t".into(),
        };
        assert_eq!(
            serde_json::to_value(&t).unwrap(),
            serde_json::json!({ "taskId": "a", "module": "m", "tool": "t" })
        );
    }
}
