//! Single tool-call execution: module lookup, parameter validation and the
//! fixed per-call deadline.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::CallError;
use crate::module::{ModuleRegistry, Params};
use crate::validate::validate_params;

/// Hard deadline for one module call. Not configurable per call.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a single call. Failures are reported in-band through
/// `is_error`, so callers must check the flag rather than rely on `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn success(content: String) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn error(err: &CallError) -> Self {
        Self {
            content: err.to_string(),
            is_error: true,
        }
    }
}

/// Executes individual tool calls against a [`ModuleRegistry`].
#[derive(Debug, Clone)]
pub struct ToolCaller {
    registry: ModuleRegistry,
}

impl ToolCaller {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Run `module.tool(params)`, validating params first and giving up
    /// after [`CALL_TIMEOUT`] or as soon as `cancel` fires.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        module: &str,
        tool: &str,
        params: &Params,
    ) -> ToolCallResult {
        let start = Instant::now();
        let outcome = self.try_run(cancel, module, tool, params).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(content) => {
                tracing::info!(module, tool, duration_ms, outcome = "ok", "tool call finished");
                ToolCallResult::success(content)
            }
            Err(err) => {
                let outcome = match err {
                    CallError::Timeout { .. } => "timeout",
                    CallError::Cancelled(_) => "cancelled",
                    _ => "error",
                };
                tracing::warn!(module, tool, duration_ms, outcome, error = %err, "tool call failed");
                ToolCallResult::error(&err)
            }
        }
    }

    async fn try_run(
        &self,
        cancel: &CancellationToken,
        module_name: &str,
        tool_name: &str,
        params: &Params,
    ) -> Result<String, CallError> {
        let module = self
            .registry
            .get(module_name)
            .ok_or_else(|| CallError::ModuleNotFound(module_name.to_string()))?;

        let tool = module
            .tool(tool_name)
            .ok_or_else(|| CallError::ToolNotFound {
                module: module_name.to_string(),
                tool: tool_name.to_string(),
            })?;

        let params = match tool.input_schema.as_ref() {
            Some(schema) => {
                validate_params(schema, params).map_err(|e| CallError::Validation {
                    module: module_name.to_string(),
                    tool: tool_name.to_string(),
                    message: e.to_string(),
                })?
            }
            None => params.clone(),
        };

        if cancel.is_cancelled() {
            return Err(CallError::Cancelled(module_name.to_string()));
        }

        let call = tokio::time::timeout(CALL_TIMEOUT, module.execute_tool(tool_name, &params));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CallError::Cancelled(module_name.to_string())),
            res = call => match res {
                Ok(Ok(json)) => Ok(json),
                Ok(Err(e)) => Err(CallError::Module {
                    module: module_name.to_string(),
                    message: e.to_string(),
                }),
                Err(_) => Err(CallError::Timeout {
                    module: module_name.to_string(),
                    timeout: CALL_TIMEOUT,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModuleError;
    use crate::module::{Module, ToolDef};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Docs {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Module for Docs {
        fn name(&self) -> &str {
            "docs"
        }

        fn tools(&self) -> Vec<ToolDef> {
            vec![
                ToolDef::new("get", "fetch a page").with_schema(json!({
                    "required": ["id"],
                    "properties": { "id": { "type": "string" } }
                })),
                ToolDef::new("hang", "never returns"),
                ToolDef::new("broken", "always fails"),
            ]
        }

        async fn execute_tool(&self, tool: &str, params: &Params) -> Result<String, ModuleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match tool {
                "get" => Ok(json!({ "id": params["id"] }).to_string()),
                "hang" => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("{}".into())
                }
                _ => Err(ModuleError::Other("upstream said no".into())),
            }
        }
    }

    fn caller() -> (ToolCaller, Arc<Docs>) {
        let docs = Arc::new(Docs::default());
        let registry = ModuleRegistry::new().with(docs.clone());
        (ToolCaller::new(registry), docs)
    }

    fn params(v: serde_json::Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn returns_raw_json_unmodified() {
        let (caller, _) = caller();
        let res = caller
            .run(&CancellationToken::new(), "docs", "get", &params(json!({ "id": "p1" })))
            .await;
        assert_eq!(res, ToolCallResult::success(r#"{"id":"p1"}"#.into()));
    }

    #[tokio::test]
    async fn unknown_module_and_tool_are_in_band_errors() {
        let (caller, _) = caller();
        let cancel = CancellationToken::new();

        let res = caller.run(&cancel, "nope", "get", &Params::new()).await;
        assert!(res.is_error);
        assert_eq!(res.content, "module 'nope' not found");

        let res = caller.run(&cancel, "docs", "nope", &Params::new()).await;
        assert!(res.is_error);
        assert_eq!(res.content, "tool 'nope' not found in module 'docs'");
    }

    #[tokio::test]
    async fn validation_failure_skips_the_call() {
        let (caller, docs) = caller();
        let res = caller
            .run(&CancellationToken::new(), "docs", "get", &Params::new())
            .await;
        assert!(res.is_error);
        assert!(res.content.contains("missing required parameter 'id'"));
        assert_eq!(docs.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn module_error_names_module() {
        let (caller, _) = caller();
        let res = caller
            .run(&CancellationToken::new(), "docs", "broken", &Params::new())
            .await;
        assert!(res.is_error);
        assert_eq!(res.content, "module 'docs' failed: upstream said no");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_reported_with_module_and_duration() {
        let (caller, _) = caller();
        let res = caller
            .run(&CancellationToken::new(), "docs", "hang", &Params::new())
            .await;
        assert!(res.is_error);
        assert_eq!(res.content, "module 'docs' timed out after 30s");
    }

    #[tokio::test]
    async fn cancelled_parent_fails_immediately() {
        let (caller, docs) = caller();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = caller.run(&cancel, "docs", "hang", &Params::new()).await;
        assert!(res.is_error);
        assert_eq!(res.content, "call to module 'docs' cancelled");
        assert_eq!(docs.calls.load(Ordering::SeqCst), 0);
    }
}
