use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::call::ToolCaller;
use crate::config::DEFAULT_MAX_COMMANDS;
use crate::error::BatchError;
use crate::module::ModuleRegistry;

use super::aggregate::{aggregate, BatchReport, CreditReporter};
use super::events::{BatchEvent, BatchObserver};
use super::graph::TaskGraph;
use super::parser::parse_batch;
use super::resolve::resolve_params;
use super::store::ResultStore;
use super::types::{BatchPlan, TaskDescriptor, TaskOutcome};

/// Terminal state broadcast to dependents. `None` until the task finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Done {
    Succeeded,
    Failed,
    Skipped,
}

type DoneSignal = Option<Done>;

impl From<&TaskOutcome> for Done {
    fn from(outcome: &TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Succeeded(_) => Self::Succeeded,
            TaskOutcome::Failed(_) => Self::Failed,
            TaskOutcome::Skipped => Self::Skipped,
        }
    }
}

/// Executes batches of tool calls whose order is constrained by `after`
/// dependencies.
///
/// Every task gets its own worker as soon as the batch starts. A worker
/// waits for the completion of each of its dependencies, then either skips
/// (some dependency failed or was skipped) or resolves its placeholders and
/// performs the call. There is no queue and no pool: the dependency waits
/// alone order the work.
pub struct BatchEngine {
    caller: Arc<ToolCaller>,
    max_commands: usize,
    observer: Option<Arc<dyn BatchObserver>>,
    credits: Option<Arc<dyn CreditReporter>>,
}

pub struct BatchEngineBuilder {
    registry: ModuleRegistry,
    max_commands: usize,
    observer: Option<Arc<dyn BatchObserver>>,
    credits: Option<Arc<dyn CreditReporter>>,
}

impl std::fmt::Debug for BatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchEngine")
            .field("registry", self.caller.registry())
            .field("max_commands", &self.max_commands)
            .field("observer", &self.observer.as_ref().map(|o| o.name().to_string()))
            .field("credits", &self.credits.is_some())
            .finish()
    }
}

/// State shared by the workers of one batch run.
struct WorkerCtx {
    batch_id: String,
    caller: Arc<ToolCaller>,
    store: Arc<ResultStore>,
    cancel: CancellationToken,
    observer: Option<Arc<dyn BatchObserver>>,
}

impl WorkerCtx {
    fn emit(&self, event: BatchEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

impl BatchEngine {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self::builder(registry).build()
    }

    pub fn builder(registry: ModuleRegistry) -> BatchEngineBuilder {
        BatchEngineBuilder::new(registry)
    }

    pub fn registry(&self) -> &ModuleRegistry {
        self.caller.registry()
    }

    /// Parse and validate a batch without running it.
    pub fn prepare(&self, commands: &str) -> Result<BatchPlan, BatchError> {
        let plan = parse_batch(commands, self.max_commands)?;
        TaskGraph::from_plan(&plan).validate()?;
        Ok(plan)
    }

    /// Parse, validate, execute and aggregate a JSONL batch.
    ///
    /// Structural problems are returned as `Err` before any task runs;
    /// task failures are reported inside the returned response.
    pub async fn run_batch(
        &self,
        cancel: &CancellationToken,
        commands: &str,
    ) -> Result<BatchReport, BatchError> {
        let plan = self.prepare(commands).inspect_err(|e| {
            tracing::warn!(error = %e, code = e.error_code(), "batch rejected");
        })?;

        let batch_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        tracing::info!(batch_id = %batch_id, tasks = plan.len(), "batch started");
        self.emit(BatchEvent::BatchStart {
            batch_id: batch_id.clone(),
            total_tasks: plan.len(),
        });

        let outcomes = self.execute_with_id(cancel, &plan, &batch_id).await;
        let report = aggregate(&plan, &outcomes, self.registry());

        if let Some(credits) = &self.credits {
            credits.report(&batch_id, &report.successful);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            batch_id = %batch_id,
            succeeded = report.success_count,
            failed = report.response.errors.len(),
            duration_ms,
            "batch finished"
        );
        self.emit(BatchEvent::BatchEnd {
            batch_id,
            duration_ms,
            report: report.clone(),
        });

        Ok(report)
    }

    /// Run every task of a plan and return each task's terminal outcome.
    ///
    /// The dependency graph is checked first, so a plan with a missing
    /// dependency or a cycle is refused without starting any worker.
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        plan: &BatchPlan,
    ) -> Result<HashMap<String, TaskOutcome>, BatchError> {
        TaskGraph::from_plan(plan).validate()?;
        Ok(self
            .execute_with_id(cancel, plan, &Uuid::new_v4().to_string())
            .await)
    }

    async fn execute_with_id(
        &self,
        cancel: &CancellationToken,
        plan: &BatchPlan,
        batch_id: &str,
    ) -> HashMap<String, TaskOutcome> {
        let ctx = Arc::new(WorkerCtx {
            batch_id: batch_id.to_string(),
            caller: self.caller.clone(),
            store: Arc::new(ResultStore::new()),
            cancel: cancel.clone(),
            observer: self.observer.clone(),
        });

        // One completion channel per task; dependents subscribe before any
        // worker starts so no completion can be missed.
        let mut senders: HashMap<&str, watch::Sender<DoneSignal>> = plan
            .order
            .iter()
            .map(|id| (id.as_str(), watch::Sender::new(None)))
            .collect();

        let mut workers = Vec::with_capacity(plan.len());
        for task in plan.iter() {
            let deps: Vec<(String, watch::Receiver<DoneSignal>)> = task
                .after
                .iter()
                .filter_map(|dep| {
                    senders
                        .get(dep.as_str())
                        .map(|tx| (dep.clone(), tx.subscribe()))
                })
                .collect();
            workers.push((task.id.clone(), task.clone(), deps));
        }

        let mut handles = Vec::with_capacity(workers.len());
        for (id, task, deps) in workers {
            let Some(done) = senders.remove(id.as_str()) else {
                continue;
            };
            let span = tracing::info_span!("task", batch_id = %batch_id, task_id = %id);
            let handle = tokio::spawn(run_task(ctx.clone(), task, deps, done).instrument(span));
            handles.push((id, handle));
        }

        let (ids, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let joined = join_all(handles).await;

        ids.into_iter()
            .zip(joined)
            .map(|(id, res)| {
                let outcome = res.unwrap_or_else(|e| {
                    tracing::error!(task_id = %id, error = %e, "task worker panicked");
                    TaskOutcome::Failed(format!("task '{id}' panicked"))
                });
                (id, outcome)
            })
            .collect()
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

/// Wait for one dependency to reach a terminal state. A dependency whose
/// worker vanished without announcing completion counts as failed.
async fn wait_done(dep_id: String, mut rx: watch::Receiver<DoneSignal>) -> (String, Done) {
    let done = match rx.wait_for(Option::is_some).await {
        Ok(signal) => (*signal).unwrap_or(Done::Failed),
        Err(_) => Done::Failed,
    };
    (dep_id, done)
}

async fn run_task(
    ctx: Arc<WorkerCtx>,
    task: TaskDescriptor,
    deps: Vec<(String, watch::Receiver<DoneSignal>)>,
    done: watch::Sender<DoneSignal>,
) -> TaskOutcome {
    // Dependencies are awaited as a set; list order only decides which
    // failed dependency gets reported.
    let statuses = join_all(deps.into_iter().map(|(id, rx)| wait_done(id, rx))).await;
    let blocked_by = statuses
        .into_iter()
        .find(|(_, status)| *status != Done::Succeeded)
        .map(|(id, _)| id);

    let outcome = match blocked_by {
        Some(blocked_by) => {
            tracing::debug!(blocked_by = %blocked_by, "skipping task");
            ctx.emit(BatchEvent::TaskSkipped {
                batch_id: ctx.batch_id.clone(),
                task_id: task.id.clone(),
                blocked_by,
            });
            TaskOutcome::Skipped
        }
        None => execute_task(&ctx, &task).await,
    };

    done.send_replace(Some(Done::from(&outcome)));
    outcome
}

async fn execute_task(ctx: &WorkerCtx, task: &TaskDescriptor) -> TaskOutcome {
    let params = resolve_params(&task.params, &ctx.store);

    ctx.emit(BatchEvent::TaskStart {
        batch_id: ctx.batch_id.clone(),
        task_id: task.id.clone(),
        module: task.module.clone(),
        tool: task.tool.clone(),
    });

    let start = Instant::now();
    let result = ctx
        .caller
        .run(&ctx.cancel, &task.module, &task.tool, &params)
        .await;
    let duration_ms = start.elapsed().as_millis() as u64;

    ctx.emit(BatchEvent::TaskEnd {
        batch_id: ctx.batch_id.clone(),
        task_id: task.id.clone(),
        success: !result.is_error,
        duration_ms,
    });

    if result.is_error {
        TaskOutcome::Failed(result.content)
    } else {
        // Published before the completion signal goes out.
        ctx.store.publish(&task.id, &result.content);
        TaskOutcome::Succeeded(result.content)
    }
}

impl BatchEngineBuilder {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            registry,
            max_commands: DEFAULT_MAX_COMMANDS,
            observer: None,
            credits: None,
        }
    }

    pub fn max_commands(mut self, max_commands: usize) -> Self {
        self.max_commands = max_commands.max(1);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn credit_reporter(mut self, reporter: Arc<dyn CreditReporter>) -> Self {
        self.credits = Some(reporter);
        self
    }

    pub fn build(self) -> BatchEngine {
        BatchEngine {
            caller: Arc::new(ToolCaller::new(self.registry)),
            max_commands: self.max_commands,
            observer: self.observer,
            credits: self.credits,
        }
    }
}
