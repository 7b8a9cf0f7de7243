use std::io::Read;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use toolgate_core::config::AppConfig;
use toolgate_core::{BatchEngine, BatchError, CliError, ModuleRegistry};
use toolgate_plugins::credits::LogCreditReporter;
use toolgate_plugins::factory;

use crate::commands::cli::BatchArgs;

/// Exit code for a batch refused before any task ran.
pub const EXIT_REJECTED: i32 = 2;

pub async fn handle_batch(
    args: BatchArgs,
    cfg: &AppConfig,
    registry: ModuleRegistry,
    cancel: &CancellationToken,
) -> Result<i32, CliError> {
    let input = match args.file.as_deref() {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let engine = build_engine(cfg, registry, args.events.as_deref())?;
    let (code, body) = run_commands(&engine, cancel, &input, args.pretty).await?;
    println!("{body}");
    Ok(code)
}

pub fn build_engine(
    cfg: &AppConfig,
    registry: ModuleRegistry,
    events: Option<&str>,
) -> Result<BatchEngine, CliError> {
    let mut builder = BatchEngine::builder(registry)
        .max_commands(cfg.batch.max_commands)
        .credit_reporter(std::sync::Arc::new(LogCreditReporter));

    if let Some(kind) = events {
        let observer = factory::build_observer(kind).ok_or_else(|| {
            CliError::Usage(format!("unknown event sink '{kind}' (expected jsonl or log)"))
        })?;
        builder = builder.observer(observer);
    }

    Ok(builder.build())
}

/// Run a batch and render what should be printed, paired with the exit code.
pub async fn run_commands(
    engine: &BatchEngine,
    cancel: &CancellationToken,
    input: &str,
    pretty: bool,
) -> Result<(i32, String), CliError> {
    let (code, value) = match engine.run_batch(cancel, input).await {
        Ok(report) => {
            let value = serde_json::to_value(&report.response).map_err(anyhow::Error::from)?;
            (0, value)
        }
        Err(err) => (EXIT_REJECTED, rejection(&err)),
    };

    let body = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .map_err(anyhow::Error::from)?;
    Ok((code, body))
}

fn rejection(err: &BatchError) -> serde_json::Value {
    json!({ "error": err.to_string(), "code": err.error_code() })
}
