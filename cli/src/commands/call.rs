use tokio_util::sync::CancellationToken;
use toolgate_core::{CliError, ModuleRegistry, Params, ToolCaller};

use crate::commands::cli::{CallArgs, OutputFormat};

pub async fn handle_call(
    args: CallArgs,
    registry: ModuleRegistry,
    cancel: &CancellationToken,
) -> Result<i32, CliError> {
    let (code, body) = call_tool(&args, registry, cancel).await?;
    if code == 0 {
        println!("{body}");
    } else {
        eprintln!("{body}");
    }
    Ok(code)
}

pub async fn call_tool(
    args: &CallArgs,
    registry: ModuleRegistry,
    cancel: &CancellationToken,
) -> Result<(i32, String), CliError> {
    let params = parse_params(&args.params)?;
    let caller = ToolCaller::new(registry);
    let result = caller.run(cancel, &args.module, &args.tool, &params).await;

    if result.is_error {
        return Ok((1, result.content));
    }

    let body = match args.format {
        OutputFormat::Json => result.content,
        OutputFormat::Compact => caller
            .registry()
            .get(&args.module)
            .and_then(|m| m.to_compact(&args.tool, &result.content))
            .unwrap_or(result.content),
    };
    Ok((0, body))
}

fn parse_params(raw: &str) -> Result<Params, CliError> {
    match serde_json::from_str(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::Usage("--params must be a JSON object".into())),
        Err(e) => Err(CliError::Usage(format!("--params is not valid JSON: {e}"))),
    }
}
