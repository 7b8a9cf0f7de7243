use toolgate_core::{CliError, ModuleRegistry};

use crate::commands::cli::ToolsArgs;

pub fn handle_tools(args: ToolsArgs, registry: &ModuleRegistry) -> Result<i32, CliError> {
    print!("{}", render_tools(registry, args.module.as_deref())?);
    Ok(0)
}

pub fn render_tools(registry: &ModuleRegistry, only: Option<&str>) -> Result<String, CliError> {
    if let Some(name) = only {
        if registry.get(name).is_none() {
            return Err(CliError::Usage(format!("module '{name}' not found")));
        }
    }

    let mut out = String::new();
    for module in registry.modules() {
        if only.is_some_and(|n| n != module.name()) {
            continue;
        }
        out.push_str(module.name());
        if !module.description().is_empty() {
            out.push_str(" - ");
            out.push_str(module.description());
        }
        out.push('\n');
        for tool in module.tools() {
            out.push_str(&format!("  {}: {}\n", tool.name, tool.description));
        }
    }
    Ok(out)
}
