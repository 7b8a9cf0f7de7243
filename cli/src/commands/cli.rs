use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "toolgate", version, about = "Batch tool-call orchestrator")]
pub struct Args {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a JSONL batch of tool calls
    Batch(BatchArgs),
    /// Invoke a single tool
    Call(CallArgs),
    /// List registered modules and their tools
    Tools(ToolsArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BatchArgs {
    /// JSONL file with one command per line (reads stdin when omitted)
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<String>,

    /// Emit progress events to stderr ("jsonl" or "log")
    #[arg(long, value_name = "KIND")]
    pub events: Option<String>,

    /// Pretty-print the response JSON
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CallArgs {
    #[arg(long)]
    pub module: String,

    #[arg(long)]
    pub tool: String,

    /// Tool parameters as a JSON object
    #[arg(long, default_value = "{}")]
    pub params: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ToolsArgs {
    /// Only list tools of this module
    #[arg(long)]
    pub module: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Compact,
}
