mod config;
mod hook;
mod host;
mod run;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use critique_agent::AgentType;
use critique_logging::{init_tracing, LogFormat, Logger};

use crate::run::RunOptions;

#[derive(Parser, Debug)]
#[command(
    name = "critique",
    about = "Structured critique of prose and code through a coding agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Critique a file, or the last response in a transcript
    Run(RunArgs),
    /// Pre-tool-use hook that enforces the write guard (run by the agent)
    Hook,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Transcript JSONL file, or a directory to take the newest one from
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Working directory (default: current directory)
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Agent that runs the critique turn
    #[arg(short, long, value_enum)]
    agent: Option<AgentChoice>,

    /// Model to use (if agent supports it)
    #[arg(short, long)]
    model: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Also append JSON log events to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Treat the session as interactive even when stdin is not a terminal
    #[arg(long)]
    force_interactive: bool,

    /// Output the result as JSON
    #[arg(long)]
    json_output: bool,

    /// Arguments for /critique, e.g. `report.md --code`. Put `--` first to
    /// pass `-h` or `--help` through.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AgentChoice {
    Claude,
    Opencode,
}

impl From<AgentChoice> for AgentType {
    fn from(choice: AgentChoice) -> Self {
        match choice {
            AgentChoice::Claude => AgentType::ClaudeCode,
            AgentChoice::Opencode => AgentType::OpenCode,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Hook => {
            // stdout carries the decision, so diagnostics stay on stderr
            init_tracing("warn", LogFormat::Compact);
            hook::handle_hook_command()
        }
        Commands::Run(args) => {
            let log_format: LogFormat = args.log_format.into();
            init_tracing("warn", log_format);

            // Guard paths are absolute, so the working directory must be too.
            // The log file is reopened by the hook from the agent's directory.
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            let working_dir = match args.working_dir {
                Some(dir) => current_dir.join(dir),
                None => current_dir.clone(),
            };
            let log_file = args.log_file.map(|path| current_dir.join(path));

            let logger = match log_file {
                Some(ref path) => Logger::with_file(log_format, path)
                    .with_context(|| format!("Failed to open log file {}", path.display()))?,
                None => Logger::new(log_format),
            };

            let options = RunOptions {
                args: args.args,
                working_dir,
                transcript: args.transcript,
                agent: args.agent.map(Into::into),
                model: args.model,
                force_interactive: args.force_interactive,
                json_output: args.json_output,
                log_file,
            };

            let exit_code = run::handle_run_command(options, Arc::new(logger)).await?;
            std::process::exit(exit_code);
        }
    }
}
