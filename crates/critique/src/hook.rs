//! `critique hook`: enforces the write guard from inside the agent.
//!
//! The agent runs this as a pre-tool-use hook. The guard armed by
//! `critique run` arrives through [`GUARD_ENV`] in the agent's environment,
//! the tool call arrives as JSON on stdin, and a block decision is printed as
//! JSON on stdout. Printing nothing lets the call proceed.
//!
//! Refusals are also reported on stderr through `tracing`, and appended to
//! the run's JSON log when `critique run --log-file` exported [`LOG_FILE_ENV`].

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use critique_core::{GuardVerdict, ToolCall, ToolOperation, WriteGuard};
use critique_logging::{LogEvent, LogFormat, Logger};

/// Environment variable carrying the serialized [`WriteGuard`]
pub const GUARD_ENV: &str = "CRITIQUE_WRITE_GUARD";

/// Environment variable naming the JSON log file of the parent run
pub const LOG_FILE_ENV: &str = "CRITIQUE_LOG_FILE";

#[derive(Debug, Deserialize)]
struct HookInput {
    tool_name: String,
    #[serde(default)]
    tool_input: ToolInput,
    #[serde(default)]
    cwd: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolInput {
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    notebook_path: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

impl ToolInput {
    fn target_path(self) -> Option<String> {
        self.file_path.or(self.notebook_path).or(self.path)
    }
}

#[derive(Debug, Serialize)]
struct HookOutput {
    decision: &'static str,
    reason: String,
}

pub fn handle_hook_command() -> Result<()> {
    let guard = match std::env::var(GUARD_ENV) {
        Ok(value) => value,
        // No critique turn in progress
        Err(_) => return Ok(()),
    };

    let mut payload = String::new();
    std::io::stdin()
        .read_to_string(&mut payload)
        .context("Failed to read hook payload from stdin")?;

    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    if let GuardVerdict::Block { reason } = evaluate(&payload, Some(&guard), &cwd) {
        let event = blocked_event(&payload, &reason);
        let output = HookOutput {
            decision: "block",
            reason,
        };
        println!("{}", serde_json::to_string(&output)?);

        if let LogEvent::ToolCallBlocked { ref tool, ref path, .. } = event {
            warn!(tool = %tool, path = ?path, "Blocked tool call during critique");
        }
        if let Ok(log_file) = std::env::var(LOG_FILE_ENV) {
            // Logging failures never change the decision
            if let Err(e) = record_block(Path::new(&log_file), &event) {
                warn!(error = %e, log_file = %log_file, "Failed to record blocked tool call");
            }
        }
    }

    Ok(())
}

fn blocked_event(payload: &str, reason: &str) -> LogEvent {
    let (tool, path) = match serde_json::from_str::<HookInput>(payload) {
        Ok(input) => (input.tool_name, input.tool_input.target_path()),
        Err(_) => ("unknown".to_string(), None),
    };
    LogEvent::ToolCallBlocked {
        tool,
        path,
        reason: reason.to_string(),
    }
}

fn record_block(log_file: &Path, event: &LogEvent) -> std::io::Result<()> {
    let logger = Logger::with_file(LogFormat::Compact, log_file)?;
    logger.log(event);
    Ok(())
}

/// Decide a tool call from its hook payload and the serialized guard.
///
/// Fails closed: an unreadable payload or guard blocks file writes.
fn evaluate(payload: &str, guard_json: Option<&str>, fallback_cwd: &Path) -> GuardVerdict {
    let Some(guard_json) = guard_json else {
        return GuardVerdict::Allow;
    };

    let input: HookInput = match serde_json::from_str(payload) {
        Ok(input) => input,
        Err(e) => {
            return GuardVerdict::Block {
                reason: format!(
                    "Could not read the tool call ({}). Writes are restricted while /critique is active.",
                    e
                ),
            };
        }
    };

    let path = input.tool_input.target_path();
    let cwd = input.cwd.unwrap_or_else(|| fallback_cwd.to_path_buf());
    let call = ToolCall::new(input.tool_name, path, cwd);

    match serde_json::from_str::<WriteGuard>(guard_json) {
        Ok(guard) => guard.check(&call),
        Err(_) if matches!(call.operation, ToolOperation::Write | ToolOperation::Edit) => {
            GuardVerdict::Block {
                reason: format!(
                    "Blocked {}: the /critique write guard could not be read.",
                    call.tool_name
                ),
            }
        }
        Err(_) => GuardVerdict::Allow,
    }
}
