use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::{
    Agent, AgentConfig, AgentError, AgentOutput, AgentType, OutputCallback, ProcessSpawner,
};

/// Tools whose calls are routed through the write hook
const WRITE_TOOL_MATCHER: &str = "Write|Edit|MultiEdit|NotebookEdit";

/// Claude Code settings that register `command` as a PreToolUse hook for
/// file writes and edits.
pub fn hook_settings(command: &str) -> String {
    json!({
        "hooks": {
            "PreToolUse": [{
                "matcher": WRITE_TOOL_MATCHER,
                "hooks": [{ "type": "command", "command": command }]
            }]
        }
    })
    .to_string()
}

/// Claude Code agent implementation
pub struct ClaudeCodeAgent {
    binary_path: PathBuf,
}

impl ClaudeCodeAgent {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("claude"),
        }
    }

    pub fn with_binary_path(path: PathBuf) -> Self {
        Self { binary_path: path }
    }

    fn build_args(prompt: &str, config: &AgentConfig) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--dangerously-skip-permissions".to_string(),
        ];

        if let Some(ref model) = config.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        // Hooks still run with permissions skipped
        if let Some(ref hook) = config.write_hook {
            args.push("--settings".to_string());
            args.push(hook_settings(hook));
        }

        // `--` keeps a prompt starting with '-' from being read as an option
        args.push("--".to_string());
        args.push(prompt.to_string());
        args
    }
}

impl Default for ClaudeCodeAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for ClaudeCodeAgent {
    fn name(&self) -> &str {
        "Claude Code"
    }

    fn agent_type(&self) -> AgentType {
        AgentType::ClaudeCode
    }

    fn supports_write_hook(&self) -> bool {
        true
    }

    fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn execute_with_callback(
        &self,
        prompt: &str,
        config: &AgentConfig,
        on_output: Option<OutputCallback>,
    ) -> Result<AgentOutput, AgentError> {
        debug!(
            agent = self.name(),
            prompt_len = prompt.len(),
            hooked = config.write_hook.is_some(),
            "Executing agent"
        );

        let args = Self::build_args(prompt, config);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        ProcessSpawner::spawn_with_callback(&self.binary_path, &arg_refs, config, on_output).await
    }
}
