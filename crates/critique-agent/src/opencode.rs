use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::{
    Agent, AgentConfig, AgentError, AgentOutput, AgentType, OutputCallback, ProcessSpawner,
};

/// OpenCode agent.
///
/// OpenCode has no pre-tool hook, so it can only take turns that need no
/// write guard, such as critiques of the last response. A config carrying a
/// write hook is refused rather than run unprotected.
pub struct OpenCodeAgent {
    binary_path: PathBuf,
}

impl OpenCodeAgent {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("opencode"),
        }
    }

    pub fn with_binary_path(path: PathBuf) -> Self {
        Self { binary_path: path }
    }

    fn build_args(prompt: &str, config: &AgentConfig) -> Result<Vec<String>, AgentError> {
        if config.write_hook.is_some() {
            return Err(AgentError::ConfigError(
                "OpenCode cannot run a write hook".to_string(),
            ));
        }

        // `run` is the non-interactive mode; the message is positional
        let mut args = vec!["run".to_string()];
        if let Some(ref model) = config.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args.push("--".to_string());
        args.push(prompt.to_string());
        Ok(args)
    }
}

impl Default for OpenCodeAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for OpenCodeAgent {
    fn name(&self) -> &str {
        "OpenCode"
    }

    fn agent_type(&self) -> AgentType {
        AgentType::OpenCode
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
        let args = Self::build_args(prompt, config)?;
        debug!(agent = self.name(), prompt_len = prompt.len(), "Executing agent");

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        ProcessSpawner::spawn_with_callback(&self.binary_path, &arg_refs, config, on_output).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let config = AgentConfig::new(PathBuf::from("/work"));
        assert_eq!(
            OpenCodeAgent::build_args("--help me", &config).unwrap(),
            vec!["run", "--", "--help me"]
        );

        let config = config.with_model("anthropic/claude-sonnet".to_string());
        assert_eq!(
            OpenCodeAgent::build_args("p", &config).unwrap(),
            vec!["run", "--model", "anthropic/claude-sonnet", "--", "p"]
        );
    }

    #[test]
    fn test_write_hook_is_refused() {
        let agent = OpenCodeAgent::new();
        assert!(!agent.supports_write_hook());

        let config = AgentConfig::new(PathBuf::from("/work"))
            .with_write_hook("critique hook".to_string());
        assert!(matches!(
            OpenCodeAgent::build_args("p", &config),
            Err(AgentError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_guarded_turn_never_spawns() {
        // A binary that does not exist would fail with SpawnFailed if reached
        let agent = OpenCodeAgent::with_binary_path(PathBuf::from("/nonexistent/opencode"));
        let config = AgentConfig::new(PathBuf::from("/work"))
            .with_write_hook("critique hook".to_string());
        let err = agent.execute("p", &config).await.unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
    }
}
