use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, warn};

use critique_agent::{
    create_agent, Agent, AgentConfig, AgentType, OutputCallback, OutputType,
};
use critique_core::{
    CommandOutcome, CritiqueCommand, CritiqueConfig, SubmittedCritique, WriteGuard,
};
use critique_logging::{LogEvent, Logger, StreamType};
use critique_sessions::{Transcript, TranscriptStore};

use crate::config::ProjectConfig;
use crate::hook::{GUARD_ENV, LOG_FILE_ENV};
use crate::host::CliHost;

/// Resolved settings for one `critique run`
pub struct RunOptions {
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub transcript: Option<PathBuf>,
    pub agent: Option<AgentType>,
    pub model: Option<String>,
    pub force_interactive: bool,
    pub json_output: bool,
    /// Absolute path of the JSON log file, shared with the write hook
    pub log_file: Option<PathBuf>,
}

/// Run one critique invocation and, when it is submitted, one agent turn.
/// Returns the process exit code.
pub async fn handle_run_command(options: RunOptions, logger: Arc<Logger>) -> Result<i32> {
    let project = ProjectConfig::load(&options.working_dir)?.unwrap_or_default();

    let agent_type = match (options.agent, project.agent.as_deref()) {
        (Some(agent), _) => agent,
        (None, Some(name)) => name
            .parse::<AgentType>()
            .map_err(|e| anyhow::anyhow!("critique.toml: {}", e))?,
        (None, None) => AgentType::ClaudeCode,
    };
    let model = options.model.clone().or(project.model.clone());

    let mut config = CritiqueConfig::default();
    if let Some(lines) = project.large_file_lines {
        config = config.with_large_file_lines(lines);
    }

    let transcript = match options.transcript {
        Some(ref path) => TranscriptStore::load(path)
            .with_context(|| format!("Failed to load transcript {}", path.display()))?,
        None => Transcript::empty(),
    };
    debug!(
        transcript = %transcript.id,
        entries = transcript.entries.len(),
        "Loaded conversation"
    );

    let interactive = options.force_interactive || std::io::stdin().is_terminal();
    let mut host = CliHost::new(interactive, options.working_dir.clone(), transcript.entries);
    let mut command = CritiqueCommand::new(config).with_logger(Arc::clone(&logger));

    let raw = join_args(&options.args)?;
    match command.handle(&raw, &mut host) {
        CommandOutcome::Help => Ok(0),
        CommandOutcome::Aborted(err) => {
            if options.json_output {
                print_json(&json!({ "status": "aborted", "error": err.to_string() }))?;
            }
            Ok(1)
        }
        CommandOutcome::Staged(critique) => {
            let prompt = host.take_staged().unwrap_or_default();
            if options.json_output {
                print_json(&json!({ "status": "staged", "critique": critique, "prompt": prompt }))?;
            } else {
                println!("{}", prompt);
            }
            Ok(0)
        }
        CommandOutcome::Submitted(critique) => {
            let prompt = host.take_submitted().unwrap_or_default();
            let turn = AgentTurn {
                agent: create_agent(agent_type),
                model,
                working_dir: &options.working_dir,
                log_file: options.log_file.as_deref(),
                logger: &logger,
            };
            let result = turn.run(&prompt, command.guard()).await;
            command.on_turn_end();
            let (exit_code, stdout) = result?;

            if options.json_output {
                print_json(&json!({
                    "status": "submitted",
                    "critique": critique,
                    "exit_code": exit_code,
                    "output": stdout,
                }))?;
            }
            Ok(report_exit(exit_code, &critique))
        }
    }
}

struct AgentTurn<'a> {
    agent: Box<dyn Agent>,
    model: Option<String>,
    working_dir: &'a Path,
    log_file: Option<&'a Path>,
    logger: &'a Arc<Logger>,
}

impl AgentTurn<'_> {
    async fn run(&self, prompt: &str, guard: &WriteGuard) -> Result<(i32, String)> {
        let agent = self.agent.as_ref();
        ensure_guard_enforceable(agent, guard)?;
        if !agent.is_available().await {
            anyhow::bail!(
                "Agent '{}' is not available. Make sure it's installed and in PATH.",
                agent.name()
            );
        }

        let mut agent_config = AgentConfig::new(self.working_dir.to_path_buf());
        if let Some(ref model) = self.model {
            agent_config = agent_config.with_model(model.clone());
        }

        if guard.is_armed() {
            let guard_json =
                serde_json::to_string(guard).context("Failed to serialize write guard")?;
            agent_config = agent_config
                .with_env(GUARD_ENV.to_string(), guard_json)
                .with_write_hook(hook_command()?);
            if let Some(log_file) = self.log_file {
                agent_config = agent_config
                    .with_env(LOG_FILE_ENV.to_string(), log_file.display().to_string());
            }
        }

        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            eprintln!("\nInterrupted. Waiting for the agent to exit...");
            flag.store(true, Ordering::SeqCst);
        })
        .context("Failed to set Ctrl+C handler")?;

        self.logger.log(&LogEvent::AgentStarted {
            agent: agent.name().to_string(),
            model: self.model.clone(),
        });

        let stream_logger = Arc::clone(self.logger);
        let on_output: OutputCallback = Arc::new(move |line: &str, stream: OutputType| {
            let stream = match stream {
                OutputType::Stdout => StreamType::Stdout,
                OutputType::Stderr => StreamType::Stderr,
            };
            stream_logger.log(&LogEvent::AgentStreamLine {
                stream,
                line: line.to_string(),
            });
        });

        let output = agent
            .execute_with_callback(prompt, &agent_config, Some(on_output))
            .await
            .with_context(|| format!("{} failed", agent.name()))?;

        self.logger.log(&LogEvent::TurnCompleted {
            exit_code: output.exit_code,
            duration_secs: output.duration.as_secs_f64(),
            interrupted: interrupted.load(Ordering::SeqCst),
        });

        Ok((output.exit_code, output.stdout))
    }
}

/// Refuse an armed guard on an agent that cannot run the write hook.
/// The turn would otherwise run with the source file unprotected.
fn ensure_guard_enforceable(agent: &dyn Agent, guard: &WriteGuard) -> Result<()> {
    if !guard.is_armed() || agent.supports_write_hook() {
        return Ok(());
    }
    let source = guard
        .source_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    anyhow::bail!(
        "{} cannot run the write hook, so {} would not be protected. Use --agent claude for file critiques.",
        agent.name(),
        source
    )
}

/// Command line the agent runs as its write hook: this executable's `hook`
/// subcommand.
fn hook_command() -> Result<String> {
    let exe = std::env::current_exe().context("Failed to locate the critique executable")?;
    let exe = exe.display().to_string();
    if exe.chars().any(|c| c.is_whitespace() || c == '"') {
        Ok(format!("'{}' hook", exe))
    } else {
        Ok(format!("{} hook", exe))
    }
}

/// Join CLI arguments back into the raw `/critique` argument string,
/// quoting tokens the tokenizer would otherwise split or unwrap.
///
/// The tokenizer has no escapes, so an argument that needs quoting and
/// contains both quote characters cannot be represented.
pub fn join_args(args: &[String]) -> Result<String> {
    let mut joined = Vec::with_capacity(args.len());
    for arg in args {
        let needs_quotes = arg.is_empty()
            || arg.chars().any(char::is_whitespace)
            || arg.starts_with('"')
            || arg.starts_with('\'');
        let token = if !needs_quotes {
            arg.clone()
        } else if !arg.contains('"') {
            format!("\"{}\"", arg)
        } else if !arg.contains('\'') {
            format!("'{}'", arg)
        } else {
            anyhow::bail!(
                "Argument {:?} needs quoting but contains both ' and \", so it cannot be passed to /critique",
                arg
            );
        };
        joined.push(token);
    }
    Ok(joined.join(" "))
}

fn report_exit(exit_code: i32, critique: &SubmittedCritique) -> i32 {
    if exit_code != 0 {
        warn!(exit_code, source = critique.source.label(), "Agent exited with an error");
    }
    exit_code
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use critique_agent::{AgentError, AgentOutput};
    use critique_core::tokenize;
    use critique_logging::LogFormat;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Agent that records whether it was asked to execute
    struct FakeAgent {
        hooks: bool,
        executed: Arc<AtomicBool>,
    }

    impl FakeAgent {
        fn new(hooks: bool) -> Self {
            Self {
                hooks,
                executed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl Agent for FakeAgent {
        fn name(&self) -> &str {
            "Fake"
        }

        fn agent_type(&self) -> AgentType {
            AgentType::OpenCode
        }

        fn supports_write_hook(&self) -> bool {
            self.hooks
        }

        fn binary_path(&self) -> &Path {
            Path::new("fake")
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn execute_with_callback(
            &self,
            _prompt: &str,
            _config: &AgentConfig,
            _on_output: Option<OutputCallback>,
        ) -> Result<AgentOutput, AgentError> {
            self.executed.store(true, Ordering::SeqCst);
            Err(AgentError::ExecutionFailed("fake agent".to_string()))
        }
    }

    #[test]
    fn test_join_plain_args() {
        assert_eq!(
            join_args(&args(&["notes.md", "--code"])).unwrap(),
            "notes.md --code"
        );
        assert_eq!(join_args(&[]).unwrap(), "");
    }

    #[test]
    fn test_join_survives_tokenize() {
        let cases = [
            args(&["my file.md", "--no-inline"]),
            args(&["say \"hi\" there.txt"]),
            args(&["it's draft.md"]),
            args(&["'quoted.md"]),
            args(&["", "--edit"]),
        ];
        for case in cases {
            assert_eq!(tokenize(&join_args(&case).unwrap()), case);
        }
    }

    #[test]
    fn test_join_rejects_both_quote_characters() {
        let err = join_args(&args(&["it's \"draft\" v2.md", "--code"])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(r#""it's \"draft\" v2.md""#), "{}", message);
        assert!(message.contains("both"), "{}", message);

        // Without whitespace or a leading quote no quoting is needed
        assert_eq!(
            join_args(&args(&["it's\"draft\".md"])).unwrap(),
            "it's\"draft\".md"
        );
    }

    #[test]
    fn test_guard_needs_hook_support() {
        let guard = WriteGuard::deny_all(PathBuf::from("/work/a.md"));

        let err = ensure_guard_enforceable(&FakeAgent::new(false), &guard).unwrap_err();
        assert!(err.to_string().contains("/work/a.md"));
        assert!(ensure_guard_enforceable(&FakeAgent::new(true), &guard).is_ok());
        assert!(ensure_guard_enforceable(&FakeAgent::new(false), &WriteGuard::Absent).is_ok());
    }

    #[tokio::test]
    async fn test_hookless_agent_never_runs_guarded_turn() {
        let agent = FakeAgent::new(false);
        let executed = Arc::clone(&agent.executed);
        let logger = Arc::new(Logger::new(LogFormat::Compact));
        let working_dir = PathBuf::from("/work");
        let turn = AgentTurn {
            agent: Box::new(agent),
            model: None,
            working_dir: &working_dir,
            log_file: None,
            logger: &logger,
        };

        let guard = WriteGuard::AllowAnnotatedOnly {
            source_path: PathBuf::from("/work/big.md"),
            annotated_path: PathBuf::from("/work/big.critique.md"),
        };
        let err = turn.run("review big.md", &guard).await.unwrap_err();
        assert!(err.to_string().contains("cannot run the write hook"));
        assert!(!executed.load(Ordering::SeqCst));
    }
}
