use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::{AgentConfig, AgentError, AgentOutput, OutputCallback, OutputType};

/// Utility for spawning agent processes
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Spawn a process and capture its output
    pub async fn spawn(
        binary: &Path,
        args: &[&str],
        config: &AgentConfig,
    ) -> Result<AgentOutput, AgentError> {
        Self::spawn_with_callback(binary, args, config, None).await
    }

    /// Spawn a process, capturing its output and passing each line to
    /// `on_output` as it arrives. The child is killed if `config.timeout`
    /// elapses first.
    pub async fn spawn_with_callback(
        binary: &Path,
        args: &[&str],
        config: &AgentConfig,
        on_output: Option<OutputCallback>,
    ) -> Result<AgentOutput, AgentError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            arg_count = args.len(),
            working_dir = %config.working_dir.display(),
            "Spawning agent process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .current_dir(&config.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        for (key, value) in &config.env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn()?;

        let stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::ExecutionFailed("stdout not captured".to_string()))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| AgentError::ExecutionFailed("stderr not captured".to_string()))?;

        let collect = async {
            let mut stdout_reader = BufReader::new(stdout_handle).lines();
            let mut stderr_reader = BufReader::new(stderr_handle).lines();
            let mut stdout = String::new();
            let mut stderr = String::new();
            let mut stdout_open = true;
            let mut stderr_open = true;

            while stdout_open || stderr_open {
                tokio::select! {
                    result = stdout_reader.next_line(), if stdout_open => {
                        match result {
                            Ok(Some(line)) => {
                                trace!(line = %line, "stdout");
                                emit(&on_output, &line, OutputType::Stdout);
                                push_line(&mut stdout, &line);
                            }
                            Ok(None) => stdout_open = false,
                            Err(e) => {
                                return Err(AgentError::ExecutionFailed(format!(
                                    "Failed to read stdout: {}",
                                    e
                                )));
                            }
                        }
                    }
                    result = stderr_reader.next_line(), if stderr_open => {
                        match result {
                            Ok(Some(line)) => {
                                trace!(line = %line, "stderr");
                                emit(&on_output, &line, OutputType::Stderr);
                                push_line(&mut stderr, &line);
                            }
                            Ok(None) => stderr_open = false,
                            Err(e) => {
                                return Err(AgentError::ExecutionFailed(format!(
                                    "Failed to read stderr: {}",
                                    e
                                )));
                            }
                        }
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<_, AgentError>((stdout, stderr, status))
        };

        let (stdout, stderr, status) = match config.timeout {
            Some(limit) => match tokio::time::timeout(limit, collect).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(timeout = ?limit, "Agent process timed out");
                    return Err(AgentError::Timeout(limit));
                }
            },
            None => collect.await?,
        };

        let duration = start.elapsed();
        let exit_code = status.code().unwrap_or(-1);

        debug!(
            exit_code,
            duration_ms = duration.as_millis(),
            "Agent process completed"
        );

        Ok(AgentOutput::new(stdout, stderr, exit_code, duration))
    }
}

fn emit(on_output: &Option<OutputCallback>, line: &str, stream: OutputType) {
    if let Some(ref callback) = on_output {
        callback(line, stream);
    }
}

fn push_line(buffer: &mut String, line: &str) {
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(line);
}
