use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Type of output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    Stdout,
    Stderr,
}

/// Structured log events for a critique turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    CommandReceived {
        raw: String,
        working_dir: PathBuf,
    },
    LensResolved {
        lens: String,
        source: String,
        overridden: bool,
    },
    PromptSubmitted {
        lens: String,
        source: String,
        large_file: bool,
        prompt_chars: usize,
    },
    /// Prompt handed to the editor instead of the model
    PromptStaged {
        lens: String,
        source: String,
        prompt_chars: usize,
    },
    GuardArmed {
        mode: String,
        source_path: PathBuf,
        annotated_path: Option<PathBuf>,
    },
    GuardCleared {
        reason: String,
    },
    ToolCallBlocked {
        tool: String,
        path: Option<String>,
        reason: String,
    },
    CommandAborted {
        error: String,
    },
    AgentStarted {
        agent: String,
        model: Option<String>,
    },
    /// Streaming output line from the agent
    AgentStreamLine {
        stream: StreamType,
        line: String,
    },
    TurnCompleted {
        exit_code: i32,
        duration_secs: f64,
        interrupted: bool,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for critique events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::CommandReceived { .. } => {
                // Nothing to show until the source is known
            }
            LogEvent::LensResolved {
                lens,
                source,
                overridden,
            } => {
                let how = if *overridden { "forced" } else { "detected" };
                let _ = writeln!(
                    stderr,
                    "{} {} {} {}",
                    "▶".bright_cyan(),
                    "CRITIQUE".bright_cyan().bold(),
                    source.bright_white(),
                    format!("({} lens, {})", lens, how).dimmed()
                );
            }
            LogEvent::PromptSubmitted {
                large_file,
                prompt_chars,
                ..
            } => {
                let mode = if *large_file {
                    "by reference"
                } else {
                    "inline"
                };
                let _ = writeln!(
                    stderr,
                    "  {} Prompt sent {}",
                    "→".bright_blue(),
                    format!("({}, {} chars)", mode, prompt_chars).dimmed()
                );
            }
            LogEvent::PromptStaged { prompt_chars, .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} Prompt staged for editing {}",
                    "✎".bright_yellow(),
                    format!("({} chars)", prompt_chars).dimmed()
                );
            }
            LogEvent::GuardArmed {
                source_path,
                annotated_path,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "  {} Protecting {}",
                    "🔒".dimmed(),
                    source_path.display().to_string().bright_white()
                );
                if let Some(annotated) = annotated_path {
                    let _ = writeln!(
                        stderr,
                        "    {} {}",
                        "writable:".dimmed(),
                        annotated.display()
                    );
                }
            }
            LogEvent::GuardCleared { .. } => {
                // Internal bookkeeping, shown only in json/compact
            }
            LogEvent::ToolCallBlocked { tool, path, .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} Blocked {} {}",
                    "✗".bright_red(),
                    tool.bright_red(),
                    path.as_deref().unwrap_or("<no path>").dimmed()
                );
            }
            LogEvent::CommandAborted { .. } => {
                // The host already told the user
            }
            LogEvent::AgentStarted { agent, model } => {
                let model = model
                    .as_deref()
                    .map(|m| format!(" ({})", m))
                    .unwrap_or_default();
                let _ = writeln!(
                    stderr,
                    "  {} {}{}",
                    "▶".bright_magenta(),
                    agent.bright_magenta().bold(),
                    model.dimmed()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::AgentStreamLine { line, stream } => {
                let prefix = "    │".dimmed();
                let styled_line = match stream {
                    StreamType::Stdout => line.normal(),
                    StreamType::Stderr => line.dimmed(),
                };
                let _ = writeln!(stderr, "{} {}", prefix, styled_line);
            }
            LogEvent::TurnCompleted {
                exit_code,
                duration_secs,
                interrupted,
            } => {
                let _ = writeln!(stderr);
                if *interrupted {
                    let _ = writeln!(
                        stderr,
                        "  {} Interrupted ({:.1}s)",
                        "⚠".bright_yellow(),
                        duration_secs
                    );
                } else if *exit_code == 0 {
                    let _ = writeln!(
                        stderr,
                        "  {} Done ({:.1}s)",
                        "✓".bright_green(),
                        duration_secs
                    );
                } else {
                    let _ = writeln!(
                        stderr,
                        "  {} Exit {} ({:.1}s)",
                        "✗".bright_red(),
                        exit_code,
                        duration_secs
                    );
                }
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::CommandReceived { raw, .. } => {
                format!("[{}] command:{}", timestamp, raw)
            }
            LogEvent::LensResolved { lens, source, .. } => {
                format!("[{}] lens:{} {}", timestamp, lens, source)
            }
            LogEvent::PromptSubmitted {
                large_file,
                prompt_chars,
                ..
            } => format!(
                "[{}] prompt:sent large={} chars={}",
                timestamp, large_file, prompt_chars
            ),
            LogEvent::PromptStaged { prompt_chars, .. } => {
                format!("[{}] prompt:staged chars={}", timestamp, prompt_chars)
            }
            LogEvent::GuardArmed {
                mode, source_path, ..
            } => format!(
                "[{}] guard:{} {}",
                timestamp,
                mode,
                source_path.display()
            ),
            LogEvent::GuardCleared { reason } => {
                format!("[{}] guard:cleared {}", timestamp, reason)
            }
            LogEvent::ToolCallBlocked { tool, path, .. } => format!(
                "[{}] guard:blocked {} {}",
                timestamp,
                tool,
                path.as_deref().unwrap_or("-")
            ),
            LogEvent::CommandAborted { error } => format!("[{}] error:{}", timestamp, error),
            LogEvent::AgentStarted { agent, .. } => {
                format!("[{}] agent:start {}", timestamp, agent)
            }
            LogEvent::AgentStreamLine { line, .. } => format!("[{}] A:{}", timestamp, line),
            LogEvent::TurnCompleted {
                exit_code,
                duration_secs,
                ..
            } => format!(
                "[{}] turn:done exit={} {:.1}s",
                timestamp, exit_code, duration_secs
            ),
        };
        let _ = writeln!(stderr, "{}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("fancy".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = LogEvent::GuardCleared {
            reason: "turn_end".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "guard_cleared");
        assert_eq!(json["reason"], "turn_end");
    }

    #[test]
    fn test_file_logging_appends_json_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("critique.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();

        logger.log(&LogEvent::CommandAborted {
            error: "no file".into(),
        });
        logger.log(&LogEvent::GuardCleared {
            reason: "turn_end".into(),
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "command_aborted");
        assert!(lines[1]["timestamp"].is_string());
    }
}
