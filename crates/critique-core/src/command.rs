use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use critique_logging::{LogEvent, Logger};
use critique_prompts::{
    classify, inline_prompt, large_file_prompt, render_content_block, Lens,
};
use critique_sessions::last_assistant_text;

use crate::args::{parse_args, usage, ParsedArgs};
use crate::guard::{GuardVerdict, ToolCall, WriteGuard};
use crate::loader::load_file;
use crate::paths::annotated_path;
use crate::{CritiqueError, Host, NotifyLevel};

const LAST_RESPONSE_LABEL: &str = "last model response";

/// Tunables for the critique command
#[derive(Debug, Clone)]
pub struct CritiqueConfig {
    /// Files with more lines than this are critiqued by reference
    pub large_file_lines: usize,
}

impl Default for CritiqueConfig {
    fn default() -> Self {
        Self {
            large_file_lines: 500,
        }
    }
}

impl CritiqueConfig {
    pub fn with_large_file_lines(mut self, lines: usize) -> Self {
        self.large_file_lines = lines;
        self
    }
}

/// Where the critiqued material came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CritiqueSource {
    LastResponse,
    File {
        label: String,
        resolved_path: PathBuf,
        lines: usize,
    },
}

impl CritiqueSource {
    pub fn label(&self) -> &str {
        match self {
            CritiqueSource::LastResponse => LAST_RESPONSE_LABEL,
            CritiqueSource::File { label, .. } => label,
        }
    }
}

/// A rendered critique request
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedCritique {
    pub lens: Lens,
    pub source: CritiqueSource,
    pub large_file: bool,
    #[serde(skip)]
    pub prompt: String,
}

/// Result of one `/critique` invocation
#[derive(Debug)]
pub enum CommandOutcome {
    /// Usage text was shown
    Help,
    /// Prompt sent to the model, guard armed for file sources
    Submitted(SubmittedCritique),
    /// Prompt placed in the editor, guard left absent
    Staged(SubmittedCritique),
    /// Reported to the user, nothing else happened
    Aborted(CritiqueError),
}

/// The `/critique` command and the write guard it owns.
///
/// One instance per session. The host calls [`handle`](Self::handle) for each
/// invocation, [`on_tool_call`](Self::on_tool_call) before every tool
/// execution, and [`on_turn_end`](Self::on_turn_end) when the model finishes.
pub struct CritiqueCommand {
    config: CritiqueConfig,
    guard: WriteGuard,
    logger: Option<Arc<Logger>>,
}

struct Prepared {
    critique: SubmittedCritique,
    guard: WriteGuard,
}

impl CritiqueCommand {
    pub fn new(config: CritiqueConfig) -> Self {
        Self {
            config,
            guard: WriteGuard::Absent,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn guard(&self) -> &WriteGuard {
        &self.guard
    }

    /// Run one invocation with the raw argument string.
    pub fn handle(&mut self, raw: &str, host: &mut dyn Host) -> CommandOutcome {
        self.log(LogEvent::CommandReceived {
            raw: raw.to_string(),
            working_dir: host.cwd().to_path_buf(),
        });
        self.reset_guard("new_invocation");

        match self.run(raw, host) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "Critique aborted");
                let message = match &err {
                    CritiqueError::Usage(_) => format!("{}\n\n{}", err, usage()),
                    _ => err.to_string(),
                };
                host.notify(&message, err.notify_level());
                self.log(LogEvent::CommandAborted {
                    error: err.to_string(),
                });
                CommandOutcome::Aborted(err)
            }
        }
    }

    /// Check a tool call against the current guard.
    pub fn on_tool_call(&self, call: &ToolCall) -> GuardVerdict {
        let verdict = self.guard.check(call);
        if let GuardVerdict::Block { ref reason } = verdict {
            info!(tool = %call.tool_name, path = ?call.path, "Blocked tool call during critique");
            self.log(LogEvent::ToolCallBlocked {
                tool: call.tool_name.clone(),
                path: call.path.clone(),
                reason: reason.clone(),
            });
        }
        verdict
    }

    /// The model finished its turn; lift any restriction.
    pub fn on_turn_end(&mut self) {
        self.reset_guard("turn_end");
    }

    fn run(&mut self, raw: &str, host: &mut dyn Host) -> Result<CommandOutcome, CritiqueError> {
        if !host.is_interactive() {
            return Err(CritiqueError::NotInteractive);
        }

        let args = parse_args(raw);
        if let Some(error) = args.error {
            return Err(CritiqueError::Usage(error));
        }
        if args.help {
            host.notify(usage(), NotifyLevel::Info);
            return Ok(CommandOutcome::Help);
        }

        let prepared = match args.file.as_deref() {
            Some(file) => self.prepare_file(file, &args, host)?,
            None => self.prepare_last_response(&args, host)?,
        };
        let Prepared { critique, guard } = prepared;

        self.log(LogEvent::LensResolved {
            lens: critique.lens.to_string(),
            source: critique.source.label().to_string(),
            overridden: args.lens.is_some(),
        });

        if args.edit {
            host.set_editor_text(&critique.prompt);
            self.log(LogEvent::PromptStaged {
                lens: critique.lens.to_string(),
                source: critique.source.label().to_string(),
                prompt_chars: critique.prompt.len(),
            });
            return Ok(CommandOutcome::Staged(critique));
        }

        self.arm(guard);
        host.send_user_message(&critique.prompt);
        self.log(LogEvent::PromptSubmitted {
            lens: critique.lens.to_string(),
            source: critique.source.label().to_string(),
            large_file: critique.large_file,
            prompt_chars: critique.prompt.len(),
        });

        Ok(CommandOutcome::Submitted(critique))
    }

    fn prepare_file(
        &self,
        file: &str,
        args: &ParsedArgs,
        host: &mut dyn Host,
    ) -> Result<Prepared, CritiqueError> {
        let loaded = load_file(file, host.cwd())?;
        let lens = args.lens.unwrap_or_else(|| classify(Some(loaded.label.as_str())));
        let lines = loaded.line_count();
        let large_file = lines > self.config.large_file_lines;

        debug!(
            path = %loaded.resolved_path.display(),
            lines,
            large_file,
            %lens,
            "Prepared file critique"
        );

        let (prompt, guard) = if large_file {
            let annotated = annotated_path(&loaded.resolved_path);
            host.notify(
                &format!(
                    "{} has {} lines; the model will read it from disk and write annotations to {}",
                    loaded.label,
                    lines,
                    annotated.display()
                ),
                NotifyLevel::Info,
            );
            let prompt = large_file_prompt(
                lens,
                &loaded.resolved_path.display().to_string(),
                &annotated.display().to_string(),
            );
            let guard = WriteGuard::allow_annotated_only(loaded.resolved_path.clone(), annotated);
            (prompt, guard)
        } else {
            let prompt = format!(
                "{}\n\n{}",
                inline_prompt(lens, args.inline),
                render_content_block(&loaded.label, &loaded.content)
            );
            (prompt, WriteGuard::deny_all(loaded.resolved_path.clone()))
        };

        Ok(Prepared {
            critique: SubmittedCritique {
                lens,
                source: CritiqueSource::File {
                    label: loaded.label,
                    resolved_path: loaded.resolved_path,
                    lines,
                },
                large_file,
                prompt,
            },
            guard,
        })
    }

    fn prepare_last_response(
        &self,
        args: &ParsedArgs,
        host: &mut dyn Host,
    ) -> Result<Prepared, CritiqueError> {
        let text =
            last_assistant_text(host.transcript()).ok_or(CritiqueError::NoAssistantResponse)?;
        let lens = args.lens.unwrap_or_else(|| classify(None));

        let prompt = format!(
            "{}\n\n{}",
            inline_prompt(lens, args.inline),
            render_content_block(LAST_RESPONSE_LABEL, &text)
        );

        Ok(Prepared {
            critique: SubmittedCritique {
                lens,
                source: CritiqueSource::LastResponse,
                large_file: false,
                prompt,
            },
            // Nothing on disk to protect
            guard: WriteGuard::Absent,
        })
    }

    fn arm(&mut self, guard: WriteGuard) {
        if let Some(source_path) = guard.source_path() {
            debug!(mode = guard.mode_name(), source = %source_path.display(), "Arming write guard");
            self.log(LogEvent::GuardArmed {
                mode: guard.mode_name().to_string(),
                source_path: source_path.to_path_buf(),
                annotated_path: guard.annotated_path().map(|p| p.to_path_buf()),
            });
        }
        self.guard = guard;
    }

    fn reset_guard(&mut self, reason: &str) {
        let previous = self.guard.clear();
        if previous.is_armed() {
            debug!(mode = previous.mode_name(), reason, "Write guard cleared");
            self.log(LogEvent::GuardCleared {
                reason: reason.to_string(),
            });
        }
    }

    fn log(&self, event: LogEvent) {
        if let Some(ref logger) = self.logger {
            logger.log(&event);
        }
    }
}
