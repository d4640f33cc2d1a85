use std::path::{Path, PathBuf};

use colored::Colorize;

use critique_core::{Host, NotifyLevel};
use critique_sessions::TranscriptEntry;

/// Terminal host for `critique run`.
///
/// Notifications go to stderr. The prompt is held until the caller hands it
/// to an agent (submitted) or prints it (staged).
pub struct CliHost {
    interactive: bool,
    cwd: PathBuf,
    entries: Vec<TranscriptEntry>,
    submitted: Option<String>,
    staged: Option<String>,
}

impl CliHost {
    pub fn new(interactive: bool, cwd: PathBuf, entries: Vec<TranscriptEntry>) -> Self {
        Self {
            interactive,
            cwd,
            entries,
            submitted: None,
            staged: None,
        }
    }

    pub fn take_submitted(&mut self) -> Option<String> {
        self.submitted.take()
    }

    pub fn take_staged(&mut self) -> Option<String> {
        self.staged.take()
    }
}

impl Host for CliHost {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn transcript(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    fn notify(&mut self, message: &str, level: NotifyLevel) {
        match level {
            NotifyLevel::Info => eprintln!("{}", message),
            NotifyLevel::Warning => eprintln!("{} {}", "warning:".bright_yellow().bold(), message),
            NotifyLevel::Error => eprintln!("{} {}", "error:".bright_red().bold(), message),
        }
    }

    fn send_user_message(&mut self, prompt: &str) {
        self.submitted = Some(prompt.to_string());
    }

    fn set_editor_text(&mut self, text: &str) {
        self.staged = Some(text.to_string());
    }
}
