use std::path::Path;

use critique_sessions::TranscriptEntry;

/// Severity of a user-visible notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
}

/// The interactive agent host that runs the critique command.
///
/// The host owns the conversation; the command only reads the transcript,
/// reports back through notifications, and hands over the finished prompt.
pub trait Host {
    /// Whether a user is present to see notifications and reply
    fn is_interactive(&self) -> bool;

    /// Working directory that relative paths resolve against
    fn cwd(&self) -> &Path;

    /// Conversation so far, oldest entry first
    fn transcript(&self) -> &[TranscriptEntry];

    fn notify(&mut self, message: &str, level: NotifyLevel);

    /// Submit the prompt to the model as the user's next message
    fn send_user_message(&mut self, prompt: &str);

    /// Place the prompt in the input editor for the user to review
    fn set_editor_text(&mut self, text: &str);
}
