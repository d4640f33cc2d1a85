use tracing::debug;

use crate::types::{Role, StopReason, TranscriptEntry};

/// Text of the most recent assistant message that finished normally.
///
/// Walks the transcript newest to oldest. Messages that stopped for a tool
/// call, a length limit or a cancellation are skipped even if they carry
/// text. Text segments are joined with a blank line.
pub fn last_assistant_text(entries: &[TranscriptEntry]) -> Option<String> {
    for (index, entry) in entries.iter().enumerate().rev() {
        let Some(message) = entry.as_message() else {
            continue;
        };
        if message.role != Role::Assistant || message.stop_reason != Some(StopReason::Stop) {
            continue;
        }

        let text = message.content.text_segments().join("\n\n");
        let text = text.trim_end();
        if !text.is_empty() {
            debug!(entry = index, chars = text.len(), "Found last assistant response");
            return Some(text.to_string());
        }
    }

    None
}
