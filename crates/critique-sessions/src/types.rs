use serde::{Deserialize, Serialize};

/// Kind of a transcript line. Hosts write other bookkeeping lines too
/// (model changes, summaries, compactions); those all map to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Message,
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    #[serde(other)]
    Other,
}

/// Why the model stopped producing a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Normal completion
    #[serde(rename = "stop", alias = "end_turn", alias = "stop_sequence")]
    Stop,
    /// Interrupted to run a tool call
    #[serde(rename = "tool_use", alias = "toolUse")]
    ToolUse,
    /// Hit the output token limit
    #[serde(rename = "length", alias = "max_tokens")]
    Length,
    #[serde(rename = "aborted")]
    Aborted,
    #[serde(rename = "error")]
    Error,
    #[serde(other)]
    Other,
}

/// One segment of structured message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// Thinking, tool calls, images and anything else that is not plain text
    #[serde(other)]
    Other,
}

/// Message content is either a bare string or a list of typed segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Blocks(Vec::new())
    }
}

impl MessageContent {
    /// Text segments in order. A bare string counts as a single segment.
    pub fn text_segments(&self) -> Vec<&str> {
        match self {
            MessageContent::Text(text) => vec![text.as_str()],
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::Other => None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default, alias = "stopReason")]
    pub stop_reason: Option<StopReason>,
}

/// A single line of a host transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub message: Option<TranscriptMessage>,
}

impl TranscriptEntry {
    /// The conversation message carried by this entry, if it is one.
    pub fn as_message(&self) -> Option<&TranscriptMessage> {
        match self.kind {
            EntryKind::Message | EntryKind::User | EntryKind::Assistant => self.message.as_ref(),
            EntryKind::Other => None,
        }
    }
}

/// A fully parsed transcript file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub id: String,
    pub entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
