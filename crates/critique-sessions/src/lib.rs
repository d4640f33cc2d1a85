pub mod parser;
pub mod scanner;
pub mod store;
pub mod types;

pub use parser::{parse_transcript, parse_transcript_str};
pub use scanner::last_assistant_text;
pub use store::TranscriptStore;
pub use types::{
    ContentBlock, EntryKind, MessageContent, Role, StopReason, Transcript, TranscriptEntry,
    TranscriptMessage,
};
