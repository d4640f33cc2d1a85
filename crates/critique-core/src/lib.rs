mod args;
mod command;
mod error;
mod guard;
mod host;
mod loader;
pub mod paths;

pub use args::{parse_args, tokenize, usage, ParsedArgs};
pub use command::{
    CommandOutcome, CritiqueCommand, CritiqueConfig, CritiqueSource, SubmittedCritique,
};
pub use error::{CritiqueError, ErrorCategory};
pub use guard::{GuardVerdict, ToolCall, ToolOperation, WriteGuard};
pub use host::{Host, NotifyLevel};
pub use loader::{load_file, LoadedFile};

pub use critique_prompts::Lens;
