use std::fs;
use std::path::{Path, PathBuf};

use critique_core::{
    CommandOutcome, CritiqueCommand, CritiqueConfig, CritiqueError, CritiqueSource, Host, Lens,
    NotifyLevel, ToolCall, WriteGuard,
};
use critique_sessions::parse_transcript_str;
use critique_sessions::TranscriptEntry;
use tempfile::TempDir;

/// In-memory host that records everything the command does.
struct MockHost {
    interactive: bool,
    cwd: PathBuf,
    entries: Vec<TranscriptEntry>,
    notifications: Vec<(String, NotifyLevel)>,
    sent: Vec<String>,
    editor: Option<String>,
}

impl MockHost {
    fn new(cwd: &Path) -> Self {
        Self {
            interactive: true,
            cwd: cwd.to_path_buf(),
            entries: Vec::new(),
            notifications: Vec::new(),
            sent: Vec::new(),
            editor: None,
        }
    }

    fn with_transcript(mut self, jsonl: &str) -> Self {
        let (entries, skipped) = parse_transcript_str(jsonl);
        assert_eq!(skipped, 0);
        self.entries = entries;
        self
    }

    fn last_notification(&self) -> &(String, NotifyLevel) {
        self.notifications.last().unwrap()
    }
}

impl Host for MockHost {
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
        self.notifications.push((message.to_string(), level));
    }

    fn send_user_message(&mut self, prompt: &str) {
        self.sent.push(prompt.to_string());
    }

    fn set_editor_text(&mut self, text: &str) {
        self.editor = Some(text.to_string());
    }
}

const HELLO_TRANSCRIPT: &str = r#"{"type":"message","message":{"role":"user","content":"Say hello"}}
{"type":"message","message":{"role":"assistant","content":[{"type":"text","text":"Hello world"}],"stop_reason":"stop"}}"#;

fn numbered_lines(count: usize) -> String {
    (1..=count)
        .map(|i| format!("line {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn command() -> CritiqueCommand {
    CritiqueCommand::new(CritiqueConfig::default())
}

fn submitted(outcome: CommandOutcome) -> critique_core::SubmittedCritique {
    match outcome {
        CommandOutcome::Submitted(critique) => critique,
        other => panic!("expected a submitted critique, got {:?}", other),
    }
}

#[test]
fn test_last_response_critique() {
    let dir = TempDir::new().unwrap();
    let mut host = MockHost::new(dir.path()).with_transcript(HELLO_TRANSCRIPT);
    let mut cmd = command();

    let critique = submitted(cmd.handle("", &mut host));

    assert_eq!(critique.lens, Lens::Writing);
    assert_eq!(critique.source, CritiqueSource::LastResponse);
    assert!(!critique.large_file);
    assert_eq!(host.sent.len(), 1);
    assert!(host.sent[0].ends_with("Source: last model response\n\nHello world\n</content>"));
    assert!(host.sent[0].contains("### 3. Annotated document"));
    assert_eq!(cmd.guard(), &WriteGuard::Absent);
}

#[test]
fn test_small_code_file_is_inlined_and_guarded() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.py"), numbered_lines(300)).unwrap();
    let mut host = MockHost::new(dir.path());
    let mut cmd = command();

    let critique = submitted(cmd.handle("notes.py", &mut host));

    assert_eq!(critique.lens, Lens::Code);
    assert!(!critique.large_file);
    let prompt = &host.sent[0];
    assert!(prompt.contains("<content>\nSource: notes.py\n\nline 1\n"));
    assert!(prompt.ends_with("line 300\n</content>"));

    let source = dir.path().join("notes.py");
    assert_eq!(cmd.guard(), &WriteGuard::deny_all(source.clone()));

    let call = ToolCall::new("edit", Some("notes.py".to_string()), dir.path().to_path_buf());
    assert!(cmd.on_tool_call(&call).is_blocked());
    let call = ToolCall::new("read", Some("notes.py".to_string()), dir.path().to_path_buf());
    assert!(!cmd.on_tool_call(&call).is_blocked());
}

#[test]
fn test_large_file_goes_by_reference() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("big.md"), numbered_lines(800)).unwrap();
    let mut host = MockHost::new(dir.path());
    let mut cmd = command();

    let critique = submitted(cmd.handle("@big.md", &mut host));

    let source = dir.path().join("big.md");
    let annotated = dir.path().join("big.critique.md");
    assert!(critique.large_file);
    assert_eq!(critique.lens, Lens::Writing);

    let prompt = &host.sent[0];
    assert!(prompt.contains(&source.display().to_string()));
    assert!(prompt.contains(&annotated.display().to_string()));
    assert!(!prompt.contains("line 400"));
    assert!(!prompt.contains("<content>"));

    let (message, level) = host.last_notification();
    assert_eq!(*level, NotifyLevel::Info);
    assert!(message.contains("800 lines"));

    assert_eq!(
        cmd.guard(),
        &WriteGuard::allow_annotated_only(source.clone(), annotated.clone())
    );
    let write_copy = ToolCall::new(
        "write",
        Some("big.critique.md".to_string()),
        dir.path().to_path_buf(),
    );
    assert!(!cmd.on_tool_call(&write_copy).is_blocked());
    let write_source = ToolCall::new(
        "write",
        Some(source.display().to_string()),
        dir.path().to_path_buf(),
    );
    assert!(cmd.on_tool_call(&write_source).is_blocked());
}

#[test]
fn test_threshold_is_exclusive() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("edge.md"), numbered_lines(500)).unwrap();
    let mut host = MockHost::new(dir.path());
    let mut cmd = command();

    let critique = submitted(cmd.handle("edge.md", &mut host));
    assert!(!critique.large_file);

    let mut cmd = CritiqueCommand::new(CritiqueConfig::default().with_large_file_lines(499));
    let critique = submitted(cmd.handle("edge.md", &mut host));
    assert!(critique.large_file);
}

#[test]
fn test_large_file_ignores_no_inline() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("big.md"), numbered_lines(800)).unwrap();
    let source = dir.path().join("big.md");
    let annotated = dir.path().join("big.critique.md");

    let mut host = MockHost::new(dir.path());
    let mut cmd = command();
    let plain = submitted(cmd.handle("big.md", &mut host));
    cmd.on_turn_end();

    let no_inline = submitted(cmd.handle("big.md --no-inline", &mut host));

    assert!(no_inline.large_file);
    assert_eq!(host.sent.len(), 2);
    assert_eq!(host.sent[0], host.sent[1]);
    assert_eq!(plain.prompt, no_inline.prompt);
    assert_eq!(
        cmd.guard(),
        &WriteGuard::allow_annotated_only(source, annotated)
    );
}

#[test]
fn test_large_file_edit_mode_stages_without_guard() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("big.md"), numbered_lines(800)).unwrap();
    let mut host = MockHost::new(dir.path());
    let mut cmd = command();

    let critique = match cmd.handle("big.md --edit", &mut host) {
        CommandOutcome::Staged(critique) => critique,
        other => panic!("expected staged, got {:?}", other),
    };

    assert!(critique.large_file);
    assert!(host.sent.is_empty());
    let editor = host.editor.as_deref().unwrap();
    assert!(editor.contains(&dir.path().join("big.critique.md").display().to_string()));
    assert!(!editor.contains("<content>"));
    assert_eq!(cmd.guard(), &WriteGuard::Absent);
}

#[test]
fn test_missing_file_aborts() {
    let dir = TempDir::new().unwrap();
    let mut host = MockHost::new(dir.path()).with_transcript(HELLO_TRANSCRIPT);
    let mut cmd = command();

    let outcome = cmd.handle("missing.txt", &mut host);

    assert!(matches!(
        outcome,
        CommandOutcome::Aborted(CritiqueError::Access { .. })
    ));
    let (message, level) = host.last_notification();
    assert_eq!(*level, NotifyLevel::Error);
    assert!(message.contains("missing.txt"));
    assert!(host.sent.is_empty());
    assert_eq!(cmd.guard(), &WriteGuard::Absent);
}

#[test]
fn test_non_interactive_aborts_before_parsing() {
    let dir = TempDir::new().unwrap();
    let mut host = MockHost::new(dir.path());
    host.interactive = false;
    let mut cmd = command();

    let outcome = cmd.handle("--bogus", &mut host);

    assert!(matches!(
        outcome,
        CommandOutcome::Aborted(CritiqueError::NotInteractive)
    ));
    assert_eq!(host.last_notification().1, NotifyLevel::Warning);
}

#[test]
fn test_usage_error_shows_usage() {
    let dir = TempDir::new().unwrap();
    let mut host = MockHost::new(dir.path());
    let mut cmd = command();

    let outcome = cmd.handle("--code --writing", &mut host);

    assert!(matches!(outcome, CommandOutcome::Aborted(CritiqueError::Usage(_))));
    let (message, level) = host.last_notification();
    assert_eq!(*level, NotifyLevel::Error);
    assert!(message.starts_with("--code and --writing cannot be used together"));
    assert!(message.contains("Usage: /critique"));
}

#[test]
fn test_help_does_nothing_else() {
    let dir = TempDir::new().unwrap();
    let mut host = MockHost::new(dir.path());
    let mut cmd = command();

    let outcome = cmd.handle("--help", &mut host);

    assert!(matches!(outcome, CommandOutcome::Help));
    let (message, level) = host.last_notification();
    assert_eq!(*level, NotifyLevel::Info);
    assert!(message.starts_with("Usage: /critique"));
    assert!(host.sent.is_empty());
    assert!(host.editor.is_none());
}

#[test]
fn test_no_response_to_critique() {
    let dir = TempDir::new().unwrap();
    let transcript = r#"{"type":"message","message":{"role":"user","content":"hi"}}
{"type":"message","message":{"role":"assistant","content":[{"type":"text","text":"partial"}],"stop_reason":"tool_use"}}"#;
    let mut host = MockHost::new(dir.path()).with_transcript(transcript);
    let mut cmd = command();

    let outcome = cmd.handle("", &mut host);

    assert!(matches!(
        outcome,
        CommandOutcome::Aborted(CritiqueError::NoAssistantResponse)
    ));
    assert_eq!(host.last_notification().1, NotifyLevel::Warning);
}

#[test]
fn test_edit_mode_stages_without_guard() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();
    let mut host = MockHost::new(dir.path());
    let mut cmd = command();

    let outcome = cmd.handle("main.rs --edit --no-inline", &mut host);

    let critique = match outcome {
        CommandOutcome::Staged(critique) => critique,
        other => panic!("expected staged, got {:?}", other),
    };
    assert_eq!(critique.lens, Lens::Code);
    assert!(host.sent.is_empty());
    let editor = host.editor.as_deref().unwrap();
    assert_eq!(editor, critique.prompt);
    assert!(!editor.contains("### 3. Annotated code"));
    assert_eq!(cmd.guard(), &WriteGuard::Absent);
}

#[test]
fn test_lens_override() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("README.md"), "# Title\n").unwrap();
    let mut host = MockHost::new(dir.path());
    let mut cmd = command();

    let critique = submitted(cmd.handle("--code README.md", &mut host));
    assert_eq!(critique.lens, Lens::Code);
}

#[test]
fn test_quoted_path_with_spaces() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("my notes.txt"), "draft").unwrap();
    let mut host = MockHost::new(dir.path());
    let mut cmd = command();

    let critique = submitted(cmd.handle(r#""my notes.txt""#, &mut host));
    match critique.source {
        CritiqueSource::File { label, lines, .. } => {
            assert_eq!(label, "my notes.txt");
            assert_eq!(lines, 1);
        }
        other => panic!("expected a file source, got {:?}", other),
    }
}

#[test]
fn test_guard_lifecycle() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.md"), "alpha").unwrap();
    let mut host = MockHost::new(dir.path()).with_transcript(HELLO_TRANSCRIPT);
    let mut cmd = command();

    submitted(cmd.handle("a.md", &mut host));
    assert!(cmd.guard().is_armed());

    cmd.on_turn_end();
    assert_eq!(cmd.guard(), &WriteGuard::Absent);
    let call = ToolCall::new("write", Some("a.md".to_string()), dir.path().to_path_buf());
    assert!(!cmd.on_tool_call(&call).is_blocked());

    // A failed invocation still clears a guard left by the previous one
    submitted(cmd.handle("a.md", &mut host));
    assert!(cmd.guard().is_armed());
    let outcome = cmd.handle("missing.md", &mut host);
    assert!(matches!(outcome, CommandOutcome::Aborted(_)));
    assert_eq!(cmd.guard(), &WriteGuard::Absent);

    // A last-response critique does not inherit the file guard
    submitted(cmd.handle("a.md", &mut host));
    submitted(cmd.handle("", &mut host));
    assert_eq!(cmd.guard(), &WriteGuard::Absent);
}
