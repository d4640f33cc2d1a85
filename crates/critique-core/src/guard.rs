use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::{normalize_path, paths_equal};

/// Turn-scoped restriction on which files the model may write.
///
/// Armed when a critique is submitted and cleared when the turn ends or the
/// next `/critique` starts. `Absent` never intercepts anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WriteGuard {
    #[default]
    Absent,
    /// No writes at all; the whole document was inlined into the prompt
    DenyAll { source_path: PathBuf },
    /// Only the annotated copy may be written
    AllowAnnotatedOnly {
        source_path: PathBuf,
        annotated_path: PathBuf,
    },
}

/// What a tool call does to the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOperation {
    Write,
    Edit,
    Other,
}

impl ToolOperation {
    pub fn from_tool_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "write" => ToolOperation::Write,
            "edit" | "multiedit" | "notebookedit" => ToolOperation::Edit,
            _ => ToolOperation::Other,
        }
    }

    fn mutates_files(self) -> bool {
        matches!(self, ToolOperation::Write | ToolOperation::Edit)
    }
}

/// A tool call the host is about to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub tool_name: String,
    pub operation: ToolOperation,
    pub path: Option<String>,
    /// Directory the tool resolves relative paths against
    pub cwd: PathBuf,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, path: Option<String>, cwd: PathBuf) -> Self {
        let tool_name = tool_name.into();
        Self {
            operation: ToolOperation::from_tool_name(&tool_name),
            tool_name,
            path,
            cwd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Allow,
    Block { reason: String },
}

impl GuardVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GuardVerdict::Block { .. })
    }
}

impl WriteGuard {
    pub fn deny_all(source_path: PathBuf) -> Self {
        WriteGuard::DenyAll { source_path }
    }

    pub fn allow_annotated_only(source_path: PathBuf, annotated_path: PathBuf) -> Self {
        debug_assert!(source_path.is_absolute() && annotated_path.is_absolute());
        debug_assert_ne!(source_path, annotated_path);
        WriteGuard::AllowAnnotatedOnly {
            source_path,
            annotated_path,
        }
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self, WriteGuard::Absent)
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            WriteGuard::Absent => "absent",
            WriteGuard::DenyAll { .. } => "deny_all",
            WriteGuard::AllowAnnotatedOnly { .. } => "allow_annotated_only",
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        match self {
            WriteGuard::Absent => None,
            WriteGuard::DenyAll { source_path }
            | WriteGuard::AllowAnnotatedOnly { source_path, .. } => Some(source_path),
        }
    }

    pub fn annotated_path(&self) -> Option<&Path> {
        match self {
            WriteGuard::AllowAnnotatedOnly { annotated_path, .. } => Some(annotated_path),
            _ => None,
        }
    }

    /// Reset to `Absent`, returning the previous state
    pub fn clear(&mut self) -> WriteGuard {
        std::mem::take(self)
    }

    /// Decide whether a tool call may run.
    pub fn check(&self, call: &ToolCall) -> GuardVerdict {
        if !self.is_armed() || !call.operation.mutates_files() {
            return GuardVerdict::Allow;
        }

        let Some(target) = call.path.as_deref().filter(|p| !p.trim().is_empty()) else {
            return GuardVerdict::Block {
                reason: format!(
                    "Blocked {}: the target path is missing. Writes are restricted while /critique is active.",
                    call.tool_name
                ),
            };
        };

        match self {
            WriteGuard::Absent => GuardVerdict::Allow,
            WriteGuard::DenyAll { source_path } => GuardVerdict::Block {
                reason: format!(
                    "/critique is a review-only turn: {} is protected and no files may be written or edited. \
                     Put your suggestions in the response; edits happen in a separate follow-up turn.",
                    source_path.display()
                ),
            },
            WriteGuard::AllowAnnotatedOnly {
                source_path,
                annotated_path,
            } => {
                let resolved = normalize_path(target, &call.cwd);
                if paths_equal(&resolved, annotated_path) {
                    GuardVerdict::Allow
                } else {
                    GuardVerdict::Block {
                        reason: format!(
                            "/critique only allows writing the annotated copy at {}. \
                             The source {} is protected during this turn; propose other edits in a separate follow-up turn.",
                            annotated_path.display(),
                            source_path.display()
                        ),
                    }
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn call(tool: &str, path: Option<&str>) -> ToolCall {
        ToolCall::new(tool, path.map(String::from), PathBuf::from("/work"))
    }

    fn reason(verdict: GuardVerdict) -> String {
        match verdict {
            GuardVerdict::Block { reason } => reason,
            GuardVerdict::Allow => panic!("expected a block"),
        }
    }

    #[test]
    fn test_operation_from_tool_name() {
        assert_eq!(ToolOperation::from_tool_name("write"), ToolOperation::Write);
        assert_eq!(ToolOperation::from_tool_name("Edit"), ToolOperation::Edit);
        assert_eq!(ToolOperation::from_tool_name("MultiEdit"), ToolOperation::Edit);
        assert_eq!(ToolOperation::from_tool_name("NotebookEdit"), ToolOperation::Edit);
        assert_eq!(ToolOperation::from_tool_name("bash"), ToolOperation::Other);
    }

    #[test]
    fn test_absent_never_intercepts() {
        let guard = WriteGuard::Absent;
        assert_eq!(guard.check(&call("write", Some("/work/a.md"))), GuardVerdict::Allow);
        assert_eq!(guard.check(&call("edit", None)), GuardVerdict::Allow);
    }

    #[test]
    fn test_non_mutating_tools_pass() {
        let guard = WriteGuard::deny_all(PathBuf::from("/work/a.md"));
        assert_eq!(guard.check(&call("read", Some("/work/a.md"))), GuardVerdict::Allow);
        assert_eq!(guard.check(&call("bash", None)), GuardVerdict::Allow);
    }

    #[test]
    fn test_deny_all_blocks_everything() {
        let guard = WriteGuard::deny_all(PathBuf::from("/work/a.md"));
        for target in ["/work/a.md", "other.txt", "/tmp/x"] {
            let verdict = guard.check(&call("write", Some(target)));
            assert!(reason(verdict).contains("/work/a.md"));
        }
        let verdict = guard.check(&call("edit", Some("a.md")));
        assert!(reason(verdict).contains("follow-up turn"));
    }

    #[test]
    fn test_notebook_edit_is_guarded() {
        let guard = WriteGuard::deny_all(PathBuf::from("/work/analysis.ipynb"));
        let verdict = guard.check(&call("NotebookEdit", Some("/work/analysis.ipynb")));
        assert!(reason(verdict).contains("/work/analysis.ipynb"));

        let guard = WriteGuard::allow_annotated_only(
            PathBuf::from("/work/analysis.ipynb"),
            PathBuf::from("/work/analysis.critique.ipynb"),
        );
        assert!(guard
            .check(&call("NotebookEdit", Some("analysis.ipynb")))
            .is_blocked());
        assert_eq!(
            guard.check(&call("NotebookEdit", Some("analysis.critique.ipynb"))),
            GuardVerdict::Allow
        );
    }

    #[test]
    fn test_missing_path_blocks() {
        let guard = WriteGuard::deny_all(PathBuf::from("/work/a.md"));
        assert!(reason(guard.check(&call("write", None))).contains("path is missing"));
        assert!(reason(guard.check(&call("edit", Some("  ")))).contains("path is missing"));
    }

    #[test]
    fn test_allow_annotated_only() {
        let guard = WriteGuard::allow_annotated_only(
            PathBuf::from("/work/big.md"),
            PathBuf::from("/work/big.critique.md"),
        );

        assert_eq!(
            guard.check(&call("write", Some("big.critique.md"))),
            GuardVerdict::Allow
        );
        assert_eq!(
            guard.check(&call("edit", Some("@./sub/../big.critique.md"))),
            GuardVerdict::Allow
        );

        let blocked = reason(guard.check(&call("write", Some("/work/big.md"))));
        assert!(blocked.contains("/work/big.critique.md"));
        assert!(blocked.contains("/work/big.md"));
        assert!(guard.check(&call("write", Some("other.md"))).is_blocked());
    }

    #[test]
    fn test_clear_resets_to_absent() {
        let mut guard = WriteGuard::deny_all(PathBuf::from("/work/a.md"));
        let previous = guard.clear();
        assert!(previous.is_armed());
        assert_eq!(guard, WriteGuard::Absent);
        assert_eq!(guard.check(&call("write", Some("/work/a.md"))), GuardVerdict::Allow);
    }

    #[test]
    fn test_serialized_shape() {
        let guard = WriteGuard::allow_annotated_only(
            PathBuf::from("/work/big.md"),
            PathBuf::from("/work/big.critique.md"),
        );
        let json = serde_json::to_value(&guard).unwrap();
        assert_eq!(json["mode"], "allow_annotated_only");
        assert_eq!(json["annotated_path"], "/work/big.critique.md");

        let parsed: WriteGuard =
            serde_json::from_str(r#"{"mode":"deny_all","source_path":"/work/a.md"}"#).unwrap();
        assert_eq!(parsed.source_path(), Some(Path::new("/work/a.md")));
        assert!(serde_json::from_str::<WriteGuard>(r#"{"mode":"allow_all"}"#).is_err());
    }
}
