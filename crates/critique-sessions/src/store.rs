use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

use crate::parser::parse_transcript;
use crate::types::Transcript;

/// Provides access to transcript files in a directory.
pub struct TranscriptStore {
    transcripts_dir: PathBuf,
}

impl TranscriptStore {
    pub fn with_dir(transcripts_dir: PathBuf) -> Self {
        Self { transcripts_dir }
    }

    pub fn transcripts_dir(&self) -> &Path {
        &self.transcripts_dir
    }

    /// Transcript files in the directory, most recently modified first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.transcripts_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.transcripts_dir).with_context(|| {
            format!(
                "Failed to read transcripts dir: {:?}",
                self.transcripts_dir
            )
        })?;

        let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
                continue;
            }

            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, path));
        }

        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Parse the most recently modified transcript, if any exist.
    pub fn latest(&self) -> Result<Option<Transcript>> {
        match self.list()?.first() {
            Some(path) => parse_transcript(path).map(Some),
            None => Ok(None),
        }
    }

    /// Load a transcript from a file, or the newest one when given a directory.
    pub fn load(path: &Path) -> Result<Transcript> {
        if path.is_dir() {
            let store = Self::with_dir(path.to_path_buf());
            Ok(store.latest()?.unwrap_or_else(|| {
                tracing::warn!("No transcripts found in {:?}", path);
                Transcript::empty()
            }))
        } else {
            parse_transcript(path)
        }
    }
}
