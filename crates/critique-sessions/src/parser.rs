use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::types::{Transcript, TranscriptEntry};

/// Parse a host transcript JSONL file.
///
/// Lines that do not parse as a transcript entry are skipped with a warning;
/// hosts append line types this crate does not model.
pub fn parse_transcript(path: &Path) -> Result<Transcript> {
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    let file =
        File::open(path).with_context(|| format!("Failed to open transcript: {:?}", path))?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| "Failed to read line from transcript")?;
        match parse_line(&line) {
            Some(Ok(entry)) => entries.push(entry),
            Some(Err(e)) => {
                skipped += 1;
                warn!(line = index + 1, error = %e, "Skipping unparseable transcript line");
            }
            None => {}
        }
    }

    debug!(id = %id, entries = entries.len(), skipped, "Parsed transcript");

    Ok(Transcript { id, entries })
}

/// Parse transcript JSONL held in memory. Returns the entries and the number
/// of lines that failed to parse.
pub fn parse_transcript_str(contents: &str) -> (Vec<TranscriptEntry>, usize) {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for line in contents.lines() {
        match parse_line(line) {
            Some(Ok(entry)) => entries.push(entry),
            Some(Err(_)) => skipped += 1,
            None => {}
        }
    }

    (entries, skipped)
}

fn parse_line(line: &str) -> Option<serde_json::Result<TranscriptEntry>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}
