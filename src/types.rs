use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hex characters shown for abbreviated commit hashes
pub const SHORT_SHA_LEN: usize = 8;

/// A tag and its position in the newest-first creation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name, e.g. `v1.2.0`
    pub name: String,
    /// Index in the creation-date-descending listing (0 = newest)
    pub position: usize,
}

impl Tag {
    /// Build positioned tags from a newest-first listing
    pub fn from_listing(names: &[String]) -> Vec<Tag> {
        names
            .iter()
            .enumerate()
            .map(|(position, name)| Tag {
                name: name.clone(),
                position,
            })
            .collect()
    }
}

/// The comparison point chosen for a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum PreviousTag {
    /// Compare against this older tag
    Tag(String),
    /// No older tag exists; everything reachable from the current tag is in range
    None,
}

impl PreviousTag {
    /// Tag name, or `None` for the empty-range sentinel
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            PreviousTag::Tag(name) => Some(name),
            PreviousTag::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PreviousTag::None)
    }
}

impl fmt::Display for PreviousTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviousTag::Tag(name) => f.write_str(name),
            PreviousTag::None => f.write_str("none (first release)"),
        }
    }
}

/// How a changed file is treated by the diff extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Recognized source extension with countable line changes
    Source,
    /// Countable line changes, extension not in the source set
    NonSource,
    /// Additions/deletions could not be counted
    Binary,
}

/// One classified file change inside a commit
///
/// Transient: consumed by the diff extractor and never stored on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    /// Path after rename/copy normalization
    pub path: String,
    pub kind: ChangeKind,
}

impl ChangeEntry {
    /// One-line stand-in for files whose diff text is never surfaced
    pub fn summary_line(&self) -> Option<String> {
        match self.kind {
            ChangeKind::Source => None,
            ChangeKind::NonSource => Some(format!("{}: non-source change (diff omitted)", self.path)),
            ChangeKind::Binary => Some(format!("{}: binary change (diff omitted)", self.path)),
        }
    }
}

/// A commit with its message and bounded diff lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit SHA
    pub sha: String,
    /// Subject and body
    pub message: String,
    /// Bounded, ordered change lines
    pub diff_lines: Vec<String>,
}

impl CommitRecord {
    pub fn new(sha: impl Into<String>, message: impl Into<String>, diff_lines: Vec<String>) -> Self {
        Self {
            sha: sha.into(),
            message: message.into(),
            diff_lines,
        }
    }

    /// Abbreviated SHA used in prompts and notices
    pub fn short_sha(&self) -> &str {
        short_sha(&self.sha)
    }

    /// Copy of this record with a replacement message
    pub fn with_message(&self, message: String) -> Self {
        Self {
            sha: self.sha.clone(),
            message,
            diff_lines: self.diff_lines.clone(),
        }
    }

    /// Copy of this record keeping only the first `keep` diff lines
    pub fn with_diff_prefix(&self, keep: usize) -> Self {
        Self {
            sha: self.sha.clone(),
            message: self.message.clone(),
            diff_lines: self.diff_lines.iter().take(keep).cloned().collect(),
        }
    }
}

/// Abbreviate a SHA without slicing through a multi-byte character
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(SHORT_SHA_LEN) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

/// An ordered, non-empty batch of commit records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub records: Vec<CommitRecord>,
    /// Serialized size of the records' prompt blocks, in characters
    pub size: usize,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// SHAs of the chunk's commits, in order
    pub fn shas(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.sha.as_str()).collect()
    }
}

/// Summary text returned for one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedSummary {
    /// Zero-based chunk index
    pub index: usize,
    pub text: String,
}

#[cfg(test)]
mod tests;
