//! Git history access for release digests
//!
//! The pipeline talks to version control only through [`VcsQuery`], so it can
//! run against a real repository ([`GitWalker`]) or a deterministic in-memory
//! one ([`MemoryRepo`]) in tests.

/// Chunk planning for staged summarization
pub mod chunker;
/// Per-commit change classification and diff extraction
pub mod diff;
/// In-memory repository used by tests and benchmarks
pub mod memory;
/// Commit range extraction between two tags
pub mod range;
/// Comparison tag resolution
pub mod tags;
/// git2-backed repository access
pub mod walker;

pub use chunker::{CommitChunker, plan_chunks};
pub use diff::{DiffOptions, build_commit_record, build_commit_records};
pub use memory::MemoryRepo;
pub use range::extract_commit_range;
pub use tags::resolve_previous_tag;
pub use walker::GitWalker;

use crate::error::GitError;
use std::fmt;

/// Line statistics for one changed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// Path as reported; may still carry `old => new` rename notation
    pub path: String,
    /// Added lines, `None` when not countable (binary)
    pub additions: Option<usize>,
    /// Deleted lines, `None` when not countable (binary)
    pub deletions: Option<usize>,
}

impl FileStat {
    pub fn text(path: impl Into<String>, additions: usize, deletions: usize) -> Self {
        Self {
            path: path.into(),
            additions: Some(additions),
            deletions: Some(deletions),
        }
    }

    pub fn binary(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            additions: None,
            deletions: None,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.additions.is_none() || self.deletions.is_none()
    }
}

/// Kind of change in a name-status listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Deleted => "deleted",
            ChangeStatus::Renamed => "renamed",
            ChangeStatus::Copied => "copied",
        };
        f.write_str(s)
    }
}

/// One entry of a name-status listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameStatus {
    pub path: String,
    pub status: ChangeStatus,
}

impl NameStatus {
    pub fn new(path: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// Narrow read-only view of a version-control repository
///
/// Every method distinguishes a failed query (`Err`) from an empty result
/// (`Ok` with nothing in it).
pub trait VcsQuery: Send + Sync {
    /// All tag names, newest first by creation time
    ///
    /// Tags with identical creation times keep the order the backend lists them in.
    fn list_tags(&self) -> Result<Vec<String>, GitError>;

    /// Whether a tag or other ref resolves to a commit
    fn ref_exists(&self, name: &str) -> Result<bool, GitError>;

    /// Commit SHAs reachable from `current` but not from `previous`, oldest first
    fn commit_range(&self, previous: Option<&str>, current: &str)
    -> Result<Vec<String>, GitError>;

    /// Subject and body of a commit
    fn commit_message(&self, sha: &str) -> Result<String, GitError>;

    /// Per-file line statistics of a commit against its first parent
    fn file_stats(&self, sha: &str) -> Result<Vec<FileStat>, GitError>;

    /// Zero-context unified diff of a commit restricted to `paths`
    fn unified_diff(&self, sha: &str, paths: &[String]) -> Result<String, GitError>;

    /// Name-status listing of a commit
    fn name_status(&self, sha: &str) -> Result<Vec<NameStatus>, GitError>;

    /// Whether the repository is a shallow clone
    fn is_shallow(&self) -> Result<bool, GitError>;
}
