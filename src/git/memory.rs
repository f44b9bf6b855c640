//! In-memory [`VcsQuery`] implementation
//!
//! Models a linear history: commits are appended oldest first and tags point
//! at commits. Individual queries can be made to fail so that degradation
//! paths are testable without a real repository.

use super::{ChangeStatus, FileStat, NameStatus, VcsQuery};
use crate::error::GitError;
use std::collections::HashSet;

/// A file change inside a [`MemoryRepo`] commit
#[derive(Debug, Clone)]
pub struct MemoryChange {
    /// Path as reported by `file_stats` (may carry rename notation)
    pub stat_path: String,
    /// Resulting path used in diffs and name-status
    pub path: String,
    pub status: ChangeStatus,
    pub binary: bool,
    /// Content lines including their `+`/`-` origin
    pub lines: Vec<String>,
}

impl MemoryChange {
    /// Modified text file with the given `+`/`-` content lines
    pub fn modified(path: &str, lines: &[&str]) -> Self {
        Self::with_status(path, ChangeStatus::Modified, lines)
    }

    /// Newly added text file
    pub fn added(path: &str, lines: &[&str]) -> Self {
        Self::with_status(path, ChangeStatus::Added, lines)
    }

    /// Text file with an explicit status
    pub fn with_status(path: &str, status: ChangeStatus, lines: &[&str]) -> Self {
        Self {
            stat_path: path.to_string(),
            path: path.to_string(),
            status,
            binary: false,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Binary file; no countable line stats and no diff text
    pub fn binary(path: &str) -> Self {
        Self {
            stat_path: path.to_string(),
            path: path.to_string(),
            status: ChangeStatus::Modified,
            binary: true,
            lines: Vec::new(),
        }
    }

    /// Renamed file, reported by stats in `old => new` notation
    pub fn renamed(from: &str, to: &str, lines: &[&str]) -> Self {
        Self {
            stat_path: format!("{} => {}", from, to),
            path: to.to_string(),
            status: ChangeStatus::Renamed,
            binary: false,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn stat(&self) -> FileStat {
        if self.binary {
            return FileStat::binary(self.stat_path.clone());
        }
        let additions = self.lines.iter().filter(|l| l.starts_with('+')).count();
        let deletions = self.lines.iter().filter(|l| l.starts_with('-')).count();
        FileStat::text(self.stat_path.clone(), additions, deletions)
    }
}

#[derive(Debug, Clone)]
struct MemoryCommit {
    sha: String,
    message: String,
    changes: Vec<MemoryChange>,
}

#[derive(Debug, Clone)]
struct MemoryTag {
    name: String,
    sha: String,
    created: i64,
}

/// Deterministic repository for tests and benchmarks
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    commits: Vec<MemoryCommit>,
    tags: Vec<MemoryTag>,
    failing_diffs: HashSet<String>,
    failing_stats: HashSet<String>,
    failing_name_status: HashSet<String>,
    fail_tag_listing: bool,
    shallow: bool,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit on top of the history
    pub fn with_commit(mut self, sha: &str, message: &str, changes: Vec<MemoryChange>) -> Self {
        self.commits.push(MemoryCommit {
            sha: sha.to_string(),
            message: message.to_string(),
            changes,
        });
        self
    }

    /// Tag a commit; each call creates a tag newer than the previous ones
    pub fn with_tag(self, name: &str, sha: &str) -> Self {
        let created = self.tags.iter().map(|t| t.created).max().unwrap_or(0) + 1;
        self.with_tag_at(name, sha, created)
    }

    /// Tag a commit with an explicit creation timestamp
    pub fn with_tag_at(mut self, name: &str, sha: &str, created: i64) -> Self {
        self.tags.push(MemoryTag {
            name: name.to_string(),
            sha: sha.to_string(),
            created,
        });
        self
    }

    /// Make `unified_diff` fail for a commit
    pub fn failing_diff(mut self, sha: &str) -> Self {
        self.failing_diffs.insert(sha.to_string());
        self
    }

    /// Make `file_stats` fail for a commit
    pub fn failing_stats(mut self, sha: &str) -> Self {
        self.failing_stats.insert(sha.to_string());
        self
    }

    /// Make `name_status` fail for a commit
    pub fn failing_name_status(mut self, sha: &str) -> Self {
        self.failing_name_status.insert(sha.to_string());
        self
    }

    /// Make `list_tags` fail
    pub fn failing_tag_listing(mut self) -> Self {
        self.fail_tag_listing = true;
        self
    }

    pub fn shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    fn commit(&self, sha: &str) -> Result<&MemoryCommit, GitError> {
        self.commits
            .iter()
            .find(|c| c.sha == sha)
            .ok_or_else(|| GitError::query("show", format!("unknown revision {}", sha)))
    }

    /// History index of a tag or commit SHA
    fn position(&self, name: &str) -> Option<usize> {
        let sha = self
            .tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.sha.as_str())
            .unwrap_or(name);
        self.commits.iter().position(|c| c.sha == sha)
    }
}

impl VcsQuery for MemoryRepo {
    fn list_tags(&self) -> Result<Vec<String>, GitError> {
        if self.fail_tag_listing {
            return Err(GitError::query("tag listing", "simulated failure"));
        }
        let mut tags = self.tags.clone();
        // Stable: equal timestamps keep insertion order
        tags.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    fn ref_exists(&self, name: &str) -> Result<bool, GitError> {
        Ok(self.position(name).is_some())
    }

    fn commit_range(
        &self,
        previous: Option<&str>,
        current: &str,
    ) -> Result<Vec<String>, GitError> {
        let end = self
            .position(current)
            .ok_or_else(|| GitError::RefNotFound(current.to_string()))?;
        let start = match previous {
            Some(prev) => {
                self.position(prev)
                    .ok_or_else(|| GitError::RefNotFound(prev.to_string()))?
                    + 1
            }
            None => 0,
        };
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self.commits[start..=end]
            .iter()
            .map(|c| c.sha.clone())
            .collect())
    }

    fn commit_message(&self, sha: &str) -> Result<String, GitError> {
        Ok(self.commit(sha)?.message.clone())
    }

    fn file_stats(&self, sha: &str) -> Result<Vec<FileStat>, GitError> {
        if self.failing_stats.contains(sha) {
            return Err(GitError::query("numstat", "simulated failure"));
        }
        Ok(self.commit(sha)?.changes.iter().map(|c| c.stat()).collect())
    }

    fn unified_diff(&self, sha: &str, paths: &[String]) -> Result<String, GitError> {
        if self.failing_diffs.contains(sha) {
            return Err(GitError::query("diff", "simulated failure"));
        }
        let commit = self.commit(sha)?;
        let mut out = String::new();
        for change in commit
            .changes
            .iter()
            .filter(|c| !c.binary && paths.contains(&c.path))
        {
            out.push_str(&format!("diff --git a/{0} b/{0}\n", change.path));
            match change.status {
                ChangeStatus::Added => out.push_str("new file mode 100644\n--- /dev/null\n"),
                _ => out.push_str(&format!("--- a/{}\n", change.path)),
            }
            match change.status {
                ChangeStatus::Deleted => out.push_str("+++ /dev/null\n"),
                _ => out.push_str(&format!("+++ b/{}\n", change.path)),
            }
            if !change.lines.is_empty() {
                let (adds, dels) = (
                    change.lines.iter().filter(|l| l.starts_with('+')).count(),
                    change.lines.iter().filter(|l| l.starts_with('-')).count(),
                );
                out.push_str(&format!("@@ -1,{} +1,{} @@\n", dels, adds));
            }
            for line in &change.lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        Ok(out)
    }

    fn name_status(&self, sha: &str) -> Result<Vec<NameStatus>, GitError> {
        if self.failing_name_status.contains(sha) {
            return Err(GitError::query("name-status", "simulated failure"));
        }
        Ok(self
            .commit(sha)?
            .changes
            .iter()
            .map(|c| NameStatus::new(c.path.clone(), c.status))
            .collect())
    }

    fn is_shallow(&self) -> Result<bool, GitError> {
        Ok(self.shallow)
    }
}
