//! Non-fatal notices raised while bounding the pipeline's inputs
//!
//! Components that may truncate or degrade their output take a
//! [`NoticeSink`] argument. There is no global sink: the caller decides
//! whether notices go to the log, into a buffer, or both.

use std::fmt;
use std::sync::Mutex;

/// Progressive reduction applied to a single oversized commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionStep {
    /// Message cut to roughly a quarter of the budget
    MessageTruncated,
    /// Some trailing diff lines removed
    DiffLinesDropped(usize),
    /// Every diff line removed
    AllDiffDropped,
    /// Message cut again, down to what the budget leaves (or the hard floor)
    MessageFloor,
}

impl fmt::Display for ReductionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionStep::MessageTruncated => f.write_str("message truncated"),
            ReductionStep::DiffLinesDropped(n) => write!(f, "{} diff lines dropped", n),
            ReductionStep::AllDiffDropped => f.write_str("all diff lines dropped"),
            ReductionStep::MessageFloor => f.write_str("message truncated to floor"),
        }
    }
}

/// A non-fatal event; execution continues with the reduced value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Commit range held more commits than allowed; the oldest were dropped
    CommitsTruncated { total: usize, kept: usize },
    /// A commit produced more change lines than allowed
    DiffLinesTruncated {
        sha: String,
        total: usize,
        kept: usize,
    },
    /// Diff retrieval failed or was empty; a name-status listing was substituted
    DiffDegraded { sha: String, reason: String },
    /// A single commit was reduced to fit the stage budget
    CommitReduced { sha: String, step: ReductionStep },
    /// The merged final prompt was over budget; batch summaries were shortened
    FinalPromptTruncated { original: usize, budget: usize },
    /// The repository is a shallow clone; older history may be missing
    ShallowRepository,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::CommitsTruncated { total, kept } => write!(
                f,
                "commit range has {} commits; keeping the most recent {}",
                total, kept
            ),
            Notice::DiffLinesTruncated { sha, total, kept } => write!(
                f,
                "commit {}: {} change lines truncated to {}",
                crate::types::short_sha(sha),
                total,
                kept
            ),
            Notice::DiffDegraded { sha, reason } => write!(
                f,
                "commit {}: diff unavailable ({}); using name-status summary",
                crate::types::short_sha(sha),
                reason
            ),
            Notice::CommitReduced { sha, step } => write!(
                f,
                "commit {} exceeds the stage budget: {}",
                crate::types::short_sha(sha),
                step
            ),
            Notice::FinalPromptTruncated { original, budget } => write!(
                f,
                "final prompt is {} chars (budget {}); batch summaries shortened",
                original, budget
            ),
            Notice::ShallowRepository => {
                f.write_str("repository is a shallow clone; commit range may be incomplete")
            }
        }
    }
}

/// Port for non-fatal notices
pub trait NoticeSink: Send + Sync {
    fn notice(&self, notice: Notice);
}

/// Forwards every notice to `tracing` at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn notice(&self, notice: Notice) {
        tracing::warn!("{}", notice);
    }
}

/// Records notices in arrival order
#[derive(Debug, Default)]
pub struct CollectingSink {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notices collected so far
    pub fn notices(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.notices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NoticeSink for CollectingSink {
    fn notice(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut guard) => guard.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_preserves_order() {
        let sink = CollectingSink::new();
        sink.notice(Notice::ShallowRepository);
        sink.notice(Notice::CommitsTruncated {
            total: 10,
            kept: 5,
        });

        let notices = sink.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0], Notice::ShallowRepository);
        assert_eq!(notices[1].to_string(), "commit range has 10 commits; keeping the most recent 5");
    }

    #[test]
    fn test_notice_display_uses_short_sha() {
        let notice = Notice::DiffDegraded {
            sha: "0123456789abcdef0123".to_string(),
            reason: "empty diff".to_string(),
        };
        assert_eq!(
            notice.to_string(),
            "commit 01234567: diff unavailable (empty diff); using name-status summary"
        );
    }

    #[test]
    fn test_reduction_step_display() {
        let notice = Notice::CommitReduced {
            sha: "abcdef".to_string(),
            step: ReductionStep::DiffLinesDropped(3),
        };
        assert_eq!(
            notice.to_string(),
            "commit abcdef exceeds the stage budget: 3 diff lines dropped"
        );
    }

    #[test]
    fn test_empty_sink() {
        let sink = CollectingSink::new();
        assert!(sink.is_empty());
        sink.notice(Notice::ShallowRepository);
        assert_eq!(sink.len(), 1);
    }
}
