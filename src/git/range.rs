//! Listing the commits that make up a release

use crate::error::{DigestError, TagError};
use crate::git::VcsQuery;
use crate::notice::{Notice, NoticeSink};
use crate::types::PreviousTag;

/// Commit SHAs between `previous` (exclusive) and `current` (inclusive), oldest first
///
/// With [`PreviousTag::None`] every commit reachable from `current` is in
/// range. When the range holds more than `max_commits` commits, the most
/// recent `max_commits` are kept and a truncation notice is emitted. An
/// empty range is returned as an empty vector.
pub fn extract_commit_range(
    vcs: &dyn VcsQuery,
    previous: &PreviousTag,
    current: &str,
    max_commits: usize,
    sink: &dyn NoticeSink,
) -> Result<Vec<String>, DigestError> {
    if !vcs.ref_exists(current)? {
        return Err(TagError::TagNotFound(current.to_string()).into());
    }

    match vcs.is_shallow() {
        Ok(true) => sink.notice(Notice::ShallowRepository),
        Ok(false) => {}
        Err(e) => tracing::debug!("Shallow clone probe failed: {}", e),
    }

    let mut shas = vcs.commit_range(previous.as_deref(), current)?;
    let total = shas.len();

    tracing::info!(
        "Commit range {}..{} holds {} commits",
        previous,
        current,
        total
    );

    if total > max_commits {
        shas.drain(..total - max_commits);
        sink.notice(Notice::CommitsTruncated {
            total,
            kept: max_commits,
        });
    }

    Ok(shas)
}
