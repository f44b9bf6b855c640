//! Deterministic prompt rendering
//!
//! Every function here is pure: the same inputs always render the same
//! string. Sizes are measured in characters, not bytes.

use crate::types::{CommitRecord, PreviousTag, StagedSummary};
use std::fmt::Write;

/// Placeholder item for a commit without any change lines
pub const NO_CHANGES_PLACEHOLDER: &str = "- (no diff lines captured)";

/// Body used when the commit range is empty
pub const EMPTY_RANGE_PLACEHOLDER: &str =
    "## No commits\nNo commits were found between these releases.\n\n";

const CONTEXT_HEADING: &str = "## Additional context\n";

/// Length of a rendered string in characters
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn render_header(out: &mut String, current: &str, previous: &PreviousTag, commits: usize) {
    let _ = write!(
        out,
        "Release: {}\nPrevious release: {}\nCommits: {}\n\n",
        current, previous, commits
    );
}

fn render_context(out: &mut String, context: Option<&str>) {
    if let Some(text) = context.map(str::trim).filter(|t| !t.is_empty()) {
        out.push_str(CONTEXT_HEADING);
        out.push_str(text);
        out.push('\n');
    }
}

/// Render one commit block: short SHA, literal message, itemized change lines
pub fn render_commit_block(record: &CommitRecord) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "## Commit {}\nMessage:\n{}\nChanges:\n",
        record.short_sha(),
        record.message
    );
    if record.diff_lines.is_empty() {
        out.push_str(NO_CHANGES_PLACEHOLDER);
        out.push('\n');
    } else {
        for line in &record.diff_lines {
            out.push_str("- ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

/// Character length of [`render_commit_block`] for a record
pub fn commit_block_len(record: &CommitRecord) -> usize {
    char_len(&render_commit_block(record))
}

/// Render the single-submission prompt for a release
pub fn render_prompt(
    current: &str,
    previous: &PreviousTag,
    records: &[CommitRecord],
    context: Option<&str>,
) -> String {
    let mut out = String::new();
    render_header(&mut out, current, previous, records.len());
    if records.is_empty() {
        out.push_str(EMPTY_RANGE_PLACEHOLDER);
    }
    for record in records {
        out.push_str(&render_commit_block(record));
    }
    render_context(&mut out, context);
    out
}

fn render_batch_header(
    out: &mut String,
    current: &str,
    previous: &PreviousTag,
    batch: usize,
    batches: usize,
    commits: usize,
) {
    let _ = write!(
        out,
        "Release: {}\nPrevious release: {}\nBatch: {} of {}\nCommits in batch: {}\n\n",
        current, previous, batch, batches, commits
    );
}

/// Render the prompt for one batch stage
///
/// `batch` is one-based.
pub fn render_batch_prompt(
    current: &str,
    previous: &PreviousTag,
    batch: usize,
    batches: usize,
    records: &[CommitRecord],
) -> String {
    let mut out = String::new();
    render_batch_header(&mut out, current, previous, batch, batches, records.len());
    for record in records {
        out.push_str(&render_commit_block(record));
    }
    out
}

/// Upper bound on a batch header's length for a run of `commits` commits
pub fn batch_header_allowance(current: &str, previous: &PreviousTag, commits: usize) -> usize {
    // No run has more batches than commits
    let widest = commits.max(1);
    let mut out = String::new();
    render_batch_header(&mut out, current, previous, widest, widest, widest);
    char_len(&out)
}

fn summary_heading(index: usize, batches: usize) -> String {
    format!("## Batch {} of {} summary\n", index + 1, batches)
}

/// Render the merge prompt: the direct header followed by one section per batch summary
pub fn render_final_prompt(
    current: &str,
    previous: &PreviousTag,
    commits: usize,
    summaries: &[StagedSummary],
    context: Option<&str>,
) -> String {
    let mut out = String::new();
    render_header(&mut out, current, previous, commits);
    for summary in summaries {
        out.push_str(&summary_heading(summary.index, summaries.len()));
        out.push_str(summary.text.trim_end());
        out.push_str("\n\n");
    }
    render_context(&mut out, context);
    out
}
