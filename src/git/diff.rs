//! Per-commit change classification and bounded diff extraction
//!
//! Each changed file is classified as source, non-source or binary. Only
//! source files contribute raw diff lines; the others are reduced to a single
//! summary line. Diff retrieval problems never fail the run: the commit falls
//! back to a name-status listing and a [`Notice::DiffDegraded`] is emitted.

use crate::config::{DiffConfig, normalize_extension};
use crate::error::DigestError;
use crate::git::{FileStat, VcsQuery};
use crate::notice::{Notice, NoticeSink};
use crate::types::{ChangeEntry, ChangeKind, CommitRecord};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

/// Marker appended to truncated lines and messages
pub const ELLIPSIS: &str = "...";

static BRACE_RENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>.*)\{(?P<old>[^{}]*) => (?P<new>[^{}]*)\}(?P<suffix>.*)$")
        .expect("valid rename pattern")
});

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -\d+(?:,(?P<old>\d+))? \+\d+(?:,(?P<new>\d+))? @@")
        .expect("valid hunk pattern")
});

/// Limits and source-extension set used when extracting diffs
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Normalized extensions (lower-case, no leading dot)
    pub source_extensions: HashSet<String>,
    /// Maximum lines kept per commit
    pub max_lines: usize,
    /// Maximum characters per line
    pub max_line_chars: usize,
}

impl DiffOptions {
    pub fn new<I, S>(extensions: I, max_lines: usize, max_line_chars: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            source_extensions: extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
            max_lines,
            max_line_chars,
        }
    }

    pub fn from_config(config: &DiffConfig) -> Self {
        Self::new(
            &config.source_extensions,
            config.max_lines,
            config.max_line_chars,
        )
    }

    /// Whether a path's extension is in the source set
    pub fn is_source_path(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.source_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Cut a line to `max_chars` characters, ending it with [`ELLIPSIS`] when cut
///
/// Lines already within the limit are returned unchanged.
pub fn truncate_line(line: &str, max_chars: usize) -> String {
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let marker_len = ELLIPSIS.chars().count();
    if max_chars <= marker_len {
        return ELLIPSIS.chars().take(max_chars).collect();
    }
    let mut out: String = line.chars().take(max_chars - marker_len).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Resolve rename/copy notation to the resulting path
///
/// Handles both `dir/{old => new}/file` and `old => new` forms.
pub fn normalize_rename_path(raw: &str) -> String {
    if let Some(caps) = BRACE_RENAME.captures(raw) {
        let joined = format!("{}{}{}", &caps["prefix"], &caps["new"], &caps["suffix"]);
        // An empty side leaves a doubled separator behind, e.g. `a/{ => b}/c`
        return joined.replace("//", "/").trim_start_matches('/').to_string();
    }
    match raw.split_once(" => ") {
        Some((_, new)) => new.trim().to_string(),
        None => raw.to_string(),
    }
}

/// Source side of rename/copy notation, if the path carries one
pub fn rename_source_path(raw: &str) -> Option<String> {
    if let Some(caps) = BRACE_RENAME.captures(raw) {
        let joined = format!("{}{}{}", &caps["prefix"], &caps["old"], &caps["suffix"]);
        return Some(joined.replace("//", "/").trim_start_matches('/').to_string());
    }
    raw.split_once(" => ").map(|(old, _)| old.trim().to_string())
}

/// Classify a commit's file stats
pub fn classify_changes(stats: &[FileStat], options: &DiffOptions) -> Vec<ChangeEntry> {
    stats
        .iter()
        .map(|stat| {
            let path = normalize_rename_path(&stat.path);
            let kind = if stat.is_binary() {
                ChangeKind::Binary
            } else if options.is_source_path(&path) {
                ChangeKind::Source
            } else {
                ChangeKind::NonSource
            };
            ChangeEntry { path, kind }
        })
        .collect()
}

/// Keep only added/removed content lines of a unified diff
///
/// File headers and hunk markers are dropped; every kept line is prefixed
/// with its file path and cut to `max_line_chars`.
pub fn parse_unified_diff(text: &str, max_line_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut path = String::new();
    // Lines still expected in the current hunk (old side, new side)
    let mut remaining: Option<(usize, usize)> = None;

    for raw in text.lines() {
        if let Some((old_left, new_left)) = remaining.as_mut()
            && (*old_left > 0 || *new_left > 0)
        {
            match raw.chars().next() {
                Some('+') => *new_left = new_left.saturating_sub(1),
                Some('-') => *old_left = old_left.saturating_sub(1),
                Some(' ') => {
                    *old_left = old_left.saturating_sub(1);
                    *new_left = new_left.saturating_sub(1);
                    continue;
                }
                Some('\\') => continue,
                _ => {
                    // Counts disagree with the body; fall through to header handling
                    remaining = None;
                    if !handle_header(raw, &mut path, &mut remaining) {
                        tracing::debug!("Skipping unexpected diff line in {}", path);
                    }
                    continue;
                }
            }
            lines.push(truncate_line(&format!("{}: {}", path, raw), max_line_chars));
            continue;
        }

        handle_header(raw, &mut path, &mut remaining);
    }

    lines
}

/// Update parser state from a header line; returns false for unknown lines
fn handle_header(raw: &str, path: &mut String, remaining: &mut Option<(usize, usize)>) -> bool {
    if let Some(rest) = raw.strip_prefix("diff --git ") {
        *remaining = None;
        if let Some(idx) = rest.rfind(" b/") {
            *path = rest[idx + 3..].to_string();
        }
        return true;
    }
    if let Some(rest) = raw.strip_prefix("+++ ") {
        if let Some(new_path) = rest.strip_prefix("b/") {
            *path = new_path.to_string();
        }
        return true;
    }
    if let Some(rest) = raw.strip_prefix("--- ") {
        if path.is_empty()
            && let Some(old_path) = rest.strip_prefix("a/")
        {
            *path = old_path.to_string();
        }
        return true;
    }
    if let Some(caps) = HUNK_HEADER.captures(raw) {
        let count = |name: &str| {
            caps.name(name)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .unwrap_or(1)
        };
        *remaining = Some((count("old"), count("new")));
        return true;
    }
    const KNOWN: [&str; 12] = [
        "index ",
        "new file mode",
        "deleted file mode",
        "old mode",
        "new mode",
        "similarity index",
        "dissimilarity index",
        "rename from",
        "rename to",
        "copy from",
        "copy to",
        "Binary files",
    ];
    KNOWN.iter().any(|prefix| raw.starts_with(prefix)) || raw.starts_with('\\')
}

/// Name-status lines for a commit, optionally limited to some paths
fn name_status_lines(
    vcs: &dyn VcsQuery,
    sha: &str,
    only: Option<&HashSet<String>>,
    max_line_chars: usize,
) -> Vec<String> {
    match vcs.name_status(sha) {
        Ok(entries) => entries
            .into_iter()
            .map(|e| (normalize_rename_path(&e.path), e.status))
            .filter(|(path, _)| only.is_none_or(|set| set.contains(path)))
            .map(|(path, status)| truncate_line(&format!("{}: {}", path, status), max_line_chars))
            .collect(),
        Err(e) => {
            tracing::warn!(
                "Name-status listing for {} failed, no change lines kept: {}",
                crate::types::short_sha(sha),
                e
            );
            Vec::new()
        }
    }
}

/// Build the record for one commit
///
/// Only the commit message query is fatal; every diff-side failure degrades
/// to a name-status summary.
pub fn build_commit_record(
    vcs: &dyn VcsQuery,
    sha: &str,
    options: &DiffOptions,
    sink: &dyn NoticeSink,
) -> Result<CommitRecord, DigestError> {
    let message = vcs.commit_message(sha)?.trim_end().to_string();

    let degrade = |reason: String, only: Option<&HashSet<String>>| {
        sink.notice(Notice::DiffDegraded {
            sha: sha.to_string(),
            reason,
        });
        name_status_lines(vcs, sha, only, options.max_line_chars)
    };

    let (content, summaries) = match vcs.file_stats(sha) {
        Ok(stats) => {
            let entries = classify_changes(&stats, options);

            let mut source_paths: Vec<String> = Vec::new();
            // Old side of renamed source files, so the diff can pair them
            let mut renamed_from: Vec<String> = Vec::new();
            let mut summaries = Vec::new();
            for (stat, entry) in stats.iter().zip(&entries) {
                match entry.summary_line() {
                    Some(line) => summaries.push(truncate_line(&line, options.max_line_chars)),
                    None => {
                        if !source_paths.contains(&entry.path) {
                            source_paths.push(entry.path.clone());
                        }
                        if let Some(old) = rename_source_path(&stat.path)
                            && !renamed_from.contains(&old)
                        {
                            renamed_from.push(old);
                        }
                    }
                }
            }

            let content = if source_paths.is_empty() {
                Vec::new()
            } else {
                let only: HashSet<String> = source_paths.iter().cloned().collect();
                let pathspec: Vec<String> = source_paths
                    .iter()
                    .chain(renamed_from.iter().filter(|p| !only.contains(*p)))
                    .cloned()
                    .collect();
                match vcs.unified_diff(sha, &pathspec) {
                    Ok(text) => {
                        let lines = parse_unified_diff(&text, options.max_line_chars);
                        if lines.is_empty() {
                            degrade("diff produced no content lines".to_string(), Some(&only))
                        } else {
                            lines
                        }
                    }
                    Err(e) => degrade(e.to_string(), Some(&only)),
                }
            };
            (content, summaries)
        }
        Err(e) => (degrade(e.to_string(), None), Vec::new()),
    };

    let total = content.len() + summaries.len();
    let diff_lines: Vec<String> = content
        .into_iter()
        .chain(summaries)
        .take(options.max_lines)
        .collect();

    if total > options.max_lines {
        sink.notice(Notice::DiffLinesTruncated {
            sha: sha.to_string(),
            total,
            kept: options.max_lines,
        });
    }

    Ok(CommitRecord {
        sha: sha.to_string(),
        message,
        diff_lines,
    })
}

/// Build records for commits in order
pub fn build_commit_records(
    vcs: &dyn VcsQuery,
    shas: &[String],
    options: &DiffOptions,
    sink: &dyn NoticeSink,
) -> Result<Vec<CommitRecord>, DigestError> {
    let mut records = Vec::with_capacity(shas.len());
    for (i, sha) in shas.iter().enumerate() {
        records.push(build_commit_record(vcs, sha, options, sink)?);
        if (i + 1) % 50 == 0 {
            tracing::debug!("Extracted {} of {} commits", i + 1, shas.len());
        }
    }
    tracing::info!("Built {} commit records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::memory::MemoryChange;
    use crate::git::{ChangeStatus, MemoryRepo};
    use crate::notice::CollectingSink;

    fn options() -> DiffOptions {
        DiffOptions::new(["rs", ".PY"], 120, 300)
    }

    #[test]
    fn test_truncate_line_exact_length() {
        let line = "x".repeat(500);
        let cut = truncate_line(&line, 300);
        assert_eq!(cut.chars().count(), 300);
        assert!(cut.ends_with(ELLIPSIS));
        assert_eq!(&cut[..297], &line[..297]);
    }

    #[test]
    fn test_truncate_line_untouched_within_limit() {
        for len in [0, 1, 299, 300] {
            let line = "y".repeat(len);
            assert_eq!(truncate_line(&line, 300), line);
        }
    }

    #[test]
    fn test_truncate_line_multibyte() {
        let line = "é".repeat(20);
        let cut = truncate_line(&line, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.starts_with("éééééé"));
        assert!(cut.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_normalize_rename_path() {
        assert_eq!(normalize_rename_path("src/lib.rs"), "src/lib.rs");
        assert_eq!(normalize_rename_path("old.rs => new.rs"), "new.rs");
        assert_eq!(
            normalize_rename_path("src/{old => new}/mod.rs"),
            "src/new/mod.rs"
        );
        assert_eq!(normalize_rename_path("src/{a.rs => b.rs}"), "src/b.rs");
        assert_eq!(normalize_rename_path("src/{ => nested}/x.rs"), "src/nested/x.rs");
        assert_eq!(normalize_rename_path("src/{nested => }/x.rs"), "src/x.rs");
    }

    #[test]
    fn test_rename_source_path() {
        assert_eq!(rename_source_path("src/lib.rs"), None);
        assert_eq!(rename_source_path("old.rs => new.rs").as_deref(), Some("old.rs"));
        assert_eq!(
            rename_source_path("src/{old => new}/mod.rs").as_deref(),
            Some("src/old/mod.rs")
        );
        assert_eq!(
            rename_source_path("src/{ => nested}/x.rs").as_deref(),
            Some("src/x.rs")
        );
    }

    #[test]
    fn test_classify_changes() {
        let stats = vec![
            FileStat::text("src/main.rs", 3, 1),
            FileStat::text("tool.PY", 1, 0),
            FileStat::text("README.md", 2, 2),
            FileStat::binary("logo.rs"),
            FileStat::text("src/{a => b}/lib.rs", 1, 1),
        ];
        let entries = classify_changes(&stats, &options());
        let kinds: Vec<ChangeKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Source,
                ChangeKind::Source,
                ChangeKind::NonSource,
                ChangeKind::Binary,
                ChangeKind::Source
            ]
        );
        assert_eq!(entries[4].path, "src/b/lib.rs");
    }

    #[test]
    fn test_parse_unified_diff_strips_headers() {
        let text = "diff --git a/src/lib.rs b/src/lib.rs\n\
                    index 1111111..2222222 100644\n\
                    --- a/src/lib.rs\n\
                    +++ b/src/lib.rs\n\
                    @@ -1,2 +1,1 @@\n\
                    -fn old() {}\n\
                    --- not a header\n\
                    +fn new() {}\n";
        let lines = parse_unified_diff(text, 300);
        assert_eq!(
            lines,
            vec![
                "src/lib.rs: -fn old() {}",
                "src/lib.rs: --- not a header",
                "src/lib.rs: +fn new() {}",
            ]
        );
    }

    #[test]
    fn test_parse_unified_diff_tracks_files() {
        let text = "diff --git a/a.rs b/a.rs\n\
                    --- a/a.rs\n\
                    +++ b/a.rs\n\
                    @@ -0,0 +1 @@\n\
                    +one\n\
                    diff --git a/b.rs b/b.rs\n\
                    deleted file mode 100644\n\
                    --- a/b.rs\n\
                    +++ /dev/null\n\
                    @@ -1 +0,0 @@\n\
                    -two\n\
                    \\ No newline at end of file\n";
        let lines = parse_unified_diff(text, 300);
        assert_eq!(lines, vec!["a.rs: +one", "b.rs: -two"]);
    }

    #[test]
    fn test_binary_change_yields_single_summary() {
        let repo = MemoryRepo::new().with_commit(
            "c1",
            "Add logo",
            vec![MemoryChange::binary("assets/logo.png")],
        );
        let sink = CollectingSink::new();
        let record = build_commit_record(&repo, "c1", &options(), &sink).unwrap();

        assert_eq!(
            record.diff_lines,
            vec!["assets/logo.png: binary change (diff omitted)"]
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_source_lines_before_summaries() {
        let repo = MemoryRepo::new().with_commit(
            "c1",
            "Feature\n\nWith body\n",
            vec![
                MemoryChange::modified("README.md", &["+docs"]),
                MemoryChange::modified("src/lib.rs", &["-old", "+new"]),
            ],
        );
        let sink = CollectingSink::new();
        let record = build_commit_record(&repo, "c1", &options(), &sink).unwrap();

        assert_eq!(record.message, "Feature\n\nWith body");
        assert_eq!(
            record.diff_lines,
            vec![
                "src/lib.rs: -old",
                "src/lib.rs: +new",
                "README.md: non-source change (diff omitted)",
            ]
        );
    }

    #[test]
    fn test_line_cap_prefers_content_lines() {
        let body: Vec<String> = (0..10).map(|i| format!("+line {}", i)).collect();
        let body_refs: Vec<&str> = body.iter().map(|s| s.as_str()).collect();
        let repo = MemoryRepo::new().with_commit(
            "c1",
            "Big change",
            vec![
                MemoryChange::modified("notes.txt", &["+x"]),
                MemoryChange::modified("src/big.rs", &body_refs),
            ],
        );

        for cap in [1, 5, 10, 11, 20] {
            let sink = CollectingSink::new();
            let opts = DiffOptions::new(["rs"], cap, 300);
            let record = build_commit_record(&repo, "c1", &opts, &sink).unwrap();
            assert!(record.diff_lines.len() <= cap);
            if cap <= 10 {
                assert!(record.diff_lines.iter().all(|l| l.starts_with("src/big.rs")));
                assert_eq!(
                    sink.notices(),
                    vec![Notice::DiffLinesTruncated {
                        sha: "c1".to_string(),
                        total: 11,
                        kept: cap
                    }]
                );
            } else {
                assert_eq!(record.diff_lines.len(), 11);
                assert!(sink.is_empty());
            }
        }
    }

    #[test]
    fn test_long_content_line_truncated() {
        let long = format!("+{}", "a".repeat(499));
        let repo = MemoryRepo::new().with_commit(
            "c1",
            "Long line",
            vec![MemoryChange::modified("x.rs", &[long.as_str()])],
        );
        let sink = CollectingSink::new();
        let record = build_commit_record(&repo, "c1", &options(), &sink).unwrap();

        assert_eq!(record.diff_lines.len(), 1);
        assert_eq!(record.diff_lines[0].chars().count(), 300);
        assert!(record.diff_lines[0].ends_with(ELLIPSIS));
    }

    #[test]
    fn test_diff_failure_degrades_to_name_status() {
        let repo = MemoryRepo::new()
            .with_commit(
                "c1",
                "Refactor",
                vec![
                    MemoryChange::renamed("src/old.rs", "src/new.rs", &["+x"]),
                    MemoryChange::modified("Cargo.lock", &["+y"]),
                ],
            )
            .failing_diff("c1");
        let sink = CollectingSink::new();
        let record = build_commit_record(&repo, "c1", &options(), &sink).unwrap();

        assert_eq!(
            record.diff_lines,
            vec![
                "src/new.rs: renamed",
                "Cargo.lock: non-source change (diff omitted)",
            ]
        );
        assert!(matches!(
            sink.notices().as_slice(),
            [Notice::DiffDegraded { sha, .. }] if sha == "c1"
        ));
    }

    #[test]
    fn test_empty_diff_degrades() {
        let repo = MemoryRepo::new().with_commit(
            "c1",
            "Mode change",
            vec![MemoryChange::with_status("run.sh", ChangeStatus::Modified, &[])],
        );
        let sink = CollectingSink::new();
        let opts = DiffOptions::new(["sh"], 10, 300);
        let record = build_commit_record(&repo, "c1", &opts, &sink).unwrap();

        assert_eq!(record.diff_lines, vec!["run.sh: modified"]);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_stats_failure_degrades_whole_commit() {
        let repo = MemoryRepo::new()
            .with_commit(
                "c1",
                "Mixed",
                vec![
                    MemoryChange::added("a.rs", &["+a"]),
                    MemoryChange::binary("b.bin"),
                ],
            )
            .failing_stats("c1");
        let sink = CollectingSink::new();
        let record = build_commit_record(&repo, "c1", &options(), &sink).unwrap();

        assert_eq!(record.diff_lines, vec!["a.rs: added", "b.bin: modified"]);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_name_status_failure_still_succeeds() {
        let repo = MemoryRepo::new()
            .with_commit("c1", "Broken", vec![MemoryChange::added("a.rs", &["+a"])])
            .failing_diff("c1")
            .failing_name_status("c1");
        let sink = CollectingSink::new();
        let record = build_commit_record(&repo, "c1", &options(), &sink).unwrap();

        assert!(record.diff_lines.is_empty());
        assert_eq!(record.message, "Broken");
    }

    #[test]
    fn test_unknown_commit_is_fatal() {
        let repo = MemoryRepo::new();
        let sink = CollectingSink::new();
        let result = build_commit_record(&repo, "missing", &options(), &sink);
        assert!(matches!(result, Err(DigestError::Git(_))));
    }

    #[test]
    fn test_build_commit_records_keeps_order() {
        let repo = MemoryRepo::new()
            .with_commit("c1", "one", vec![])
            .with_commit("c2", "two", vec![])
            .with_commit("c3", "three", vec![]);
        let sink = CollectingSink::new();
        let shas = vec!["c3".to_string(), "c1".to_string(), "c2".to_string()];
        let records = build_commit_records(&repo, &shas, &options(), &sink).unwrap();
        let got: Vec<&str> = records.iter().map(|r| r.sha.as_str()).collect();
        assert_eq!(got, vec!["c3", "c1", "c2"]);
        assert!(records.iter().all(|r| r.diff_lines.is_empty()));
    }
}
