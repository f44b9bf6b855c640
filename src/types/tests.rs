use super::*;

#[test]
fn test_tag_from_listing_positions() {
    let names = vec!["v1.1.0".to_string(), "v1.0.0".to_string()];
    let tags = Tag::from_listing(&names);

    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].name, "v1.1.0");
    assert_eq!(tags[0].position, 0);
    assert_eq!(tags[1].position, 1);
}

#[test]
fn test_previous_tag_sentinel() {
    let none = PreviousTag::None;
    assert!(none.is_none());
    assert_eq!(none.as_deref(), None);
    assert_eq!(none.to_string(), "none (first release)");

    let tag = PreviousTag::Tag("v1.0.0".to_string());
    assert!(!tag.is_none());
    assert_eq!(tag.as_deref(), Some("v1.0.0"));
    assert_eq!(tag.to_string(), "v1.0.0");
}

#[test]
fn test_previous_tag_serialization() {
    let json = serde_json::to_string(&PreviousTag::Tag("v2.0.0".to_string())).unwrap();
    assert_eq!(json, r#"{"kind":"tag","name":"v2.0.0"}"#);

    let json = serde_json::to_string(&PreviousTag::None).unwrap();
    assert_eq!(json, r#"{"kind":"none"}"#);
}

#[test]
fn test_change_entry_summary_lines() {
    let binary = ChangeEntry {
        path: "assets/logo.png".to_string(),
        kind: ChangeKind::Binary,
    };
    assert_eq!(
        binary.summary_line().as_deref(),
        Some("assets/logo.png: binary change (diff omitted)")
    );

    let docs = ChangeEntry {
        path: "README.md".to_string(),
        kind: ChangeKind::NonSource,
    };
    assert_eq!(
        docs.summary_line().as_deref(),
        Some("README.md: non-source change (diff omitted)")
    );

    let source = ChangeEntry {
        path: "src/lib.rs".to_string(),
        kind: ChangeKind::Source,
    };
    assert_eq!(source.summary_line(), None);
}

#[test]
fn test_commit_record_short_sha() {
    let record = CommitRecord::new("0123456789abcdef", "msg", vec![]);
    assert_eq!(record.short_sha(), "01234567");

    let short = CommitRecord::new("abc", "msg", vec![]);
    assert_eq!(short.short_sha(), "abc");
}

#[test]
fn test_commit_record_copies_leave_original_untouched() {
    let original = CommitRecord::new(
        "abc123",
        "Add feature",
        vec!["a.rs: +one".to_string(), "a.rs: +two".to_string()],
    );

    let renamed = original.with_message("Add…".to_string());
    let trimmed = original.with_diff_prefix(1);

    assert_eq!(original.message, "Add feature");
    assert_eq!(original.diff_lines.len(), 2);
    assert_eq!(renamed.message, "Add…");
    assert_eq!(renamed.diff_lines, original.diff_lines);
    assert_eq!(trimmed.diff_lines, vec!["a.rs: +one".to_string()]);
}

#[test]
fn test_chunk_shas_in_order() {
    let chunk = Chunk {
        records: vec![
            CommitRecord::new("aaa", "first", vec![]),
            CommitRecord::new("bbb", "second", vec![]),
        ],
        size: 42,
    };

    assert_eq!(chunk.len(), 2);
    assert!(!chunk.is_empty());
    assert_eq!(chunk.shas(), vec!["aaa", "bbb"]);
}
