//! # Release Digest - bounded release notes from git history
//!
//! Turns the commits between two release tags into size-bounded text for a
//! remote summarization model, and assembles the final digest from either a
//! single call or a staged sequence of calls when the material is too large
//! for one request.
//!
//! ## Pipeline
//!
//! ```text
//! tag pair ──► commit SHAs ──► commit records ──► prompt
//!                                                   │
//!                       fits the stage budget? ─────┤
//!                              │ yes                │ no
//!                              ▼                    ▼
//!                        one submission      chunk plan ──► batch summaries
//!                                                              │
//!                                                              ▼
//!                                                    final merge submission
//! ```
//!
//! ## Modules
//!
//! - [`git`]: version-control port, tag resolution, range extraction, diff extraction and chunk planning
//! - [`prompt`]: deterministic prompt rendering
//! - [`summarize`]: summarization port and the OpenAI-style HTTP backend
//! - [`pipeline`]: staged summarization orchestrator
//! - [`client`]: end-to-end driver used by the CLI
//! - [`notice`]: non-fatal truncation and degradation notices
//! - [`config`]: configuration with environment variable overrides
//! - [`error`]: error types
//! - [`types`]: shared data model
//! - [`paths`]: platform configuration paths
//!
//! ## Usage Example
//!
//! ```no_run
//! use release_digest::git::MemoryRepo;
//! use release_digest::notice::TracingSink;
//! use release_digest::{
//!     DiffOptions, PreviousTag, build_commit_records, extract_commit_range, render_prompt,
//!     resolve_previous_tag,
//! };
//! use release_digest::git::VcsQuery;
//!
//! fn main() -> anyhow::Result<()> {
//!     let repo = MemoryRepo::new()
//!         .with_commit("a1", "Initial import", vec![])
//!         .with_tag("v1.0.0", "a1");
//!
//!     let tags = repo.list_tags()?;
//!     let previous = resolve_previous_tag(&tags, "v1.0.0", None)?;
//!     let shas = extract_commit_range(&repo, &previous, "v1.0.0", 200, &TracingSink)?;
//!     let options = DiffOptions::new(["rs"], 120, 300);
//!     let records = build_commit_records(&repo, &shas, &options, &TracingSink)?;
//!     println!("{}", render_prompt("v1.0.0", &previous, &records, None));
//!     assert_eq!(previous, PreviousTag::None);
//!     Ok(())
//! }
//! ```

/// End-to-end driver: tag to digest
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Git access, diff extraction and chunk planning
pub mod git;

/// Non-fatal notices and their sinks
pub mod notice;

/// Platform configuration paths
pub mod paths;

/// Staged summarization orchestrator
pub mod pipeline;

/// Prompt rendering
pub mod prompt;

/// Summarization port and HTTP backend
pub mod summarize;

/// Shared data model
pub mod types;

pub use client::{DigestClient, PlanReport, PreparedRelease, ReleaseDigest};
pub use config::Config;
pub use error::{DigestError, TagError};
pub use git::{
    CommitChunker, DiffOptions, GitWalker, VcsQuery, build_commit_records, extract_commit_range,
    plan_chunks, resolve_previous_tag,
};
pub use notice::{Notice, NoticeSink};
pub use pipeline::{DigestOutcome, PipelineOptions, ReleaseInput, SummaryMode, run_staged_summarization};
pub use prompt::render_prompt;
pub use summarize::{ModelResponse, Summarizer};
pub use types::{Chunk, CommitRecord, PreviousTag, StagedSummary, Tag};
