//! End-to-end driver for release digests
//!
//! [`DigestClient`] wires the pipeline stages together: resolve the comparison
//! tag, extract the commit range, build bounded commit records, render the
//! prompt, and either summarize it or report the plan.

use crate::config::Config;
use crate::error::DigestError;
use crate::git::chunker::CommitChunker;
use crate::git::diff::{DiffOptions, build_commit_records};
use crate::git::range::extract_commit_range;
use crate::git::tags::resolve_in_repo;
use crate::git::{GitWalker, VcsQuery};
use crate::notice::{NoticeSink, TracingSink};
use crate::pipeline::{
    DigestOutcome, PipelineOptions, ReleaseInput, SummaryMode, run_staged_summarization,
};
use crate::prompt::{char_len, render_prompt};
use crate::summarize::{OpenAiSummarizer, Summarizer};
use crate::types::{Chunk, CommitRecord, PreviousTag, short_sha};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Inputs gathered for a release, before any summarization call
#[derive(Debug, Clone)]
pub struct PreparedRelease {
    pub current: String,
    pub previous: PreviousTag,
    pub records: Vec<CommitRecord>,
    /// The single-submission prompt
    pub prompt: String,
    pub context: Option<String>,
    /// Batch plan; empty when the prompt fits one stage
    pub chunks: Vec<Chunk>,
    pub max_stage_chars: usize,
}

impl PreparedRelease {
    pub fn prompt_chars(&self) -> usize {
        char_len(&self.prompt)
    }

    pub fn needs_staging(&self) -> bool {
        self.prompt_chars() > self.max_stage_chars
    }

    pub fn release_input(&self) -> ReleaseInput<'_> {
        ReleaseInput {
            current: &self.current,
            previous: &self.previous,
            records: &self.records,
            context: self.context.as_deref(),
        }
    }

    /// Machine-readable summary of the plan
    pub fn plan_report(&self) -> PlanReport {
        PlanReport {
            current: self.current.clone(),
            previous: self.previous.clone(),
            commits: self.records.len(),
            prompt_chars: self.prompt_chars(),
            max_stage_chars: self.max_stage_chars,
            mode: if self.needs_staging() {
                SummaryMode::Staged {
                    batches: self.chunks.len(),
                }
            } else {
                SummaryMode::Direct
            },
            batches: self
                .chunks
                .iter()
                .enumerate()
                .map(|(index, chunk)| BatchReport {
                    index,
                    chars: chunk.size,
                    commits: chunk
                        .shas()
                        .into_iter()
                        .map(|sha| short_sha(sha).to_string())
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Serializable view of a prepared release
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub current: String,
    pub previous: PreviousTag,
    pub commits: usize,
    pub prompt_chars: usize,
    pub max_stage_chars: usize,
    pub mode: SummaryMode,
    pub batches: Vec<BatchReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub index: usize,
    /// Characters of commit blocks in the batch
    pub chars: usize,
    pub commits: Vec<String>,
}

/// A finished digest
#[derive(Debug, Clone)]
pub struct ReleaseDigest {
    pub current: String,
    pub previous: PreviousTag,
    pub commit_count: usize,
    pub outcome: DigestOutcome,
}

/// Main client for generating release digests
///
/// # Example
///
/// ```no_run
/// use release_digest::{Config, DigestClient};
///
/// fn main() -> anyhow::Result<()> {
///     let client = DigestClient::open(Config::new()?, ".")?;
///     let digest = client.generate("v1.2.0", None)?;
///     println!("{}", digest.outcome.text);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DigestClient {
    pub(crate) config: Arc<Config>,
    pub(crate) vcs: Arc<dyn VcsQuery>,
    pub(crate) summarizer: Option<Arc<dyn Summarizer>>,
    pub(crate) sink: Arc<dyn NoticeSink>,
}

impl DigestClient {
    /// Open the repository containing `repo_path`, logging notices through `tracing`
    ///
    /// The summarizer is created from configuration on the first
    /// [`generate`](Self::generate) call unless one is supplied.
    pub fn open(config: Config, repo_path: impl AsRef<Path>) -> Result<Self, DigestError> {
        let walker = GitWalker::discover(repo_path)?;
        Ok(Self::with_parts(
            config,
            Arc::new(walker),
            None,
            Arc::new(TracingSink),
        ))
    }

    /// Build a client from explicit collaborators
    pub fn with_parts(
        config: Config,
        vcs: Arc<dyn VcsQuery>,
        summarizer: Option<Arc<dyn Summarizer>>,
        sink: Arc<dyn NoticeSink>,
    ) -> Self {
        tracing::debug!(
            "Digest client: max_commits={}, max_diff_lines={}, max_stage_chars={}",
            config.range.max_commits,
            config.diff.max_lines,
            config.staging.max_stage_chars
        );
        Self {
            config: Arc::new(config),
            vcs,
            summarizer,
            sink,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tag resolution, range extraction and record building
    fn collect(&self, tag: &str, context: Option<&str>) -> Result<PreparedRelease, DigestError> {
        let previous = resolve_in_repo(
            self.vcs.as_ref(),
            tag,
            self.config.range.previous_tag.as_deref(),
        )?;

        let shas = extract_commit_range(
            self.vcs.as_ref(),
            &previous,
            tag,
            self.config.range.max_commits,
            self.sink.as_ref(),
        )?;

        let options = DiffOptions::from_config(&self.config.diff);
        let records = build_commit_records(self.vcs.as_ref(), &shas, &options, self.sink.as_ref())?;

        let prompt = render_prompt(tag, &previous, &records, context);

        Ok(PreparedRelease {
            current: tag.to_string(),
            previous,
            records,
            prompt,
            context: context.map(str::to_string),
            chunks: Vec::new(),
            max_stage_chars: self.config.staging.max_stage_chars,
        })
    }

    /// Gather everything for `tag` and plan batches, without calling the summarizer
    pub fn prepare(&self, tag: &str, context: Option<&str>) -> Result<PreparedRelease, DigestError> {
        let mut prepared = self.collect(tag, context)?;
        if prepared.needs_staging() {
            let chunker = CommitChunker::new(prepared.max_stage_chars);
            prepared.chunks = chunker.plan(
                &prepared.current,
                &prepared.previous,
                &prepared.records,
                self.sink.as_ref(),
            );
        }
        tracing::info!(
            "Prepared {} commits for {} ({} prompt chars, {} batches)",
            prepared.records.len(),
            tag,
            prepared.prompt_chars(),
            prepared.chunks.len()
        );
        Ok(prepared)
    }

    /// Produce the digest for `tag`
    ///
    /// Fails without partial output if any stage fails.
    pub fn generate(&self, tag: &str, context: Option<&str>) -> Result<ReleaseDigest, DigestError> {
        // Resolve the summarizer first so a missing key fails before any git work
        let summarizer: Arc<dyn Summarizer> = match &self.summarizer {
            Some(summarizer) => Arc::clone(summarizer),
            None => Arc::new(OpenAiSummarizer::from_config(&self.config.summarizer)?),
        };

        let prepared = self.collect(tag, context)?;
        let options = PipelineOptions::from_config(&self.config);
        let outcome = run_staged_summarization(
            summarizer.as_ref(),
            &prepared.release_input(),
            &options,
            self.sink.as_ref(),
        )?;

        Ok(ReleaseDigest {
            current: prepared.current,
            previous: prepared.previous,
            commit_count: prepared.records.len(),
            outcome,
        })
    }
}
