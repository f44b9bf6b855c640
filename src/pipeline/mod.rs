//! Staged summarization orchestrator
//!
//! A release whose rendered prompt fits the stage budget is summarized in one
//! call. Anything larger is split into batches by the chunk planner; each
//! batch is summarized on its own and the summaries are merged into a final
//! prompt. Any failed or empty stage aborts the whole run.

use crate::config::Config;
use crate::error::DigestError;
use crate::git::chunker::CommitChunker;
use crate::git::diff::truncate_line;
use crate::notice::{Notice, NoticeSink};
use crate::prompt::{char_len, render_batch_prompt, render_final_prompt, render_prompt};
use crate::summarize::{Summarizer, summarize_stage};
use crate::types::{CommitRecord, PreviousTag, StagedSummary};
use rayon::prelude::*;
use serde::Serialize;

/// Stage label of a single direct submission
pub const DIRECT_STAGE: &str = "direct";

/// Stage label of the merge submission
pub const FINAL_STAGE: &str = "final";

/// Label of batch stage `index` (zero-based) out of `count`
pub fn batch_stage_label(index: usize, count: usize) -> String {
    format!("batch {}/{}", index + 1, count)
}

/// Everything the pipeline summarizes for one release
#[derive(Debug, Clone, Copy)]
pub struct ReleaseInput<'a> {
    pub current: &'a str,
    pub previous: &'a PreviousTag,
    pub records: &'a [CommitRecord],
    /// Free-text context appended to the direct and final prompts
    pub context: Option<&'a str>,
}

/// Stage budget and instructions
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_stage_chars: usize,
    pub instructions: String,
    pub batch_instructions: String,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_stage_chars: config.staging.max_stage_chars,
            instructions: config.summarizer.instructions.clone(),
            batch_instructions: config.summarizer.batch_instructions.clone(),
        }
    }
}

/// How the final document was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SummaryMode {
    Direct,
    Staged { batches: usize },
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct DigestOutcome {
    /// Text returned by the last stage
    pub text: String,
    pub mode: SummaryMode,
    /// Batch summaries in chunk order; empty in direct mode
    pub summaries: Vec<StagedSummary>,
}

/// Cut every summary to an equal share so the final prompt fits `budget`
fn fit_final_summaries(
    release: &ReleaseInput<'_>,
    summaries: Vec<StagedSummary>,
    budget: usize,
    sink: &dyn NoticeSink,
) -> Vec<StagedSummary> {
    let render = |summaries: &[StagedSummary]| {
        render_final_prompt(
            release.current,
            release.previous,
            release.records.len(),
            summaries,
            release.context,
        )
    };

    let original = char_len(&render(&summaries));
    if original <= budget || summaries.is_empty() {
        return summaries;
    }

    let skeleton: Vec<StagedSummary> = summaries
        .iter()
        .map(|s| StagedSummary {
            index: s.index,
            text: String::new(),
        })
        .collect();
    let overhead = char_len(&render(&skeleton));
    let share = budget.saturating_sub(overhead) / summaries.len();

    sink.notice(Notice::FinalPromptTruncated { original, budget });

    summaries
        .into_iter()
        .map(|s| StagedSummary {
            index: s.index,
            text: truncate_line(&s.text, share),
        })
        .collect()
}

/// Summarize a release, directly or in stages
pub fn run_staged_summarization(
    summarizer: &dyn Summarizer,
    release: &ReleaseInput<'_>,
    options: &PipelineOptions,
    sink: &dyn NoticeSink,
) -> Result<DigestOutcome, DigestError> {
    let prompt = render_prompt(
        release.current,
        release.previous,
        release.records,
        release.context,
    );
    let prompt_len = char_len(&prompt);

    if prompt_len <= options.max_stage_chars {
        tracing::info!(
            "Prompt is {} chars; submitting directly (budget {})",
            prompt_len,
            options.max_stage_chars
        );
        let text = summarize_stage(summarizer, DIRECT_STAGE, &prompt, &options.instructions)?;
        return Ok(DigestOutcome {
            text,
            mode: SummaryMode::Direct,
            summaries: Vec::new(),
        });
    }

    let chunker = CommitChunker::new(options.max_stage_chars);
    let chunks = chunker.plan(release.current, release.previous, release.records, sink);
    let count = chunks.len();

    tracing::info!(
        "Prompt is {} chars (budget {}); summarizing {} commits in {} batches",
        prompt_len,
        options.max_stage_chars,
        release.records.len(),
        count
    );

    let summaries = chunks
        .par_iter()
        .enumerate()
        .map(|(index, chunk)| -> Result<StagedSummary, DigestError> {
            let label = batch_stage_label(index, count);
            let prompt = render_batch_prompt(
                release.current,
                release.previous,
                index + 1,
                count,
                &chunk.records,
            );
            let text = summarize_stage(summarizer, &label, &prompt, &options.batch_instructions)?;
            tracing::debug!("Stage '{}' returned {} chars", label, char_len(&text));
            Ok(StagedSummary { index, text })
        })
        .collect::<Result<Vec<_>, DigestError>>()?;

    let summaries = fit_final_summaries(release, summaries, options.max_stage_chars, sink);
    let final_prompt = render_final_prompt(
        release.current,
        release.previous,
        release.records.len(),
        &summaries,
        release.context,
    );
    if char_len(&final_prompt) > options.max_stage_chars {
        tracing::warn!(
            "Final prompt is {} chars, over the {} budget",
            char_len(&final_prompt),
            options.max_stage_chars
        );
    }

    let text = summarize_stage(summarizer, FINAL_STAGE, &final_prompt, &options.instructions)?;
    Ok(DigestOutcome {
        text,
        mode: SummaryMode::Staged { batches: count },
        summaries,
    })
}
