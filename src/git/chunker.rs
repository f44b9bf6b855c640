use crate::git::diff::truncate_line;
use crate::notice::{Notice, NoticeSink, ReductionStep};
use crate::prompt::{batch_header_allowance, char_len, commit_block_len};
use crate::types::{Chunk, CommitRecord, PreviousTag};

/// Characters held back from every stage for headers and instructions
pub const STAGE_OVERHEAD_RESERVE: usize = 2000;

/// Smallest message length the first reduction step cuts to
const MESSAGE_FLOOR: usize = 200;

/// Smallest message length the last reduction step cuts to
const MESSAGE_HARD_FLOOR: usize = 80;

/// Shrink a record whose block alone exceeds `budget`
///
/// Steps run in a fixed order and each runs at most once, so the reduction
/// always terminates. The result can still exceed the budget when even the
/// floored, diff-less block is too large.
fn reduce_record(record: &CommitRecord, budget: usize, sink: &dyn NoticeSink) -> CommitRecord {
    let mut reduced = record.clone();
    let notify = |step: ReductionStep| {
        sink.notice(Notice::CommitReduced {
            sha: record.sha.clone(),
            step,
        })
    };

    let message_cap = (budget / 4).max(MESSAGE_FLOOR);
    if char_len(&reduced.message) > message_cap {
        reduced = reduced.with_message(truncate_line(&reduced.message, message_cap));
        notify(ReductionStep::MessageTruncated);
    }
    if commit_block_len(&reduced) <= budget {
        return reduced;
    }

    let original_lines = reduced.diff_lines.len();
    let mut keep = original_lines;
    while keep > 0 && commit_block_len(&reduced) > budget {
        keep -= 1;
        reduced = reduced.with_diff_prefix(keep);
    }
    if keep < original_lines {
        if keep == 0 {
            notify(ReductionStep::AllDiffDropped);
        } else {
            notify(ReductionStep::DiffLinesDropped(original_lines - keep));
        }
    }
    if commit_block_len(&reduced) <= budget {
        return reduced;
    }

    let without_message = commit_block_len(&reduced.with_message(String::new()));
    let target = budget
        .saturating_sub(without_message)
        .max(MESSAGE_HARD_FLOOR);
    if char_len(&reduced.message) > target {
        reduced = reduced.with_message(truncate_line(&reduced.message, target));
        notify(ReductionStep::MessageFloor);
    }
    reduced
}

/// Partition records into ordered chunks whose blocks total at most `budget` characters
///
/// Records are packed greedily in order. A record that cannot fit even after
/// reduction is placed alone in its own chunk.
pub fn plan_chunks(records: &[CommitRecord], budget: usize, sink: &dyn NoticeSink) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Chunk {
        records: Vec::new(),
        size: 0,
    };

    for record in records {
        let mut size = commit_block_len(record);
        let record = if size > budget {
            let reduced = reduce_record(record, budget, sink);
            size = commit_block_len(&reduced);
            if size > budget {
                tracing::warn!(
                    "Commit {} still needs {} chars against a budget of {}",
                    reduced.short_sha(),
                    size,
                    budget
                );
            }
            reduced
        } else {
            record.clone()
        };

        if !current.is_empty() && current.size + size > budget {
            chunks.push(std::mem::replace(
                &mut current,
                Chunk {
                    records: Vec::new(),
                    size: 0,
                },
            ));
        }
        current.records.push(record);
        current.size += size;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    tracing::debug!(
        "Planned {} chunks for {} commits (budget {} chars)",
        chunks.len(),
        records.len(),
        budget
    );
    chunks
}

/// Plans batch stages so every batch prompt stays within the stage budget
#[derive(Debug, Clone, Copy)]
pub struct CommitChunker {
    max_stage_chars: usize,
    reserve: usize,
}

impl CommitChunker {
    /// Create a chunker with the default overhead reserve
    pub fn new(max_stage_chars: usize) -> Self {
        Self::with_reserve(max_stage_chars, STAGE_OVERHEAD_RESERVE)
    }

    /// Create with a custom overhead reserve
    pub fn with_reserve(max_stage_chars: usize, reserve: usize) -> Self {
        Self {
            max_stage_chars,
            reserve,
        }
    }

    /// Budget for a batch prompt: stage size minus the reserve
    pub fn batch_prompt_budget(&self) -> usize {
        self.max_stage_chars.saturating_sub(self.reserve)
    }

    /// Budget left for commit blocks once the batch header is accounted for
    pub fn block_budget(&self, current: &str, previous: &PreviousTag, commits: usize) -> usize {
        self.batch_prompt_budget()
            .saturating_sub(batch_header_allowance(current, previous, commits))
    }

    /// Plan the batch chunks for a release
    pub fn plan(
        &self,
        current: &str,
        previous: &PreviousTag,
        records: &[CommitRecord],
        sink: &dyn NoticeSink,
    ) -> Vec<Chunk> {
        let budget = self.block_budget(current, previous, records.len());
        plan_chunks(records, budget, sink)
    }
}

impl Default for CommitChunker {
    fn default() -> Self {
        Self::new(400_000)
    }
}
