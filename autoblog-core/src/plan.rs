//! Post Plan: builds the immutable [`PostPlan`] from parsed source content
//! and resolved image paths, and drives exactly-once block insertion against
//! a per-run [`PostPlanState`].
//!
//! Grounded on `codex-rs/core::conversation_history` (an
//! append-only, content-addressed record the rest of the core treats as
//! read-only) for the immutable-plan half, and on its submission-queue
//! dedupe-by-id discipline for `execute_exactly_once`.

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::path::PathBuf;

use autoblog_types::BlockId;
use autoblog_types::BlockPayload;
use autoblog_types::ImageIdentity;
use autoblog_types::PlanBlock;
use autoblog_types::PostPlan;
use sha1::Digest;
use sha1::Sha1;

use crate::error::Result;
use crate::normalize::normalize_text;

/// Placeholder body text prepended when a plan would otherwise contain only
/// image blocks; the editor refuses to save an empty document.
const STUB_TEXT: &str = ".";

#[derive(Debug, Clone)]
pub enum ParsedBlock {
    Text(String),
    SectionTitle(String),
    Image { path: PathBuf, image_index: u32 },
}

pub fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hashes an image's absolute path the same way for every caller, so
/// [`crate::plan`] and the Image Uploader's baseline bookkeeping never
/// disagree on an [`ImageIdentity`].
pub fn hash_path(path: &Path) -> String {
    sha1_hex(&path.to_string_lossy())
}

fn image_identity(path: &Path, image_index: u32) -> ImageIdentity {
    ImageIdentity(format!("image:{image_index}:{}", hash_path(path)))
}

/// Stable per-logical-job key: the same `(accountId, editorUrl)` pair always
/// hashes to the same key, independent of `runId`, so retries of the same
/// job contend on the same idempotency lock.
pub fn job_key(account_id: &str, editor_url: &str) -> String {
    sha1_hex(&format!("{account_id}|{editor_url}"))
}

/// Content hash of a built plan, derived from its ordered `blockId`s. Two
/// plans built from identical source content hash identically, since
/// `blockId` is itself content-addressed.
pub fn content_hash(plan: &PostPlan) -> String {
    let joined = plan
        .blocks()
        .iter()
        .map(|b| b.block_id.0.as_str())
        .collect::<Vec<_>>()
        .join("|");
    sha1_hex(&joined)
}

/// Builds the immutable plan. If `parsed` contains no text or section-title
/// block, a synthetic stub text block is prepended at source index 0 and
/// every other block's source index shifts by one.
pub fn build_plan(parsed: Vec<ParsedBlock>) -> PostPlan {
    let has_prose = parsed
        .iter()
        .any(|b| matches!(b, ParsedBlock::Text(_) | ParsedBlock::SectionTitle(_)));

    let mut blocks = Vec::with_capacity(parsed.len() + 1);
    let mut source_index = 0usize;

    if !has_prose && parsed.iter().any(|b| matches!(b, ParsedBlock::Image { .. })) {
        blocks.push(build_text_block(source_index, STUB_TEXT.to_string(), false));
        source_index += 1;
    }

    for block in parsed {
        match block {
            ParsedBlock::Text(text) => {
                blocks.push(build_text_block(source_index, text, false));
            }
            ParsedBlock::SectionTitle(text) => {
                blocks.push(build_text_block(source_index, text, true));
            }
            ParsedBlock::Image { path, image_index } => {
                blocks.push(build_image_block(source_index, path, image_index));
            }
        }
        source_index += 1;
    }

    PostPlan::from_blocks(blocks)
}

fn build_text_block(source_index: usize, raw: String, is_title: bool) -> PlanBlock {
    let normalized = normalize_text(&raw);
    let hash = sha1_hex(&normalized);
    let kind_tag = if is_title { "section_title" } else { "text" };
    let payload = if is_title {
        BlockPayload::SectionTitle { normalized }
    } else {
        BlockPayload::Text { normalized }
    };
    PlanBlock {
        block_id: BlockId(format!("{kind_tag}:{source_index}:{hash}")),
        source_index,
        payload,
    }
}

fn build_image_block(source_index: usize, path: PathBuf, image_index: u32) -> PlanBlock {
    let identity = image_identity(&path, image_index);
    let hash = sha1_hex(&identity.0);
    PlanBlock {
        block_id: BlockId(format!("image:{source_index}:{hash}")),
        source_index,
        payload: BlockPayload::Image { path, image_index },
    }
}

/// Mutable per-run bookkeeping: which blocks and which image identities have
/// already been observed inserted. Never reduced within a run.
#[derive(Debug, Default, Clone)]
pub struct PostPlanState {
    inserted_block_ids: HashSet<BlockId>,
    inserted_image_ids: HashSet<ImageIdentity>,
}

impl PostPlanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_inserted(&self, block_id: &BlockId) -> bool {
        self.inserted_block_ids.contains(block_id)
    }

    pub fn mark_inserted(&mut self, block_id: BlockId) {
        self.inserted_block_ids.insert(block_id);
    }

    pub fn mark_image_inserted(&mut self, image_id: ImageIdentity) {
        self.inserted_image_ids.insert(image_id);
    }

    pub fn inserted_block_count(&self) -> usize {
        self.inserted_block_ids.len()
    }

    pub fn inserted_image_count(&self) -> usize {
        self.inserted_image_ids.len()
    }
}

pub fn create_state() -> PostPlanState {
    PostPlanState::new()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    Inserted,
    Deduped,
}

/// Iterates `plan` in order, invoking `runner` once per block whose
/// `blockId` is not already in `state`. A block already marked inserted is
/// skipped and reported as [`ExecuteOutcome::Deduped`] (the `DUP_BY_RETRY`
/// condition) without a runner invocation. On runner failure the state is
/// left untouched and the error propagates, aborting the remaining blocks.
pub async fn execute_exactly_once<F, Fut>(
    plan: &PostPlan,
    state: &mut PostPlanState,
    mut runner: F,
) -> Result<Vec<(BlockId, ExecuteOutcome)>>
where
    F: FnMut(PlanBlock) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut outcomes = Vec::with_capacity(plan.len());
    for block in plan.blocks() {
        if state.is_inserted(&block.block_id) {
            tracing::info!(block_id = %block.block_id, "DUP_BY_RETRY");
            outcomes.push((block.block_id.clone(), ExecuteOutcome::Deduped));
            continue;
        }
        runner(block.clone()).await?;
        state.mark_inserted(block.block_id.clone());
        if let Some(image_id) = block.image_identity(hash_path) {
            state.mark_image_inserted(image_id);
        }
        outcomes.push((block.block_id.clone(), ExecuteOutcome::Inserted));
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn stub_block_prepended_for_image_only_plans() {
        let plan = build_plan(vec![ParsedBlock::Image {
            path: PathBuf::from("/tmp/a.jpg"),
            image_index: 1,
        }]);
        assert_eq!(plan.len(), 2);
        assert!(matches!(plan.blocks()[0].payload, BlockPayload::Text { .. }));
        assert!(matches!(plan.blocks()[1].payload, BlockPayload::Image { .. }));
    }

    #[test]
    fn no_stub_when_prose_present() {
        let plan = build_plan(vec![
            ParsedBlock::Text("hello".to_string()),
            ParsedBlock::Image {
                path: PathBuf::from("/tmp/a.jpg"),
                image_index: 1,
            },
        ]);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn identical_source_yields_identical_block_ids() {
        let make = || {
            build_plan(vec![
                ParsedBlock::Text("same text".to_string()),
                ParsedBlock::Image {
                    path: PathBuf::from("/tmp/a.jpg"),
                    image_index: 1,
                },
            ])
        };
        let a = make();
        let b = make();
        let ids_a: Vec<_> = a.blocks().iter().map(|blk| blk.block_id.clone()).collect();
        let ids_b: Vec<_> = b.blocks().iter().map(|blk| blk.block_id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[tokio::test]
    async fn execute_exactly_once_skips_already_inserted_blocks() {
        let plan = build_plan(vec![
            ParsedBlock::Text("one".to_string()),
            ParsedBlock::Text("two".to_string()),
        ]);
        let mut state = create_state();
        let mut calls = 0;
        execute_exactly_once(&plan, &mut state, |_block| {
            calls += 1;
            async { Ok(()) }
        })
        .await
        .unwrap();
        assert_eq!(calls, 2);

        // Re-running against the same state must not invoke the runner again.
        let mut calls_second_pass = 0;
        let outcomes = execute_exactly_once(&plan, &mut state, |_block| {
            calls_second_pass += 1;
            async { Ok(()) }
        })
        .await
        .unwrap();
        assert_eq!(calls_second_pass, 0);
        assert!(outcomes
            .iter()
            .all(|(_, outcome)| *outcome == ExecuteOutcome::Deduped));
    }

    #[test]
    fn job_key_is_stable_and_distinguishes_accounts() {
        let a = job_key("acct-1", "https://blog.example.test/PostWriteForm.naver");
        let b = job_key("acct-1", "https://blog.example.test/PostWriteForm.naver");
        let c = job_key("acct-2", "https://blog.example.test/PostWriteForm.naver");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn content_hash_changes_with_plan_content() {
        let a = build_plan(vec![ParsedBlock::Text("one".to_string())]);
        let b = build_plan(vec![ParsedBlock::Text("two".to_string())]);
        assert_ne!(content_hash(&a), content_hash(&b));
        assert_eq!(content_hash(&a), content_hash(&build_plan(vec![ParsedBlock::Text("one".to_string())])));
    }

    #[tokio::test]
    async fn failed_runner_leaves_state_untouched() {
        let plan = build_plan(vec![ParsedBlock::Text("one".to_string())]);
        let mut state = create_state();
        let result = execute_exactly_once(&plan, &mut state, |_block| async {
            Err(crate::error::PosterErr::DupRunDetected)
        })
        .await;
        assert!(result.is_err());
        assert_eq!(state.inserted_block_count(), 0);
    }
}
