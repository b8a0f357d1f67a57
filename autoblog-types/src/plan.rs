use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// Content-addressed identity of a single plan block: `{type}:{sourceIndex}:{hash}`.
///
/// Stable across retries and frame reattachments; never derived from array
/// position alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one image attachment, independent of the block that carries
/// it: `image:{imageIndex}:{hash(absolutePath)}`. Used to dedupe image
/// insertions across retries even when the owning block's id would differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageIdentity(pub String);

impl fmt::Display for ImageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    SectionTitle,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockPayload {
    Text { normalized: String },
    SectionTitle { normalized: String },
    Image { path: PathBuf, image_index: u32 },
}

impl BlockPayload {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockPayload::Text { .. } => BlockKind::Text,
            BlockPayload::SectionTitle { .. } => BlockKind::SectionTitle,
            BlockPayload::Image { .. } => BlockKind::Image,
        }
    }
}

/// One atomic unit of the post: a text paragraph, a section-title, or one
/// image. Carries its own stable identity; immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanBlock {
    pub block_id: BlockId,
    pub source_index: usize,
    pub payload: BlockPayload,
}

impl PlanBlock {
    pub fn kind(&self) -> BlockKind {
        self.payload.kind()
    }

    /// The [`ImageIdentity`] of this block, if it carries an image.
    pub fn image_identity(&self, hash_path: impl Fn(&std::path::Path) -> String) -> Option<ImageIdentity> {
        match &self.payload {
            BlockPayload::Image { path, image_index } => Some(ImageIdentity(format!(
                "image:{image_index}:{}",
                hash_path(path)
            ))),
            _ => None,
        }
    }
}

/// Immutable, ordered sequence of [`PlanBlock`]s derived from parsed source
/// content plus resolved image paths. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPlan {
    blocks: Vec<PlanBlock>,
}

impl PostPlan {
    /// Only `autoblog_core::plan::build_plan` is expected to call this; it
    /// takes ownership of an already-validated, already-ordered block list.
    pub fn from_blocks(blocks: Vec<PlanBlock>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[PlanBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn image_block_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.kind() == BlockKind::Image)
            .count()
    }
}
