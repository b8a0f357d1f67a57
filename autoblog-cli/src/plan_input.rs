//! Reads the CLI's on-disk plan file into [`ParsedBlock`]s. Content
//! ingestion proper (Telegram polling, markdown parsing, image download) is
//! an external collaborator's job; this only understands the already
//! structured hand-off shape.

use std::path::Path;
use std::path::PathBuf;

use autoblog_core::plan::ParsedBlock;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PlanInputBlock {
    Text { content: String },
    SectionTitle { content: String },
    Image { path: PathBuf, image_index: u32 },
}

pub fn read_plan_file(path: &Path) -> anyhow::Result<Vec<ParsedBlock>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("failed to read plan file {}: {err}", path.display()))?;
    let blocks: Vec<PlanInputBlock> = serde_json::from_str(&raw)
        .map_err(|err| anyhow::anyhow!("failed to parse plan file {}: {err}", path.display()))?;
    Ok(blocks
        .into_iter()
        .map(|block| match block {
            PlanInputBlock::Text { content } => ParsedBlock::Text(content),
            PlanInputBlock::SectionTitle { content } => ParsedBlock::SectionTitle(content),
            PlanInputBlock::Image { path, image_index } => ParsedBlock::Image { path, image_index },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parses_mixed_block_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(
            &path,
            r#"[
                {"type": "section_title", "content": "Intro"},
                {"type": "text", "content": "Hello, world."},
                {"type": "image", "path": "/tmp/a.jpg", "image_index": 1}
            ]"#,
        )
        .unwrap();

        let blocks = read_plan_file(&path).unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0], ParsedBlock::SectionTitle(_)));
        assert!(matches!(blocks[1], ParsedBlock::Text(_)));
        assert!(matches!(blocks[2], ParsedBlock::Image { .. }));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = read_plan_file(Path::new("/nonexistent/plan.json"));
        assert!(result.is_err());
    }
}
