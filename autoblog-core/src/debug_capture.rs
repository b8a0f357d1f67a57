//! Bounded debug artifact capture, triggered on stage failure/timeout.
//!
//! Grounded on `codex-rs/core::rollout`'s session-artifact
//! writer (lazily create a dated directory, write a handful of named files,
//! never let the write itself become the failure). Capture is always
//! wrapped in a short timeout by the caller so a stuck page cannot also
//! block the failure path.

use std::path::PathBuf;

use autoblog_driver::Driver;
use autoblog_driver::FrameHandle;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

pub const CAPTURE_BUDGET: std::time::Duration = std::time::Duration::from_secs(8);

#[derive(Debug, Clone, Serialize)]
pub struct TimeoutReport {
    pub stage: String,
    pub message: String,
    pub data: Option<Value>,
}

/// A captured failure's artifact directory, once written.
#[derive(Debug, Clone)]
pub struct CapturedArtifacts {
    pub dir: PathBuf,
}

fn bucket_dir(root: &std::path::Path, request_id: &str) -> PathBuf {
    let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    root.join(date).join(request_id)
}

/// Writes `timeout_report.json`, a full-page screenshot, an HTML dump of the
/// editor frame, and the console/network/page-error traces drained from the
/// driver. Best-effort: a failure in any one artifact is logged and does not
/// abort the remaining writes.
pub async fn capture(
    driver: &dyn Driver,
    frame: &FrameHandle,
    root: &std::path::Path,
    request_id: &str,
    report: &TimeoutReport,
) -> Result<CapturedArtifacts> {
    let dir = bucket_dir(root, request_id);
    std::fs::create_dir_all(&dir)?;

    if let Err(err) = std::fs::write(dir.join("timeout_report.json"), serde_json::to_vec_pretty(report)?) {
        tracing::warn!(?err, "failed to write timeout_report.json");
    }

    match driver.screenshot().await {
        Ok(bytes) => {
            if let Err(err) = std::fs::write(dir.join("screenshot.png"), bytes) {
                tracing::warn!(?err, "failed to write screenshot.png");
            }
        }
        Err(err) => tracing::warn!(?err, "screenshot capture failed"),
    }

    match driver.html_snapshot(frame).await {
        Ok(html) => {
            if let Err(err) = std::fs::write(dir.join("editor_frame.html"), html) {
                tracing::warn!(?err, "failed to write editor_frame.html");
            }
        }
        Err(err) => tracing::warn!(?err, "html snapshot capture failed"),
    }

    let events = driver.drain_events().await;
    write_json(&dir.join("console.json"), &events.console);
    write_json(&dir.join("page_errors.json"), &events.page_errors);
    write_json(
        &dir.join("network.json"),
        &events
            .responses
            .iter()
            .map(|r| serde_json::json!({"url": r.url, "status": r.status}))
            .collect::<Vec<_>>(),
    );

    Ok(CapturedArtifacts { dir })
}

fn write_json<T: Serialize>(path: &std::path::Path, value: &T) {
    if let Ok(bytes) = serde_json::to_vec_pretty(value) {
        if let Err(err) = std::fs::write(path, bytes) {
            tracing::warn!(?err, path = %path.display(), "failed to write debug artifact");
        }
    }
}

/// `debug_fixture.json` written specifically for text-input verification
/// failures: the block's plan, the anchors extracted from it, and a sample
/// of what the editor actually contained.
#[derive(Debug, Clone, Serialize)]
pub struct TextFixture {
    pub block_id: String,
    pub expected_normalized: String,
    pub anchors: crate::normalize::Anchors,
    pub observed_sample: String,
}

pub fn write_text_fixture(root: &std::path::Path, request_id: &str, fixture: &TextFixture) -> Result<PathBuf> {
    let dir = bucket_dir(root, request_id);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("debug_fixture.json");
    std::fs::write(&path, serde_json::to_vec_pretty(fixture)?)?;
    Ok(path)
}
