//! Image Uploader: attaches one image at a time and reconciles observed
//! editor image count against expectation.
//!
//! Grounded on `codex-rs/core::exec`'s retry-with-backoff
//! pattern (bounded attempts, only transient failures retry) generalized to
//! a four-way outcome classification: success, a UI failure, a stuck
//! attempt with no observable change, and a duplicated insert.

use std::time::Duration;

use autoblog_driver::Driver;
use autoblog_driver::FrameHandle;
use autoblog_driver::ImageAttachment;
use autoblog_driver::SelectorFamily;
use autoblog_types::ReasonCode;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::PosterErr;
use crate::error::Result;
use crate::signal::Waiter;
use crate::util::image_upload_backoff;

const UPLOAD_URL_HINT: &str = "upload";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAttemptClassification {
    Success,
    UiFailed,
    Stuck,
    NoInsert,
    Duplicated,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageAttemptRecord {
    pub attempt: u32,
    pub classification: ImageAttemptClassification,
}

#[derive(Debug, Clone)]
pub struct ImageUploadOutcome {
    pub attempts: Vec<ImageAttemptRecord>,
    pub editor_image_count_after: u32,
}

/// Runs the full per-image retry loop for one attachment. `baseline_before`
/// is the editor image count observed before this attachment's first try
/// (used only for logging; the per-attempt delta is what classifies).
pub async fn upload_image(
    driver: &dyn Driver,
    frame: &FrameHandle,
    attachment: &ImageAttachment,
    config: &RunConfig,
    _baseline_before: u32,
) -> Result<ImageUploadOutcome> {
    let mut attempts = Vec::new();
    let mut last_count = driver.editor_image_count(frame).await?;

    for attempt in 1..=config.max_image_upload_attempts {
        if let Some(forced) = &config.simulate_image_failure {
            let forced_reason = parse_simulated_reason(forced);
            attempts.push(ImageAttemptRecord {
                attempt,
                classification: ImageAttemptClassification::UiFailed,
            });
            return Err(PosterErr::ImageUploadTerminal { reason: forced_reason });
        }

        let count_before = driver.editor_image_count(frame).await?;

        if let Err(reason) = trigger_upload(driver, frame, attachment, config.stage_hard_timeout).await {
            attempts.push(ImageAttemptRecord {
                attempt,
                classification: ImageAttemptClassification::UiFailed,
            });
            return Err(PosterErr::ImageUploadTerminal { reason });
        }

        let waiter = Waiter::new(Duration::from_millis(300));
        let wait_result = waiter
            .wait(driver, frame, config.image_upload_timeout, None, |snapshot, spinner_cycle_done| {
                if snapshot.toast || spinner_cycle_done {
                    Some("toast_or_spinner_cycle")
                } else {
                    None
                }
            })
            .await;

        let events = driver.drain_events().await;
        let network_2xx = events
            .responses
            .iter()
            .any(|r| r.url.contains(UPLOAD_URL_HINT) && (200..300).contains(&r.status));

        let count_after = driver.editor_image_count(frame).await?;
        let delta = count_after.saturating_sub(count_before);

        let classification = classify_attempt(wait_result.is_ok(), network_2xx, delta);
        attempts.push(ImageAttemptRecord {
            attempt,
            classification,
        });
        last_count = count_after;

        match classification {
            ImageAttemptClassification::Success => {
                let _ = driver.click_by_selector_list(frame, SelectorFamily::ConfirmDialogButton, Duration::from_secs(2)).await;
                return Ok(ImageUploadOutcome {
                    attempts,
                    editor_image_count_after: last_count,
                });
            }
            ImageAttemptClassification::Stuck => {
                if attempt < config.max_image_upload_attempts {
                    tokio::time::sleep(image_upload_backoff(attempt)).await;
                    continue;
                }
                return Err(PosterErr::ImageUploadTerminal {
                    reason: ReasonCode::ImageUploadStuck,
                });
            }
            ImageAttemptClassification::NoInsert => {
                return Err(PosterErr::ImageUploadTerminal {
                    reason: ReasonCode::ImageUploadNoInsert,
                });
            }
            ImageAttemptClassification::Duplicated => {
                return Err(PosterErr::ImageUploadTerminal {
                    reason: ReasonCode::ImageUploadDuplicated,
                });
            }
            ImageAttemptClassification::UiFailed => unreachable!("UI failures return earlier"),
        }
    }

    Err(PosterErr::ImageUploadTerminal {
        reason: ReasonCode::ImageUploadStuck,
    })
}

fn classify_attempt(signal_ok: bool, network_2xx: bool, delta: u32) -> ImageAttemptClassification {
    if delta > 1 {
        return ImageAttemptClassification::Duplicated;
    }
    match (signal_ok, network_2xx, delta) {
        (_, _, 1) if signal_ok || network_2xx => ImageAttemptClassification::Success,
        (false, true, 0) => ImageAttemptClassification::NoInsert,
        (false, false, 0) => ImageAttemptClassification::Stuck,
        _ => ImageAttemptClassification::Stuck,
    }
}

async fn trigger_upload(
    driver: &dyn Driver,
    frame: &FrameHandle,
    attachment: &ImageAttachment,
    timeout: Duration,
) -> std::result::Result<(), ReasonCode> {
    let clicked = driver
        .click_by_visible_text(frame, "from PC", timeout)
        .await
        .is_ok()
        || driver
            .click_by_selector_list(frame, SelectorFamily::ImageInsertButton, timeout)
            .await
            .is_ok();
    if !clicked {
        return Err(ReasonCode::ImageUploadUiFailed);
    }

    driver
        .set_file_on_chooser(frame, &attachment.path, timeout)
        .await
        .map_err(|_| ReasonCode::ImageUploadUiFailed)
}

fn parse_simulated_reason(name: &str) -> ReasonCode {
    match name {
        "IMAGE_UPLOAD_STUCK" => ReasonCode::ImageUploadStuck,
        "IMAGE_UPLOAD_NO_INSERT" => ReasonCode::ImageUploadNoInsert,
        "IMAGE_UPLOAD_DUPLICATED" => ReasonCode::ImageUploadDuplicated,
        _ => ReasonCode::ImageUploadUiFailed,
    }
}

/// Post-save verification of the image count against the plan's expected
/// count, with baseline accommodation. Returns the summary status
/// the report's `image_summary.status` takes.
pub fn reconcile_post_save(
    observed: u32,
    baseline: u32,
    expected: u32,
) -> autoblog_types::ImageSummaryStatus {
    use autoblog_types::ImageSummaryStatus as Status;

    if expected == 0 {
        return Status::NotRequested;
    }

    let adjusted = observed.saturating_sub(baseline);
    if observed == 0 {
        Status::Warning
    } else if adjusted > expected {
        Status::Partial
    } else if adjusted == expected {
        Status::Full
    } else {
        Status::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_exact_match_is_full() {
        assert_eq!(reconcile_post_save(3, 0, 3), autoblog_types::ImageSummaryStatus::Full);
    }

    #[test]
    fn reconcile_zero_observed_is_warning() {
        assert_eq!(reconcile_post_save(0, 0, 2), autoblog_types::ImageSummaryStatus::Warning);
    }

    #[test]
    fn reconcile_under_expected_is_partial() {
        assert_eq!(reconcile_post_save(1, 0, 2), autoblog_types::ImageSummaryStatus::Partial);
    }

    #[test]
    fn reconcile_not_requested_when_no_images_expected() {
        assert_eq!(reconcile_post_save(0, 0, 0), autoblog_types::ImageSummaryStatus::NotRequested);
    }

    #[test]
    fn classify_single_growth_with_signal_is_success() {
        assert_eq!(
            classify_attempt(true, false, 1),
            ImageAttemptClassification::Success
        );
    }

    #[test]
    fn classify_no_signal_no_growth_is_stuck() {
        assert_eq!(classify_attempt(false, false, 0), ImageAttemptClassification::Stuck);
    }

    #[test]
    fn classify_network_without_growth_is_no_insert() {
        assert_eq!(
            classify_attempt(false, true, 0),
            ImageAttemptClassification::NoInsert
        );
    }

    #[test]
    fn classify_growth_over_one_is_duplicated() {
        assert_eq!(
            classify_attempt(true, true, 2),
            ImageAttemptClassification::Duplicated
        );
    }
}
