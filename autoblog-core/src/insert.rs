//! Block Inserter: multi-strategy insertion of one plan block with
//! per-strategy verification.
//!
//! The three text strategies are modeled as a tagged sum type so a new
//! transport can be added without touching the verifier. Grounded on
//! `codex-rs/core::exec`'s pattern of trying a primary path and falling
//! back to an alternate on failure, here generalized to three ordered
//! fallbacks instead of one.

use std::time::Duration;

use autoblog_driver::Driver;
use autoblog_driver::DriverError;
use autoblog_driver::FrameHandle;
use autoblog_driver::ImageAttachment;
use autoblog_driver::Key;
use autoblog_driver::SelectorFamily;
use autoblog_types::BlockPayload;
use autoblog_types::PlanBlock;
use autoblog_types::ReasonCode;

use crate::config::RunConfig;
use crate::error::PosterErr;
use crate::error::Result;
use crate::image;
use crate::normalize::anchors_verify;
use crate::normalize::chunk_for_typing;
use crate::normalize::extract_anchors;
use crate::normalize::non_whitespace_len;
use crate::normalize::required_growth;
use crate::recovery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Keyboard,
    DirectInsert,
    Paste,
}

const TEXT_STRATEGIES: [Strategy; 3] = [Strategy::Keyboard, Strategy::DirectInsert, Strategy::Paste];

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub strategy: Strategy,
    pub reason_code: ReasonCode,
}

#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub strategy_used: Option<Strategy>,
    pub attempts: Vec<AttemptRecord>,
}

/// Inserts one block. Image blocks delegate to [`crate::image::upload_image`]
/// then separate subsequent content with a trailing Enter.
pub async fn insert_block(
    driver: &dyn Driver,
    frame: &FrameHandle,
    block: &PlanBlock,
    config: &RunConfig,
    baseline_image_count: u32,
    attempt_log: &mut Vec<image::ImageAttemptRecord>,
    request_id: &str,
) -> Result<InsertOutcome> {
    match &block.payload {
        BlockPayload::Text { normalized } => {
            insert_text_block(driver, frame, normalized, config, &block.block_id.0, request_id).await
        }
        BlockPayload::SectionTitle { normalized } => {
            insert_section_title(driver, frame, normalized, config).await
        }
        BlockPayload::Image { path, image_index } => {
            let attachment = ImageAttachment {
                path: path.clone(),
                image_index: *image_index,
            };
            let outcome = image::upload_image(driver, frame, &attachment, config, baseline_image_count).await?;
            attempt_log.extend(outcome.attempts.clone());
            driver.focus_body_end(frame).await?;
            let _ = driver.press_key(frame, Key::Enter, config.stage_hard_timeout).await;
            Ok(InsertOutcome {
                strategy_used: None,
                attempts: Vec::new(),
            })
        }
    }
}

async fn insert_text_block(
    driver: &dyn Driver,
    frame: &FrameHandle,
    normalized: &str,
    config: &RunConfig,
    block_id: &str,
    request_id: &str,
) -> Result<InsertOutcome> {
    let anchors = extract_anchors(normalized);
    let expected_len = normalized.chars().count();
    let required = required_growth(non_whitespace_len(normalized));
    let timeout = config.stage_hard_timeout;

    let mut attempts = Vec::new();
    let mut last_observed = String::new();

    for strategy in TEXT_STRATEGIES {
        let before = match driver.read_body_text(frame).await {
            Ok(text) => non_whitespace_len(&text),
            Err(_) => 0,
        };

        if let Err(reason) = run_strategy(driver, frame, strategy, normalized, timeout).await {
            attempts.push(AttemptRecord {
                strategy,
                reason_code: reason,
            });
            let _ = recovery::recover(driver, frame, timeout).await;
            continue;
        }

        let observed = driver.read_body_text(frame).await.unwrap_or_default();
        let after = non_whitespace_len(&observed);
        let growth = after.saturating_sub(before);
        let anchors_ok = anchors_verify(&anchors, &observed, expected_len);
        last_observed = observed;

        if anchors_ok && growth >= required {
            return Ok(InsertOutcome {
                strategy_used: Some(strategy),
                attempts,
            });
        }

        let reason = if anchors_ok {
            ReasonCode::VerificationFailedTextMismatch
        } else {
            ReasonCode::VerificationFailedTextNotFound
        };
        attempts.push(AttemptRecord {
            strategy,
            reason_code: reason,
        });
        let _ = recovery::recover(driver, frame, timeout).await;
    }

    let last_reason = attempts
        .last()
        .map(|a| a.reason_code)
        .unwrap_or(ReasonCode::InputNotReflected);

    let fixture = crate::debug_capture::TextFixture {
        block_id: block_id.to_string(),
        expected_normalized: normalized.to_string(),
        anchors,
        observed_sample: last_observed.chars().take(500).collect(),
    };
    if let Err(err) = crate::debug_capture::write_text_fixture(&config.debug_artifact_root, request_id, &fixture) {
        tracing::warn!(?err, "failed to write debug_fixture.json");
    }

    Err(PosterErr::BlockInsertionExhausted { reason: last_reason })
}

async fn run_strategy(
    driver: &dyn Driver,
    frame: &FrameHandle,
    strategy: Strategy,
    normalized: &str,
    timeout: Duration,
) -> std::result::Result<(), ReasonCode> {
    let result = match strategy {
        Strategy::Keyboard => type_in_chunks(driver, frame, normalized, timeout).await,
        Strategy::DirectInsert => driver.insert_text_direct(frame, normalized, timeout).await,
        Strategy::Paste => driver.paste_text(frame, normalized, timeout).await,
    };
    result.map_err(|err| classify_driver_error(&err))
}

async fn type_in_chunks(
    driver: &dyn Driver,
    frame: &FrameHandle,
    normalized: &str,
    timeout: Duration,
) -> autoblog_driver::Result<()> {
    let chunks = chunk_for_typing(normalized);
    let count = chunks.len();
    for (idx, chunk) in chunks.into_iter().enumerate() {
        driver.type_text(frame, &chunk, timeout).await?;
        if idx + 1 < count {
            driver.press_key(frame, Key::Enter, timeout).await?;
        }
    }
    driver.press_key(frame, Key::Enter, timeout).await?;
    Ok(())
}

fn classify_driver_error(err: &DriverError) -> ReasonCode {
    match err {
        DriverError::EditorIframeNotFound => ReasonCode::EditorAreaNotFound,
        DriverError::NoMatchingElement => ReasonCode::FocusFailed,
        DriverError::OperationTimeout { .. } => ReasonCode::InputNotReflected,
        DriverError::SessionBlocked(_) => ReasonCode::VerificationFailedFrameChanged,
        DriverError::FileChooserNotTriggered => ReasonCode::InputNotReflected,
        DriverError::Transport(_) => ReasonCode::StaleElement,
    }
}

const MIN_TITLE_MATCH_LEN: usize = 10;

async fn insert_section_title(
    driver: &dyn Driver,
    frame: &FrameHandle,
    normalized_title: &str,
    config: &RunConfig,
) -> Result<InsertOutcome> {
    let timeout = config.stage_hard_timeout;

    if driver
        .click_by_selector_list(frame, SelectorFamily::QuoteMenuTrigger, timeout)
        .await
        .is_err()
    {
        let mut opened_by_text = false;
        for pattern in ["quotation", "format", "style"] {
            if driver.click_by_visible_text(frame, pattern, timeout).await.is_ok() {
                opened_by_text = true;
                break;
            }
        }
        if !opened_by_text {
            return Err(PosterErr::BlockInsertionExhausted {
                reason: ReasonCode::Quote2MenuOpenFailed,
            });
        }
    }

    // Prefer the nested (level-two) quote variant; some cursor contexts
    // (already inside a quote) only offer the unnested level-one option.
    let level_one = if driver
        .click_by_selector_list(frame, SelectorFamily::QuoteLevelTwoOption, timeout)
        .await
        .is_err()
    {
        if driver
            .click_by_selector_list(frame, SelectorFamily::QuoteLevelOneOption, timeout)
            .await
            .is_err()
        {
            return Err(PosterErr::BlockInsertionExhausted {
                reason: ReasonCode::Quote2MenuOpenFailed,
            });
        }
        tracing::info!(reason = %ReasonCode::Quote1Detected, "quote menu offered only the unnested variant");
        true
    } else {
        false
    };
    let level_family = if level_one {
        SelectorFamily::QuoteLevelOneOption
    } else {
        SelectorFamily::QuoteLevelTwoOption
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    let menu_closed = !driver.is_family_visible(frame, level_family).await.unwrap_or(false);
    if !menu_closed {
        return Err(PosterErr::BlockInsertionExhausted {
            reason: ReasonCode::Quote2MenuOpenFailed,
        });
    }

    driver
        .type_text(frame, normalized_title, timeout)
        .await
        .map_err(|_| PosterErr::BlockInsertionExhausted {
            reason: ReasonCode::Quote2TitleVerifyFailed,
        })?;

    // Scoped to the quote block's own text, not the whole document: a
    // substring match against `read_body_text` cannot tell "landed in the
    // quote" apart from "appears anywhere in the post".
    let observed = driver
        .find_visible_text(frame, SelectorFamily::QuoteBlock, &[])
        .await
        .unwrap_or(None)
        .unwrap_or_default();
    let pivot: String = normalized_title
        .chars()
        .take(MIN_TITLE_MATCH_LEN.max(normalized_title.chars().count()))
        .collect();
    if observed.is_empty() || !observed.contains(&pivot) {
        return Err(PosterErr::BlockInsertionExhausted {
            reason: ReasonCode::Quote2TitleVerifyFailed,
        });
    }

    driver.press_key(frame, Key::ArrowDown, timeout).await.ok();
    driver.press_key(frame, Key::ArrowDown, timeout).await.ok();
    driver.press_key(frame, Key::Enter, timeout).await.ok();

    let exit_verified = !driver.is_family_visible(frame, level_family).await.unwrap_or(true);

    if !exit_verified {
        if config.strict_quote_escape {
            return Err(PosterErr::BlockInsertionExhausted {
                reason: ReasonCode::Quote2ExitFailed,
            });
        }
        driver.press_key(frame, Key::ArrowDown, timeout).await.ok();
        let recovered = !driver.is_family_visible(frame, level_family).await.unwrap_or(true);
        let reason = if recovered {
            ReasonCode::Quote2ExitRecovered
        } else {
            ReasonCode::Quote2ExitVerifyBypass
        };
        tracing::warn!(?reason, "non-strict quote escape verification bypass");
    }

    Ok(InsertOutcome {
        strategy_used: None,
        attempts: Vec::new(),
    })
}

/// Cheap environment check run between successful insertions: abort on a
/// session block, attempt one recovery round on an overlay, otherwise
/// continue. Returns `Ok(Some(outcome))` when a recovery round ran.
pub async fn check_environment_between_blocks(
    driver: &dyn Driver,
    frame: &FrameHandle,
    timeout: Duration,
) -> Result<Option<recovery::RecoveryOutcome>> {
    if let Some(reason) = driver.session_blocked_probe().await? {
        return Err(PosterErr::SessionBlocked(reason));
    }
    if driver.is_family_visible(frame, SelectorFamily::Overlay).await? {
        let outcome = recovery::recover(driver, frame, timeout).await?;
        return Ok(Some(outcome));
    }
    Ok(None)
}
