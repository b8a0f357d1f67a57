//! Recovery Manager: a single bounded attempt to unstick the editor surface.
//!
//! Grounded on `codex-rs/core::safety`'s escalation ladder (try
//! the cheapest fix first, only escalate once the cheaper one is confirmed
//! not to have worked) generalized to four ordered steps: dismiss a known
//! dialog, press Escape, force-hide overlays, and re-resolve the editor
//! frame. Callers (Block Inserter, Draft Saver) own the "at most N rounds
//! per stage" budget; this function always performs exactly one round.

use std::time::Duration;

use autoblog_driver::Driver;
use autoblog_driver::FrameHandle;
use autoblog_driver::Key;
use autoblog_driver::Result;
use autoblog_driver::SelectorFamily;

const DISMISS_TEXT_PATTERNS: &[&str] = &["confirm", "ok", "close", "dismiss"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStep {
    DismissedDialog,
    PressedEscape,
    HidOverlay,
    ReacquiredFrame,
}

#[derive(Debug, Clone)]
pub struct RecoveryOutcome {
    pub step: RecoveryStep,
    /// Populated only when the step re-resolved the editor frame; callers
    /// must swap their cached `FrameHandle` for this one.
    pub new_frame: Option<FrameHandle>,
}

/// Runs the four recovery steps in order, stopping at the first one that
/// makes progress: dismiss a known dialog/popup, press Escape, force-hide
/// overlays via style mutation, or re-resolve the editor frame and refocus.
pub async fn recover(driver: &dyn Driver, frame: &FrameHandle, timeout: Duration) -> Result<RecoveryOutcome> {
    if driver.is_family_visible(frame, SelectorFamily::Overlay).await? {
        if driver
            .click_by_selector_list(frame, SelectorFamily::ConfirmDialogButton, timeout)
            .await
            .is_ok()
        {
            return Ok(RecoveryOutcome {
                step: RecoveryStep::DismissedDialog,
                new_frame: None,
            });
        }
        for pattern in DISMISS_TEXT_PATTERNS {
            if driver.click_by_visible_text(frame, pattern, timeout).await.is_ok() {
                return Ok(RecoveryOutcome {
                    step: RecoveryStep::DismissedDialog,
                    new_frame: None,
                });
            }
        }
    }

    if driver.press_key(frame, Key::Escape, timeout).await.is_ok()
        && !driver.is_family_visible(frame, SelectorFamily::Overlay).await?
    {
        return Ok(RecoveryOutcome {
            step: RecoveryStep::PressedEscape,
            new_frame: None,
        });
    }

    if driver.is_family_visible(frame, SelectorFamily::Overlay).await? {
        driver.force_hide_overlays(frame).await?;
        return Ok(RecoveryOutcome {
            step: RecoveryStep::HidOverlay,
            new_frame: None,
        });
    }

    let new_frame = driver.reacquire_editor_frame(timeout).await?;
    driver.focus_body_end(&new_frame).await?;
    Ok(RecoveryOutcome {
        step: RecoveryStep::ReacquiredFrame,
        new_frame: Some(new_frame),
    })
}
