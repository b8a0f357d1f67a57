//! Draft Saver: `INIT -> CLICK_SAVE -> WAIT_SAVE -> (RECOVERY -> WAIT_SAVE){0..N} -> DONE|FAIL`.
//!
//! Grounded on `codex-rs/core::codex`'s submission/event loop
//! (a small explicit state machine driving a foreign process, with bounded
//! retry rounds before giving up) generalized to the editor's composite
//! save signal.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use autoblog_driver::Driver;
use autoblog_driver::FrameHandle;
use autoblog_driver::Key;
use autoblog_driver::Modifier;
use autoblog_driver::SelectorFamily;
use autoblog_types::Mode;

use crate::config::RunConfig;
use crate::error::DraftSaveDiagnostics;
use crate::error::PosterErr;
use crate::error::Result;
use crate::recovery;
use crate::signal::WaitError;
use crate::signal::Waiter;

const DRAFT_SAVE_URL_HINT: [&str; 6] = ["autosave", "temp", "temporary", "draft", "save", "postwrite"];
const POLL_INTERVAL: Duration = Duration::from_millis(300);

pub type VerifyPersisted<'a> =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> + Send + Sync + 'a>;

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub verified_via: &'static str,
}

/// Drives the save state machine to completion. `verify_persisted`, when
/// given, is awaited once a success signal fires; a negative result is
/// reported as [`PosterErr::DraftNotFoundAfterSuccessSignal`] instead of
/// success.
pub async fn save_draft(
    driver: &dyn Driver,
    frame: &FrameHandle,
    config: &RunConfig,
    mode: Mode,
    verify_persisted: Option<VerifyPersisted<'_>>,
) -> Result<SaveOutcome> {
    let mut diagnostics = DraftSaveDiagnostics::default();
    let mut current_frame = frame.clone();

    for round in 0..=config.max_recovery_per_stage {
        click_save(driver, &current_frame, mode, config.draft_click_timeout).await?;

        let waiter = Waiter::new(POLL_INTERVAL);
        let wait_result = waiter
            .wait(
                driver,
                &current_frame,
                config.draft_save_signal_timeout,
                None,
                |snapshot, spinner_cycle_done| {
                    if snapshot.toast || snapshot.status_changed || spinner_cycle_done {
                        Some("toast_or_status_or_spinner")
                    } else {
                        None
                    }
                },
            )
            .await;

        let events = driver.drain_events().await;
        diagnostics.response_count += events.responses.len() as u32;
        diagnostics.dialog_seen = diagnostics.dialog_seen || !events.dialogs.is_empty();

        let network_via = events
            .responses
            .iter()
            .find(|r| DRAFT_SAVE_URL_HINT.iter().any(|hint| r.url.contains(hint)) && (200..=201).contains(&r.status))
            .map(|_| "network_2xx");

        match wait_result {
            Ok(outcome) => {
                diagnostics.observed_spinner = diagnostics.observed_spinner || outcome.snapshot.spinner;
                diagnostics.last_status_text = outcome.snapshot.status_text.clone();
                let via = network_via.unwrap_or(outcome.via);
                return finish_with_verification(verify_persisted, via).await;
            }
            Err(WaitError::SessionBlocked(reason)) => {
                return Err(PosterErr::SessionBlocked(reason));
            }
            Err(WaitError::Driver(err)) => return Err(err.into()),
            Err(WaitError::TimedOut) => {
                if let Some(via) = network_via {
                    return finish_with_verification(verify_persisted, via).await;
                }
                if round == config.max_recovery_per_stage {
                    return Err(PosterErr::DraftSaveTimeout { diagnostics });
                }
                diagnostics.recovery_count += 1;
                let recovery_outcome = recovery::recover(driver, &current_frame, config.stage_hard_timeout).await?;
                if let Some(new_frame) = recovery_outcome.new_frame {
                    current_frame = new_frame;
                }
            }
        }
    }

    Err(PosterErr::DraftSaveTimeout { diagnostics })
}

async fn finish_with_verification(
    verify_persisted: Option<VerifyPersisted<'_>>,
    via: &'static str,
) -> Result<SaveOutcome> {
    if let Some(verify) = verify_persisted {
        if !verify().await {
            return Err(PosterErr::DraftNotFoundAfterSuccessSignal);
        }
    }
    Ok(SaveOutcome { verified_via: via })
}

async fn click_save(driver: &dyn Driver, frame: &FrameHandle, mode: Mode, timeout: Duration) -> Result<()> {
    if driver.is_family_visible(frame, SelectorFamily::Overlay).await? {
        let _ = recovery::recover(driver, frame, timeout).await;
    }

    let family = if mode == Mode::Publish {
        SelectorFamily::PublishButton
    } else {
        SelectorFamily::SaveButton
    };

    if driver
        .click_by_selector_list(frame, family, timeout)
        .await
        .is_err()
    {
        // Fall back to a global save-key combination when no save control is visible.
        driver.press_key_combo(frame, &[Modifier::Ctrl], Key::S, timeout).await.ok();
    }
    Ok(())
}

/// Total wall-clock budget this Draft Saver invocation may spend, used by
/// the Orchestrator when composing its own stage race.
pub fn worst_case_budget(config: &RunConfig) -> Duration {
    let rounds = config.max_recovery_per_stage as u32 + 1;
    config.draft_click_timeout * rounds + config.draft_save_signal_timeout * rounds
}
