//! Signal Detector and composite-signal waiter.
//!
//! `detect` takes one point-in-time [`SignalSnapshot`]; composing snapshots
//! into a decision (including the cross-snapshot `spinnerCycleDone`
//! auxiliary signal) is the `Waiter`'s job, keeping the detector itself
//! stateless. Polling shape is grounded on `codex-rs/core::exec`'s "race
//! work future against a timeout future" discipline, generalized to a
//! fixed-interval poll since the editor exposes no native "operation
//! complete" event of its own.

use std::time::Duration;
use std::time::Instant;

use autoblog_driver::Driver;
use autoblog_driver::FrameHandle;
use autoblog_driver::SelectorFamily;
use autoblog_types::BlockedReason;
use autoblog_types::SignalSnapshot;
use regex_lite::Regex;

const SUCCESS_TOAST_PATTERNS: &[&str] = &["temp save complete", "auto-saved", "autosaved", "saved"];

#[allow(clippy::expect_used)]
fn success_status_regex() -> Regex {
    Regex::new(r"(?i)(temp\s*save\s*complete|auto-?saved?|saved|저장|완료)").expect("static pattern")
}

/// One point-in-time probe of the editor surface. Never blocks longer than
/// the underlying driver calls it composes.
pub async fn detect(
    driver: &dyn Driver,
    frame: &FrameHandle,
    baseline_status: Option<&str>,
) -> autoblog_driver::Result<SignalSnapshot> {
    let toast_text = driver
        .find_visible_text(frame, SelectorFamily::Toast, SUCCESS_TOAST_PATTERNS)
        .await?;
    let spinner = driver.is_family_visible(frame, SelectorFamily::Spinner).await?;
    let overlay_present = driver.is_family_visible(frame, SelectorFamily::Overlay).await?;
    let status_text = driver.read_status_text(frame).await?;
    let session_blocked = driver.session_blocked_probe().await?.is_some();

    let status_changed = match &status_text {
        Some(s) => success_status_regex().is_match(s) && Some(s.as_str()) != baseline_status,
        None => false,
    };

    Ok(SignalSnapshot {
        toast: toast_text.is_some(),
        spinner,
        status_changed,
        overlay_present,
        session_blocked,
        status_text,
    })
}

#[derive(Debug)]
pub enum WaitError {
    TimedOut,
    SessionBlocked(BlockedReason),
    Driver(autoblog_driver::DriverError),
}

impl From<autoblog_driver::DriverError> for WaitError {
    fn from(value: autoblog_driver::DriverError) -> Self {
        WaitError::Driver(value)
    }
}

#[derive(Debug, Clone)]
pub struct CompositeOutcome {
    pub via: &'static str,
    pub snapshot: SignalSnapshot,
    pub elapsed: Duration,
}

/// Polls `detect` at a fixed interval until `predicate` reports a match, the
/// time budget is exhausted, or a session block is observed. `predicate`
/// receives the latest snapshot plus whether a spinner visible->hidden
/// transition happened since the last poll (`spinnerCycleDone`).
pub struct Waiter {
    poll_interval: Duration,
}

impl Waiter {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub async fn wait(
        &self,
        driver: &dyn Driver,
        frame: &FrameHandle,
        budget: Duration,
        baseline_status: Option<&str>,
        mut predicate: impl FnMut(&SignalSnapshot, bool) -> Option<&'static str>,
    ) -> Result<CompositeOutcome, WaitError> {
        let start = Instant::now();
        let mut spinner_seen = false;

        loop {
            let snapshot = detect(driver, frame, baseline_status).await?;

            if snapshot.session_blocked {
                let reason = driver
                    .session_blocked_probe()
                    .await?
                    .unwrap_or(BlockedReason::SessionExpired);
                return Err(WaitError::SessionBlocked(reason));
            }

            let spinner_cycle_done = spinner_seen && !snapshot.spinner;
            if snapshot.spinner {
                spinner_seen = true;
            } else if spinner_cycle_done {
                spinner_seen = false;
            }

            if let Some(via) = predicate(&snapshot, spinner_cycle_done) {
                return Ok(CompositeOutcome {
                    via,
                    snapshot,
                    elapsed: start.elapsed(),
                });
            }

            if start.elapsed() >= budget {
                return Err(WaitError::TimedOut);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_regex_matches_known_phrases() {
        let re = success_status_regex();
        assert!(re.is_match("Temp Save Complete"));
        assert!(re.is_match("Auto-saved"));
        assert!(re.is_match("저장 완료"));
        assert!(!re.is_match("network error"));
    }
}
