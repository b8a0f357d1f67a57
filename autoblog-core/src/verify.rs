//! Draft Verifier: independent re-verification that the saved draft exists
//! in the editor's own drafts list.
//!
//! Grounded on `codex-rs/core::mcp_connection_manager`'s retry
//! loop shape (bounded attempts, fixed backoff, typed failure at the end).

use std::time::Duration;

use autoblog_driver::Driver;
use autoblog_driver::FrameHandle;
use autoblog_driver::SelectorFamily;

use crate::error::Result;
use crate::util::verifier_backoff;

const MAX_ATTEMPTS: u32 = 3;
const PANEL_RENDER_DELAY: Duration = Duration::from_millis(500);
const MIN_TITLE_PIVOT_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub matched: bool,
    pub matched_via: Option<&'static str>,
}

fn normalize_for_match(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Opens the drafts panel and looks for `expected_title` (or, when present,
/// prefers a URL match keyed by `expected_draft_id`) among the panel's own
/// anchors, retrying up to three times.
pub async fn verify_draft(
    driver: &dyn Driver,
    frame: &FrameHandle,
    expected_title: &str,
    expected_draft_id: Option<&str>,
) -> Result<VerifyOutcome> {
    let normalized_expected = normalize_for_match(expected_title);
    let pivot: String = normalized_expected.chars().take(MIN_TITLE_PIVOT_LEN.max(normalized_expected.chars().count())).collect();

    for attempt in 1..=MAX_ATTEMPTS {
        driver
            .click_by_selector_list(frame, SelectorFamily::DraftsCountButton, Duration::from_secs(5))
            .await?;
        tokio::time::sleep(PANEL_RENDER_DELAY).await;

        let hrefs = driver
            .read_family_hrefs(frame, SelectorFamily::DraftsPanelLink)
            .await
            .unwrap_or_default();
        let candidates = driver
            .read_family_texts(frame, SelectorFamily::DraftsPanelLink)
            .await
            .unwrap_or_default();

        if let Some(draft_id) = expected_draft_id {
            if hrefs.iter().any(|href| href.contains(draft_id)) {
                return Ok(VerifyOutcome {
                    matched: true,
                    matched_via: Some("draft_id"),
                });
            }
        }

        for candidate in &candidates {
            let normalized_candidate = normalize_for_match(candidate);
            if normalized_candidate == normalized_expected {
                return Ok(VerifyOutcome {
                    matched: true,
                    matched_via: Some("exact_title"),
                });
            }
            if normalized_expected.chars().count() >= MIN_TITLE_PIVOT_LEN && normalized_candidate.contains(&pivot) {
                return Ok(VerifyOutcome {
                    matched: true,
                    matched_via: Some("substring_title"),
                });
            }
        }

        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(verifier_backoff()).await;
        }
    }

    Ok(VerifyOutcome {
        matched: false,
        matched_via: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_for_match("a   b\tc"), "a b c");
    }
}
