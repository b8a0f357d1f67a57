use std::time::Duration;

use rand::Rng;

/// Image-upload backoff: `700ms x 2^min(attempt-1, 4) + jitter(0..250ms)`.
/// `attempt` is 1-based. Shaped the same way as
/// `codex-rs/core/src/util.rs::backoff`, generalized to this domain's
/// specific base delay, cap and jitter range.
pub fn image_upload_backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(4);
    let base_ms = 700u64 * (1u64 << exponent);
    let jitter_ms = rand::rng().random_range(0..250);
    Duration::from_millis(base_ms + jitter_ms)
}

/// Draft Verifier backoff: a flat 600ms between the up-to-three attempts.
pub fn verifier_backoff() -> Duration {
    Duration::from_millis(600)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_then_caps() {
        let a1 = image_upload_backoff(1).as_millis();
        let a2 = image_upload_backoff(2).as_millis();
        let a5 = image_upload_backoff(5).as_millis();
        let a6 = image_upload_backoff(6).as_millis();
        assert!(a1 >= 700 && a1 < 950);
        assert!(a2 >= 1400 && a2 < 1650);
        // attempt-1 caps at 4, so attempt 5 and 6 share the same base.
        assert!(a5 >= 700 * 16 && a5 < 700 * 16 + 250);
        assert!(a6 >= 700 * 16 && a6 < 700 * 16 + 250);
    }
}
