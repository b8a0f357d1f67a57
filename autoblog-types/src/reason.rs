use serde::Deserialize;
use serde::Serialize;

/// Closed-ish set of typed reason codes surfaced by the core. Mirrors the
/// string enum vocabulary fixed by `spec.md` so debug artifacts, step
/// records and terminal errors all agree on spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    // Driver Facade
    EditorIframeNotFound,
    OperationTimeout,
    SessionBlocked,

    // Block Inserter — text strategies
    EditorAreaNotFound,
    FocusFailed,
    InputNotReflected,
    VerificationFailedTextNotFound,
    VerificationFailedTextMismatch,
    VerificationFailedFocusLost,
    VerificationFailedFrameChanged,
    OverlayBlocking,
    StaleElement,
    ContentEncodingError,

    // Block Inserter — section-title quote wrapping
    Quote2MenuOpenFailed,
    Quote2TitleVerifyFailed,
    Quote2ExitFailed,
    Quote1Detected,
    Quote2ExitRecovered,
    Quote2ExitVerifyBypass,

    // Image Uploader
    ImageUploadUiFailed,
    ImageUploadStuck,
    ImageUploadNoInsert,
    ImageUploadDuplicated,
    ImageVerifyPostsaveFailed,

    // Post Plan / exactly-once execution
    DupByRetry,

    // Draft Saver
    DraftNotFoundAfterSuccessSignal,
    DraftSaveTimeout,

    // Idempotency
    DupRunDetected,
    RunIdMismatchRetryBlocked,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // serde's SCREAMING_SNAKE_CASE rename gives us the exact wire
        // spelling; reuse it instead of hand-duplicating the match arms.
        let json = serde_json::to_string(self).unwrap_or_default();
        f.write_str(json.trim_matches('"'))
    }
}
