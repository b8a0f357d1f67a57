use autoblog_types::BlockedReason;
use autoblog_types::ReasonCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PosterErr>;

/// Diagnostics attached to a [`PosterErr::DraftSaveTimeout`]: everything the
/// Draft Saver observed across its `CLICK_SAVE -> WAIT_SAVE` rounds, enough
/// to reconstruct why the composite save signal never fired.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DraftSaveDiagnostics {
    pub observed_spinner: bool,
    pub last_status_text: Option<String>,
    pub dialog_seen: bool,
    pub recovery_count: u32,
    pub response_count: u32,
}

/// Every terminal error the core can surface. Mirrors `codex-rs`'s
/// `CodexErr` shape: explicit variants for the errors callers must
/// distinguish, transparent `#[from]` conversions for everything else.
#[derive(Debug, Error)]
pub enum PosterErr {
    #[error("driver error: {0}")]
    Driver(#[from] autoblog_driver::DriverError),

    #[error("session blocked: {0}")]
    SessionBlocked(BlockedReason),

    #[error("duplicate run detected for this job key")]
    DupRunDetected,

    #[error("retry presented a different runId/content hash than the in-flight lock")]
    RunIdMismatchRetryBlocked,

    #[error("draft save timed out: {diagnostics:?}")]
    DraftSaveTimeout { diagnostics: DraftSaveDiagnostics },

    #[error("draft not found after a save success signal")]
    DraftNotFoundAfterSuccessSignal,

    #[error("stage '{stage}' exceeded its {budget_ms}ms budget")]
    StageTimeout { stage: String, budget_ms: u64 },

    #[error("block insertion exhausted all strategies: {reason:?}")]
    BlockInsertionExhausted { reason: ReasonCode },

    #[error("image upload failed terminally: {reason:?}")]
    ImageUploadTerminal { reason: ReasonCode },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl PosterErr {
    /// A one-line message safe to surface to a user-facing channel,
    /// deliberately terser than `Display` for variants that carry large
    /// structured payloads.
    pub fn user_message(&self) -> String {
        match self {
            PosterErr::SessionBlocked(reason) => format!("session blocked: {reason}"),
            PosterErr::DraftSaveTimeout { .. } => "draft save timed out".to_string(),
            other => other.to_string(),
        }
    }

    pub fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            PosterErr::SessionBlocked(_) => Some(ReasonCode::SessionBlocked),
            PosterErr::DupRunDetected => Some(ReasonCode::DupRunDetected),
            PosterErr::RunIdMismatchRetryBlocked => Some(ReasonCode::RunIdMismatchRetryBlocked),
            PosterErr::DraftSaveTimeout { .. } => Some(ReasonCode::DraftSaveTimeout),
            PosterErr::DraftNotFoundAfterSuccessSignal => {
                Some(ReasonCode::DraftNotFoundAfterSuccessSignal)
            }
            PosterErr::BlockInsertionExhausted { reason } => Some(*reason),
            PosterErr::ImageUploadTerminal { reason } => Some(*reason),
            PosterErr::Driver(autoblog_driver::DriverError::EditorIframeNotFound) => {
                Some(ReasonCode::EditorIframeNotFound)
            }
            _ => None,
        }
    }
}
