use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

pub const SCHEMA_VERSION: &str = "1.0";
pub const RESULT_LINE_PREFIX: &str = "NAVER_POST_RESULT_JSON:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Draft,
    Publish,
    DryRun,
}

/// Canonical names for the seven lettered report stages, decoupled from the
/// `A..G` wire keys so log lines and debug artifacts can read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepName {
    PreUploadCheck,
    TitleInsertion,
    ImageUpload,
    ReferenceCapture,
    BodyInsertion,
    Save,
    PostSaveVerification,
}

impl StepName {
    pub fn as_str(self) -> &'static str {
        match self {
            StepName::PreUploadCheck => "pre_upload_check",
            StepName::TitleInsertion => "title_insertion",
            StepName::ImageUpload => "per_image_upload",
            StepName::ReferenceCapture => "reference_capture",
            StepName::BodyInsertion => "body_insertion",
            StepName::Save => "save",
            StepName::PostSaveVerification => "post_save_verification",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Partial,
    Failed,
    Skipped,
    Warning,
}

/// Outcome of one logical stage of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub stage: String,
    pub status: StepStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl StepRecord {
    pub fn new(stage: impl Into<String>, status: StepStatus, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn skipped(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(stage, StepStatus::Skipped, message)
    }
}

/// `steps.A..G` of the report, one field per logical stage, renamed to their
/// single-letter wire keys. Letter assignment (an Open Question resolved in
/// `DESIGN.md`): A=pre-upload check, B=title insertion, C=per-image upload,
/// D=reference capture, E=body insertion, F=save, G=post-save verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Steps {
    pub a: StepRecord,
    pub b: StepRecord,
    pub c: StepRecord,
    pub d: StepRecord,
    pub e: StepRecord,
    pub f: StepRecord,
    pub g: StepRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSummaryStatus {
    NotRequested,
    Full,
    Partial,
    None,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSummary {
    pub requested_count: u32,
    pub uploaded_count: u32,
    pub missing_count: u32,
    pub editor_image_count: u32,
    pub status: ImageSummaryStatus,
    pub sample_refs: Vec<String>,
}

impl ImageSummary {
    pub fn not_requested() -> Self {
        Self {
            requested_count: 0,
            uploaded_count: 0,
            missing_count: 0,
            editor_image_count: 0,
            status: ImageSummaryStatus::NotRequested,
            sample_refs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSummary {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_via: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    SuccessFull,
    SuccessPartialImages,
    SuccessTextOnly,
    SuccessWithImageVerifyWarning,
    Failed,
}

impl OverallStatus {
    /// `overall_status` is `FAILED` iff `draft_summary.success`
    /// is false, OR strict image enforcement is on and
    /// `image_summary.status` is `partial`/`none`.
    pub fn derive(
        draft_success: bool,
        image_summary: &ImageSummary,
        strict_image_enforcement: bool,
        had_section_title_or_image_verify_warning: bool,
    ) -> Self {
        if !draft_success {
            return OverallStatus::Failed;
        }
        if strict_image_enforcement
            && matches!(
                image_summary.status,
                ImageSummaryStatus::Partial | ImageSummaryStatus::None
            )
        {
            return OverallStatus::Failed;
        }
        match image_summary.status {
            ImageSummaryStatus::NotRequested => OverallStatus::SuccessTextOnly,
            ImageSummaryStatus::Full => OverallStatus::SuccessFull,
            ImageSummaryStatus::Partial | ImageSummaryStatus::None => {
                OverallStatus::SuccessPartialImages
            }
            ImageSummaryStatus::Warning => OverallStatus::SuccessWithImageVerifyWarning,
        }
        .pipe_warning(had_section_title_or_image_verify_warning)
    }
}

trait PipeWarning {
    fn pipe_warning(self, warn: bool) -> Self;
}

impl PipeWarning for OverallStatus {
    fn pipe_warning(self, warn: bool) -> Self {
        if warn && self == OverallStatus::SuccessFull {
            OverallStatus::SuccessWithImageVerifyWarning
        } else {
            self
        }
    }
}

/// Per-run outcome emitted as a single `NAVER_POST_RESULT_JSON:` line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    pub schema_version: String,
    pub request_id: String,
    pub account_id: String,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub title: String,
    pub steps: Steps,
    pub image_summary: ImageSummary,
    pub draft_summary: DraftSummary,
    pub overall_status: OverallStatus,
}

impl UploadReport {
    /// Renders the fixed-prefix line the orchestrator prints to stdout.
    pub fn to_result_line(&self) -> serde_json::Result<String> {
        Ok(format!("{RESULT_LINE_PREFIX}{}", serde_json::to_string(self)?))
    }
}
