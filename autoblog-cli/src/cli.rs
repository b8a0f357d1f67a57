use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;

#[derive(Parser, Debug)]
#[command(version, about = "Runs a single editor upload job end to end")]
pub struct Cli {
    /// Account identifier carried through into the result report.
    #[arg(long)]
    pub account_id: String,

    /// URL of the editor page to navigate to.
    #[arg(long)]
    pub editor_url: String,

    /// Post title.
    #[arg(long)]
    pub title: String,

    /// Path to a JSON plan file: an array of `{"type": "text"|"section_title", "content": "..."}`
    /// or `{"type": "image", "path": "...", "image_index": N}` objects, in insertion order.
    #[arg(long)]
    pub plan: PathBuf,

    /// Draft, publish, or a dry run that never clicks save.
    #[arg(long, value_enum, default_value_t = ModeArg::Draft)]
    pub mode: ModeArg,

    /// Previously known draft id, preferred over title matching during
    /// post-save verification.
    #[arg(long)]
    pub expected_draft_id: Option<String>,

    /// Idempotency key for this attempt. Generated if omitted; retries of
    /// the same logical job should pass the same value.
    #[arg(long)]
    pub request_id: Option<String>,

    /// CDP websocket URL of an already-authenticated browser. This CLI
    /// never performs credential login; a blocked session is terminal.
    #[arg(long, env = "POSTER_CDP_URL")]
    pub cdp_url: String,

    #[arg(long)]
    pub image_timeout_ms: Option<u64>,

    #[arg(long)]
    pub draft_save_timeout_ms: Option<u64>,

    #[arg(long)]
    pub draft_click_timeout_ms: Option<u64>,

    #[arg(long)]
    pub draft_verify_timeout_ms: Option<u64>,

    #[arg(long)]
    pub stage_timeout_ms: Option<u64>,

    #[arg(long)]
    pub strict_quote_escape: Option<bool>,

    #[arg(long)]
    pub strict_image_enforcement: Option<bool>,

    #[arg(long)]
    pub max_image_attempts: Option<u32>,

    #[arg(long)]
    pub reload_editor_ready_recovery: Option<bool>,

    #[arg(long)]
    pub max_recovery_per_stage: Option<u32>,

    #[arg(long)]
    pub lock_dir: Option<PathBuf>,

    #[arg(long)]
    pub lock_ttl_secs: Option<u64>,

    /// Directory debug artifacts (screenshot, HTML, timeout report) are
    /// written under on a FAILED run.
    #[arg(long)]
    pub debug_root: Option<PathBuf>,

    /// Test-only escape hatch: forces image upload to fail with the named
    /// reason code instead of talking to the real editor.
    #[arg(long)]
    pub simulate_image_failure: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ModeArg {
    Draft,
    Publish,
    DryRun,
}

impl From<ModeArg> for autoblog_types::Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Draft => autoblog_types::Mode::Draft,
            ModeArg::Publish => autoblog_types::Mode::Publish,
            ModeArg::DryRun => autoblog_types::Mode::DryRun,
        }
    }
}
