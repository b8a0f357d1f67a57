//! Environment-valued configuration knobs. Loaded once into a typed
//! `RunConfig`, the same shape as `codex-rs/core::config::Config`
//! (a plain struct of typed fields with defaults, overridable by the
//! caller) but sourced from `std::env::var` rather than a TOML file, since
//! this CLI has no on-disk config surface of its own.

use std::path::PathBuf;
use std::time::Duration;

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub image_upload_timeout: Duration,
    pub draft_save_signal_timeout: Duration,
    pub draft_click_timeout: Duration,
    pub draft_verify_timeout: Duration,
    pub stage_hard_timeout: Duration,
    pub strict_quote_escape: bool,
    pub strict_image_enforcement: bool,
    pub max_image_upload_attempts: u32,
    pub reload_editor_ready_recovery: bool,
    pub max_recovery_per_stage: u32,
    pub idempotency_lock_dir: PathBuf,
    pub idempotency_lock_ttl: Duration,
    pub debug_artifact_root: PathBuf,
    /// Test-only escape hatch: forces image upload to fail with the
    /// named reason code. `None` in production.
    pub simulate_image_failure: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            image_upload_timeout: Duration::from_secs(20),
            draft_save_signal_timeout: Duration::from_secs(30),
            draft_click_timeout: Duration::from_secs(45),
            draft_verify_timeout: Duration::from_secs(45),
            stage_hard_timeout: Duration::from_secs(30),
            strict_quote_escape: true,
            strict_image_enforcement: false,
            max_image_upload_attempts: 3,
            reload_editor_ready_recovery: false,
            max_recovery_per_stage: 1,
            idempotency_lock_dir: PathBuf::from("/tmp/autoblog-locks"),
            idempotency_lock_ttl: Duration::from_secs(30 * 60),
            debug_artifact_root: PathBuf::from("./debug"),
            simulate_image_failure: None,
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            image_upload_timeout: Duration::from_millis(env_u64(
                "POSTER_IMAGE_UPLOAD_TIMEOUT_MS",
                defaults.image_upload_timeout.as_millis() as u64,
            )),
            draft_save_signal_timeout: Duration::from_millis(env_u64(
                "POSTER_DRAFT_SAVE_TIMEOUT_MS",
                defaults.draft_save_signal_timeout.as_millis() as u64,
            )),
            draft_click_timeout: Duration::from_millis(env_u64(
                "POSTER_DRAFT_CLICK_TIMEOUT_MS",
                defaults.draft_click_timeout.as_millis() as u64,
            )),
            draft_verify_timeout: Duration::from_millis(env_u64(
                "POSTER_DRAFT_VERIFY_TIMEOUT_MS",
                defaults.draft_verify_timeout.as_millis() as u64,
            )),
            stage_hard_timeout: Duration::from_millis(env_u64(
                "POSTER_STAGE_TIMEOUT_MS",
                defaults.stage_hard_timeout.as_millis() as u64,
            )),
            strict_quote_escape: env_bool("POSTER_STRICT_QUOTE_ESCAPE", defaults.strict_quote_escape),
            strict_image_enforcement: env_bool(
                "POSTER_STRICT_IMAGE_ENFORCEMENT",
                defaults.strict_image_enforcement,
            ),
            max_image_upload_attempts: env_u64(
                "POSTER_MAX_IMAGE_ATTEMPTS",
                defaults.max_image_upload_attempts as u64,
            ) as u32,
            reload_editor_ready_recovery: env_bool(
                "POSTER_RELOAD_RECOVERY",
                defaults.reload_editor_ready_recovery,
            ),
            max_recovery_per_stage: env_u64(
                "POSTER_MAX_RECOVERY_PER_STAGE",
                defaults.max_recovery_per_stage as u64,
            ) as u32,
            idempotency_lock_dir: env_path(
                "POSTER_LOCK_DIR",
                &defaults.idempotency_lock_dir.to_string_lossy(),
            ),
            idempotency_lock_ttl: Duration::from_secs(env_u64(
                "POSTER_LOCK_TTL_SECS",
                defaults.idempotency_lock_ttl.as_secs(),
            )),
            debug_artifact_root: env_path(
                "POSTER_DEBUG_ROOT",
                &defaults.debug_artifact_root.to_string_lossy(),
            ),
            simulate_image_failure: std::env::var("POSTER_SIMULATE_IMAGE_FAILURE").ok(),
        }
    }

    /// `clamp(30, 20 + 12*textBlocks + max(35, imageTimeoutSec+20)*imageBlocks, 600)` seconds.
    pub fn insert_blocks_budget(&self, text_blocks: usize, image_blocks: usize) -> Duration {
        let image_timeout_sec = self.image_upload_timeout.as_secs();
        let per_image = std::cmp::max(35, image_timeout_sec + 20);
        let raw = 20 + 12 * text_blocks as u64 + per_image * image_blocks as u64;
        Duration::from_secs(raw.clamp(30, 600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_blocks_budget_clamps_low() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.insert_blocks_budget(0, 0), Duration::from_secs(30));
    }

    #[test]
    fn insert_blocks_budget_clamps_high() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.insert_blocks_budget(100, 100), Duration::from_secs(600));
    }

    #[test]
    fn insert_blocks_budget_scales_with_blocks() {
        let cfg = RunConfig::default();
        let budget = cfg.insert_blocks_budget(2, 1);
        // 20 + 12*2 + max(35, 40)*1 = 20 + 24 + 40 = 84
        assert_eq!(budget, Duration::from_secs(84));
    }
}
