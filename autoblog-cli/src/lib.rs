mod cli;
mod plan_input;

use std::time::Duration;

pub use cli::Cli;

use autoblog_core::config::RunConfig;
use autoblog_core::orchestrator::RunRequest;
use autoblog_driver::AlwaysOkSessionGate;
use autoblog_driver::ChromiumDriver;
use autoblog_driver::ChromiumDriverConfig;
use chromiumoxide::Browser;
use futures::StreamExt;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Layers CLI-supplied overrides on top of the env-derived [`RunConfig`],
/// the same two-stage load `codex-rs/cli`'s `ConfigOverrides` performs on
/// top of `Config::load`.
fn build_config(cli: &Cli) -> RunConfig {
    let mut config = RunConfig::from_env();
    if let Some(ms) = cli.image_timeout_ms {
        config.image_upload_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.draft_save_timeout_ms {
        config.draft_save_signal_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.draft_click_timeout_ms {
        config.draft_click_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.draft_verify_timeout_ms {
        config.draft_verify_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.stage_timeout_ms {
        config.stage_hard_timeout = Duration::from_millis(ms);
    }
    if let Some(v) = cli.strict_quote_escape {
        config.strict_quote_escape = v;
    }
    if let Some(v) = cli.strict_image_enforcement {
        config.strict_image_enforcement = v;
    }
    if let Some(v) = cli.max_image_attempts {
        config.max_image_upload_attempts = v;
    }
    if let Some(v) = cli.reload_editor_ready_recovery {
        config.reload_editor_ready_recovery = v;
    }
    if let Some(v) = cli.max_recovery_per_stage {
        config.max_recovery_per_stage = v;
    }
    if let Some(dir) = &cli.lock_dir {
        config.idempotency_lock_dir = dir.clone();
    }
    if let Some(secs) = cli.lock_ttl_secs {
        config.idempotency_lock_ttl = Duration::from_secs(secs);
    }
    if let Some(dir) = &cli.debug_root {
        config.debug_artifact_root = dir.clone();
    }
    if cli.simulate_image_failure.is_some() {
        config.simulate_image_failure = cli.simulate_image_failure.clone();
    }
    config
}

/// Stderr carries the env-filtered live log, matching `codex-rs/exec`'s
/// discipline of reserving stdout for the single result line. A second,
/// always-on layer mirrors every event into a daily-rolling file under the
/// debug artifact root so a failed run's trace survives after the process
/// exits.
fn init_tracing(debug_artifact_root: &std::path::Path) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(debug_artifact_root)?;
    let file_appender = tracing_appender::rolling::daily(debug_artifact_root, "autoblog.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = "info";
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let file_layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to init tracing: {err}"))?;
    Ok(guard)
}

pub async fn run_main(cli: Cli) -> anyhow::Result<i32> {
    let config = build_config(&cli);
    let _tracing_guard = init_tracing(&config.debug_artifact_root)?;

    let request_id = cli.request_id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let parsed_blocks = plan_input::read_plan_file(&cli.plan)?;
    let plan = autoblog_core::build_plan(parsed_blocks);

    info!(%request_id, editor_url = %cli.editor_url, blocks = plan.len(), "connecting to browser");

    let (browser, mut handler) = Browser::connect(&cli.cdp_url)
        .await
        .map_err(|err| anyhow::anyhow!("failed to connect to CDP endpoint {}: {err}", cli.cdp_url))?;
    tokio::spawn(async move { while handler.next().await.is_some() {} });

    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|err| anyhow::anyhow!("failed to open page: {err}"))?;
    let driver = ChromiumDriver::attach(page, ChromiumDriverConfig::default());

    let gate = AlwaysOkSessionGate;
    let request = RunRequest {
        request_id,
        account_id: cli.account_id.clone(),
        mode: cli.mode.into(),
        editor_url: cli.editor_url.clone(),
        title: cli.title.clone(),
        expected_draft_id: cli.expected_draft_id.clone(),
        plan,
        session_gate: &gate,
    };

    let report = autoblog_core::run(&driver, &config, request).await?;
    let line = report.to_result_line()?;
    println!("{line}");

    let exit_code = if report.overall_status == autoblog_types::OverallStatus::Failed {
        1
    } else {
        0
    };
    Ok(exit_code)
}
