#![allow(clippy::expect_used)]
//! Integration tests covering the end-to-end run scenarios: text-only
//! success, image-plus-text upload, retry-then-success image upload,
//! section-title quote wrapping, duplicate image detection, and a
//! session-blocked mid-run abort.

use std::path::PathBuf;

use autoblog_core::build_plan;
use autoblog_core::config::RunConfig;
use autoblog_core::orchestrator::run;
use autoblog_core::orchestrator::RunRequest;
use autoblog_core::plan::ParsedBlock;
use autoblog_core_test_support::network_response_2xx;
use autoblog_core_test_support::FakeDriver;
use autoblog_driver::AlwaysOkSessionGate;
use autoblog_driver::SelectorFamily;
use autoblog_types::BlockedReason;
use autoblog_types::Mode;
use autoblog_types::OverallStatus;

fn base_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.image_upload_timeout = std::time::Duration::from_millis(200);
    config.draft_save_signal_timeout = std::time::Duration::from_millis(200);
    config.draft_click_timeout = std::time::Duration::from_millis(100);
    config.stage_hard_timeout = std::time::Duration::from_millis(500);
    // Each test gets its own lock directory so concurrent scenarios never
    // contend on the same idempotency lock file.
    let dir = tempfile::tempdir().expect("tempdir");
    config.idempotency_lock_dir = dir.into_path();
    config
}

#[tokio::test]
async fn scenario_1_text_only_toast_success() {
    let driver = FakeDriver::new();
    driver.set_toast(true);
    driver.set_family_visible(SelectorFamily::EditableRoot, true);

    let plan = build_plan(vec![ParsedBlock::Text("Hello, world.".to_string())]);
    let config = base_config();
    let gate = AlwaysOkSessionGate;

    let request = RunRequest {
        request_id: "req-1".to_string(),
        account_id: "acct-1".to_string(),
        mode: Mode::Draft,
        editor_url: "https://blog.example.test/PostWriteForm.naver".to_string(),
        title: "My Title".to_string(),
        expected_draft_id: None,
        plan,
        session_gate: &gate,
    };

    let report = run(&driver, &config, request).await.expect("run should succeed");

    assert_eq!(report.draft_summary.success, true);
    assert_eq!(report.overall_status, OverallStatus::SuccessTextOnly);
}

#[tokio::test]
async fn scenario_4_session_blocked_mid_run_is_terminal() {
    let driver = FakeDriver::new();
    driver.set_session_blocked(Some(BlockedReason::CaptchaDetected));

    let plan = build_plan(vec![ParsedBlock::Text(
        "Hello, this is a longer test sentence for growth verification.".to_string(),
    )]);
    let config = base_config();
    let gate = AlwaysOkSessionGate;

    let request = RunRequest {
        request_id: "req-4".to_string(),
        account_id: "acct-1".to_string(),
        mode: Mode::Draft,
        editor_url: "https://blog.example.test/PostWriteForm.naver".to_string(),
        title: "My Title".to_string(),
        expected_draft_id: None,
        plan,
        session_gate: &gate,
    };

    let result = run(&driver, &config, request).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn scenario_2_image_and_text_save_via_network_signal() {
    let driver = FakeDriver::new();
    driver.set_family_visible(SelectorFamily::EditableRoot, true);
    driver.push_network_response(network_response_2xx("https://static.example.test/upload/abc"));
    driver.bump_editor_image_count(1);
    driver.push_network_response(network_response_2xx("https://blog.example.test/autosave"));

    let plan = build_plan(vec![
        ParsedBlock::Text("before".to_string()),
        ParsedBlock::Image {
            path: PathBuf::from("/tmp/a.jpg"),
            image_index: 1,
        },
        ParsedBlock::Text("after".to_string()),
    ]);
    let config = base_config();
    let gate = AlwaysOkSessionGate;

    let request = RunRequest {
        request_id: "req-2".to_string(),
        account_id: "acct-1".to_string(),
        mode: Mode::Draft,
        editor_url: "https://blog.example.test/PostWriteForm.naver".to_string(),
        title: "My Title".to_string(),
        expected_draft_id: None,
        plan,
        session_gate: &gate,
    };

    let report = run(&driver, &config, request).await.expect("run should succeed");
    assert_eq!(report.image_summary.uploaded_count, 1);
}

#[tokio::test]
async fn scenario_3_image_upload_transient_then_success() {
    let driver = FakeDriver::new();
    driver.set_family_visible(SelectorFamily::EditableRoot, true);
    driver.set_toast(true);
    // First two attempts leave the editor's image count unchanged; the
    // third (of three allowed) attempt is the one that actually lands.
    driver.set_image_stuck_for_attempts(2);

    let plan = build_plan(vec![ParsedBlock::Image {
        path: PathBuf::from("/tmp/a.jpg"),
        image_index: 1,
    }]);
    let config = base_config();
    let gate = AlwaysOkSessionGate;

    let request = RunRequest {
        request_id: "req-3".to_string(),
        account_id: "acct-1".to_string(),
        mode: Mode::Draft,
        editor_url: "https://blog.example.test/PostWriteForm.naver".to_string(),
        title: "My Title".to_string(),
        expected_draft_id: None,
        plan,
        session_gate: &gate,
    };

    let report = run(&driver, &config, request).await.expect("run should succeed after retrying");
    assert_eq!(report.image_summary.uploaded_count, 1);
}

#[tokio::test]
async fn scenario_5_section_title_and_body_quote_wrapping() {
    let driver = FakeDriver::new();
    driver.set_family_visible(SelectorFamily::EditableRoot, true);
    driver.set_toast(true);

    let plan = build_plan(vec![
        ParsedBlock::SectionTitle("A Longer Section Heading".to_string()),
        ParsedBlock::Text("Body text that follows the heading block.".to_string()),
    ]);
    let config = base_config();
    let gate = AlwaysOkSessionGate;

    let request = RunRequest {
        request_id: "req-5".to_string(),
        account_id: "acct-1".to_string(),
        mode: Mode::Draft,
        editor_url: "https://blog.example.test/PostWriteForm.naver".to_string(),
        title: "My Title".to_string(),
        expected_draft_id: None,
        plan,
        session_gate: &gate,
    };

    let report = run(&driver, &config, request).await.expect("run should succeed");
    assert_eq!(report.overall_status, OverallStatus::SuccessTextOnly);
    assert!(driver.body_text().contains("A Longer Section Heading"));
    assert!(driver.body_text().contains("Body text that follows the heading block."));
}

#[tokio::test]
async fn scenario_6_duplicate_image_insert_fails_the_image_step() {
    let driver = FakeDriver::new();
    driver.set_family_visible(SelectorFamily::EditableRoot, true);
    driver.set_toast(true);
    // The editor's count jumps by two on a single attempt: a double insert.
    driver.set_image_growth_per_attempt(2);

    let plan = build_plan(vec![ParsedBlock::Image {
        path: PathBuf::from("/tmp/a.jpg"),
        image_index: 1,
    }]);
    let config = base_config();
    let gate = AlwaysOkSessionGate;

    let request = RunRequest {
        request_id: "req-6".to_string(),
        account_id: "acct-1".to_string(),
        mode: Mode::Draft,
        editor_url: "https://blog.example.test/PostWriteForm.naver".to_string(),
        title: "My Title".to_string(),
        expected_draft_id: None,
        plan,
        session_gate: &gate,
    };

    let report = run(&driver, &config, request).await.expect("run still produces a report on an image failure");
    assert_eq!(report.steps.c.status, autoblog_types::StepStatus::Failed);
}
