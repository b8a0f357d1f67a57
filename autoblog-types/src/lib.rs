//! Wire-level data shapes shared between the editor-automation core and its
//! callers: the immutable post plan, point-in-time signal snapshots, and the
//! structured run report emitted on stdout.
//!
//! This crate holds shapes only, no behavior — construction, normalization
//! and hashing live in `autoblog-core`, the same split `codex-rs` draws
//! between `codex-protocol`/`mcp-types` (wire shapes) and `codex-core`
//! (behavior).

mod plan;
mod reason;
mod report;
mod session;
mod signal;

#[cfg(test)]
mod overall_status_tests;

pub use plan::BlockId;
pub use plan::BlockKind;
pub use plan::BlockPayload;
pub use plan::ImageIdentity;
pub use plan::PlanBlock;
pub use plan::PostPlan;
pub use reason::ReasonCode;
pub use report::DraftSummary;
pub use report::RESULT_LINE_PREFIX;
pub use report::SCHEMA_VERSION;
pub use report::ImageSummary;
pub use report::ImageSummaryStatus;
pub use report::Mode;
pub use report::OverallStatus;
pub use report::StepName;
pub use report::StepRecord;
pub use report::StepStatus;
pub use report::Steps;
pub use report::UploadReport;
pub use session::BlockedReason;
pub use signal::SignalSnapshot;
