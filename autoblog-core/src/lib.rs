//! Editor Interaction State Machine: turns an immutable [`PostPlan`] into
//! verified changes inside a live, remote editor document.
//!
//! Module layout mirrors the dependency order `codex-rs/core` uses for
//! its own leaf-to-root subsystems: shared
//! primitives first (`config`, `error`, `util`, `normalize`), then the
//! components that build on them (`plan`, `signal`, `recovery`, `insert`,
//! `image`, `save`, `verify`, `idempotency`, `debug_capture`), with
//! `orchestrator` as the single root every caller drives.

pub mod config;
pub mod debug_capture;
pub mod error;
pub mod idempotency;
pub mod image;
pub mod insert;
pub mod normalize;
pub mod orchestrator;
pub mod plan;
pub mod recovery;
pub mod save;
pub mod signal;
pub mod util;
pub mod verify;

pub use autoblog_types::PostPlan;
pub use config::RunConfig;
pub use error::PosterErr;
pub use error::Result;
pub use orchestrator::run;
pub use orchestrator::RunRequest;
pub use plan::build_plan;
pub use plan::ParsedBlock;
pub use plan::PostPlanState;
