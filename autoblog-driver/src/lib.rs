//! Driver Facade: a thin capability layer over a remote-controlled browser.
//!
//! Grounded on `codex-rs/core::mcp_connection_manager` (typed,
//! timeout-bounded calls to an external, unowned process) and on the
//! `chromiumoxide` `Page` API. Every operation here is bounded by an
//! explicit timeout and raises
//! [`DriverError::OperationTimeout`] or [`DriverError::SessionBlocked`]
//! rather than hanging or panicking — the foreign event loop on the other
//! side of this trait is never assumed to cooperate.

mod chrome;
mod events;
mod selectors;

pub use chrome::ChromiumDriver;
pub use chrome::ChromiumDriverConfig;
pub use events::DialogEvent;
pub use events::EventBuffers;
pub use events::NetworkResponse;
pub use events::PageErrorEvent;
pub use selectors::SelectorFamily;

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use autoblog_types::BlockedReason;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("editor iframe could not be resolved")]
    EditorIframeNotFound,

    #[error("operation '{operation}' timed out after {budget_ms}ms")]
    OperationTimeout { operation: String, budget_ms: u64 },

    #[error("session blocked: {0}")]
    SessionBlocked(BlockedReason),

    #[error("no element matched any selector in the family")]
    NoMatchingElement,

    #[error("file chooser never appeared")]
    FileChooserNotTriggered,

    #[error("underlying browser transport error: {0}")]
    Transport(String),
}

/// Opaque handle to a resolved frame. Invalidated by recovery-induced
/// frame re-resolution; holding one across a `reacquire_editor_frame` call
/// is a caller bug, not a driver concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHandle(pub(crate) String);

impl FrameHandle {
    /// Constructs a handle outside `autoblog-driver` for use by test
    /// doubles. Never produced by a real driver; the concrete driver always
    /// mints its own handles from an actual resolved frame.
    #[doc(hidden)]
    pub fn for_tests(name: &str) -> Self {
        FrameHandle(name.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Dialog,
    Response,
    Request,
    Console,
    PageError,
}

/// Keyboard keys the Block Inserter and Recovery Manager need by name,
/// rather than raw key codes, so strategies stay legible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    ArrowDown,
    S,
}

/// Keyboard modifiers usable with [`Driver::press_key_combo`]. A bare
/// [`Driver::press_key`] press carries no modifier and cannot dispatch a
/// combo like Ctrl+S.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Ctrl,
    Meta,
    Shift,
    Alt,
}

/// Operations exposed to every component above the Driver Facade. No
/// component other than the Run Orchestrator is permitted to tear the
/// underlying browser/page down; this trait intentionally has no
/// `shutdown()` — that lives on the concrete driver the orchestrator owns.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Scores every frame of the page by: URL pattern match against the
    /// known editor path family, presence of a toolbar root, presence of at
    /// least one editable element, presence of a save control. Returns the
    /// highest scorer; ties resolve to the first one whose URL matches.
    /// Fails with [`DriverError::EditorIframeNotFound`] if no frame clears
    /// the minimum bar (editable presence).
    async fn resolve_editor_frame(&self, timeout: Duration) -> Result<FrameHandle>;

    /// Invalidates any cached frame handle and resolves again. Used by the
    /// Recovery Manager; never invalidates the `PostPlan`/`PostPlanState`.
    async fn reacquire_editor_frame(&self, timeout: Duration) -> Result<FrameHandle>;

    async fn type_text(&self, frame: &FrameHandle, text: &str, timeout: Duration) -> Result<()>;

    async fn press_key(&self, frame: &FrameHandle, key: Key, timeout: Duration) -> Result<()>;

    /// Dispatches `key` with `modifiers` held down, e.g. Ctrl+S. Used by the
    /// Draft Saver's global-save-combo fallback; a bare [`Driver::press_key`]
    /// cannot carry a modifier and would risk inserting a stray character
    /// into the contenteditable surface instead.
    async fn press_key_combo(
        &self,
        frame: &FrameHandle,
        modifiers: &[Modifier],
        key: Key,
        timeout: Duration,
    ) -> Result<()>;

    /// Direct text insertion via the editor's supported input-event route:
    /// focus the last editable, select-to-end, dispatch an insert-text
    /// event, dispatch a synthetic input event.
    async fn insert_text_direct(&self, frame: &FrameHandle, text: &str, timeout: Duration) -> Result<()>;

    /// Dispatches a clipboard-style paste event carrying `text`, falling
    /// back to a clipboard-write + paste-key combo if the event path is
    /// rejected by the page.
    async fn paste_text(&self, frame: &FrameHandle, text: &str, timeout: Duration) -> Result<()>;

    async fn click_by_selector_list(
        &self,
        frame: &FrameHandle,
        family: SelectorFamily,
        timeout: Duration,
    ) -> Result<()>;

    async fn click_by_visible_text(
        &self,
        frame: &FrameHandle,
        pattern: &str,
        timeout: Duration,
    ) -> Result<()>;

    /// Triggers the OS file chooser through one of: waiting for the
    /// `filechooser` event after clicking an upload trigger, setting files
    /// directly on the first `input[type=file]` in the frame, or the same
    /// on the page root.
    async fn set_file_on_chooser(
        &self,
        frame: &FrameHandle,
        path: &Path,
        timeout: Duration,
    ) -> Result<()>;

    /// Reads the plain-text content of the body editable area.
    async fn read_body_text(&self, frame: &FrameHandle) -> Result<String>;

    /// Reads the trimmed text content of every element matching `family`, in
    /// DOM order. Unlike [`Driver::find_visible_text`] this does not filter
    /// by visibility or stop at the last match — used to enumerate
    /// candidates from a non-editable panel (e.g. the drafts list).
    async fn read_family_texts(&self, frame: &FrameHandle, family: SelectorFamily) -> Result<Vec<String>>;

    /// Reads the `href` attribute of every element matching `family`, in DOM
    /// order. Elements without an `href` are omitted.
    async fn read_family_hrefs(&self, frame: &FrameHandle, family: SelectorFamily) -> Result<Vec<String>>;

    /// Reads the editor's current status text, if the status surface exists.
    async fn read_status_text(&self, frame: &FrameHandle) -> Result<Option<String>>;

    /// True if at least one visible element in `family` exists under the
    /// editor root.
    async fn is_family_visible(&self, frame: &FrameHandle, family: SelectorFamily) -> Result<bool>;

    /// Finds visible text in any element of `family` that matches any of
    /// `patterns` (case/width normalized by the caller before matching).
    async fn find_visible_text(
        &self,
        frame: &FrameHandle,
        family: SelectorFamily,
        patterns: &[&str],
    ) -> Result<Option<String>>;

    /// Counts `img` references whose URL host matches the editor's CDN
    /// pattern plus standalone image component nodes, returning the max of
    /// the two counts, per the Image Uploader's counting contract.
    async fn editor_image_count(&self, frame: &FrameHandle) -> Result<u32>;

    /// Whether the current page state indicates a session block: URL
    /// matches the known auth/captcha host pattern, a login form is
    /// visible, or the body text contains a known block cue.
    async fn session_blocked_probe(&self) -> Result<Option<BlockedReason>>;

    /// Places the caret at the end of the body editable content.
    async fn focus_body_end(&self, frame: &FrameHandle) -> Result<()>;

    /// Mutates inline styles to force-hide any visible dim/dialog/popup
    /// overlay. Last-resort recovery step; never the primary dismiss path.
    async fn force_hide_overlays(&self, frame: &FrameHandle) -> Result<()>;

    async fn screenshot(&self) -> Result<Vec<u8>>;

    async fn html_snapshot(&self, frame: &FrameHandle) -> Result<String>;

    /// Drains and clears the bounded event buffers (dialog/response/request/
    /// console/page-error) accumulated since the last drain or since the
    /// start of the current stage, whichever is more recent.
    async fn drain_events(&self) -> EventBuffers;
}

/// Collaborator supplied by the caller: `preflight()` runs before the core
/// does anything; `recover()` runs when the core observes a mid-run session
/// redirection. The core never performs credential entry itself.
#[async_trait]
pub trait SessionGate: Send + Sync {
    async fn preflight(&self) -> std::result::Result<(), BlockedReason>;
    async fn recover(&self, reason: BlockedReason) -> std::result::Result<(), BlockedReason>;
}

/// A `SessionGate` that always reports the session as usable. Useful for
/// `dry_run` mode and for components that are exercised without a real
/// login-aware collaborator.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOkSessionGate;

#[async_trait]
impl SessionGate for AlwaysOkSessionGate {
    async fn preflight(&self) -> std::result::Result<(), BlockedReason> {
        Ok(())
    }

    async fn recover(&self, _reason: BlockedReason) -> std::result::Result<(), BlockedReason> {
        Ok(())
    }
}

/// Resolved identity of one image to attach, as handed to the Image
/// Uploader by its caller. Kept here (rather than in `autoblog-types`)
/// since it is purely a driver-input shape, not part of the wire report.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub path: PathBuf,
    pub image_index: u32,
}
