#![allow(clippy::unwrap_used)]
//! Deterministic in-memory [`Driver`] used by `autoblog-core`'s integration
//! tests. Mirrors `codex-rs`'s `core_test_support` pattern: a single
//! scriptable fake standing in for the real collaborator, driven by a
//! handful of setter methods rather than a mocking framework.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use autoblog_driver::Driver;
use autoblog_driver::EventBuffers;
use autoblog_driver::FrameHandle;
use autoblog_driver::ImageAttachment;
use autoblog_driver::Key;
use autoblog_driver::NetworkResponse;
use autoblog_driver::Result;
use autoblog_driver::SelectorFamily;
use autoblog_types::BlockedReason;

#[derive(Debug, Default)]
struct FakeState {
    body_text: String,
    status_text: Option<String>,
    toast_visible: bool,
    family_visible: HashMap<VisibleKey, bool>,
    session_blocked: Option<BlockedReason>,
    editor_image_count: u32,
    pending_network_responses: Vec<NetworkResponse>,
    console: Vec<String>,
    /// Number of `set_file_on_chooser` calls (one per upload attempt) that
    /// must happen before the editor's image count actually grows, used to
    /// script a transient-then-succeeds upload.
    image_stuck_for_attempts: u32,
    image_trigger_count: u32,
    /// How much the editor's image count grows on an attempt that isn't
    /// held stuck. 2+ simulates the editor double-inserting one upload.
    image_growth_per_attempt: u32,
    drafts_panel_titles: Vec<String>,
    drafts_panel_hrefs: Vec<String>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
struct VisibleKey(u8);

fn family_key(family: SelectorFamily) -> VisibleKey {
    VisibleKey(family as u8)
}

/// Scriptable [`Driver`] double. Every operation reads/writes a single
/// `Mutex<FakeState>`, matching the single-threaded discipline real drivers
/// assume.
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self {
            state: Mutex::new(FakeState {
                image_growth_per_attempt: 1,
                ..FakeState::default()
            }),
        }
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_toast(&self, visible: bool) {
        self.state.lock().unwrap().toast_visible = visible;
    }

    pub fn set_family_visible(&self, family: SelectorFamily, visible: bool) {
        self.state.lock().unwrap().family_visible.insert(family_key(family), visible);
    }

    pub fn set_session_blocked(&self, reason: Option<BlockedReason>) {
        self.state.lock().unwrap().session_blocked = reason;
    }

    pub fn set_status_text(&self, text: Option<&str>) {
        self.state.lock().unwrap().status_text = text.map(str::to_string);
    }

    pub fn set_editor_image_count(&self, count: u32) {
        self.state.lock().unwrap().editor_image_count = count;
    }

    pub fn bump_editor_image_count(&self, delta: i32) {
        let mut state = self.state.lock().unwrap();
        state.editor_image_count = (state.editor_image_count as i32 + delta).max(0) as u32;
    }

    pub fn push_network_response(&self, response: NetworkResponse) {
        self.state.lock().unwrap().pending_network_responses.push(response);
    }

    pub fn body_text(&self) -> String {
        self.state.lock().unwrap().body_text.clone()
    }

    /// The first `n` upload attempts leave the editor's image count
    /// unchanged; the attempt after that increments it by one.
    pub fn set_image_stuck_for_attempts(&self, n: u32) {
        self.state.lock().unwrap().image_stuck_for_attempts = n;
    }

    /// Set how much the editor's image count grows once an attempt is no
    /// longer held stuck. Use 2 to simulate a duplicated insert.
    pub fn set_image_growth_per_attempt(&self, n: u32) {
        self.state.lock().unwrap().image_growth_per_attempt = n;
    }

    /// Seeds the drafts panel with `(title, href)` pairs, as if the editor's
    /// drafts list had already rendered them.
    pub fn set_drafts_panel(&self, entries: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        state.drafts_panel_titles = entries.iter().map(|(title, _)| title.to_string()).collect();
        state.drafts_panel_hrefs = entries.iter().map(|(_, href)| href.to_string()).collect();
    }
}

fn visible(state: &FakeState, family: SelectorFamily) -> bool {
    *state.family_visible.get(&family_key(family)).unwrap_or(&false)
}

#[async_trait]
impl Driver for FakeDriver {
    async fn navigate(&self, _url: &str, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok("https://blog.example.test/PostWriteForm.naver".to_string())
    }

    async fn resolve_editor_frame(&self, _timeout: Duration) -> Result<FrameHandle> {
        Ok(FrameHandle::for_tests("main"))
    }

    async fn reacquire_editor_frame(&self, _timeout: Duration) -> Result<FrameHandle> {
        Ok(FrameHandle::for_tests("main"))
    }

    async fn type_text(&self, _frame: &FrameHandle, text: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.body_text.push_str(text);
        Ok(())
    }

    async fn press_key(&self, _frame: &FrameHandle, _key: Key, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn press_key_combo(
        &self,
        _frame: &FrameHandle,
        _modifiers: &[autoblog_driver::Modifier],
        _key: Key,
        _timeout: Duration,
    ) -> Result<()> {
        Ok(())
    }

    async fn insert_text_direct(&self, _frame: &FrameHandle, text: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.body_text.push_str(text);
        Ok(())
    }

    async fn paste_text(&self, _frame: &FrameHandle, text: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.body_text.push_str(text);
        Ok(())
    }

    async fn click_by_selector_list(
        &self,
        _frame: &FrameHandle,
        _family: SelectorFamily,
        _timeout: Duration,
    ) -> Result<()> {
        Ok(())
    }

    async fn click_by_visible_text(&self, _frame: &FrameHandle, _pattern: &str, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn set_file_on_chooser(&self, _frame: &FrameHandle, _path: &std::path::Path, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.image_trigger_count += 1;
        if state.image_trigger_count > state.image_stuck_for_attempts {
            state.editor_image_count += state.image_growth_per_attempt;
        }
        Ok(())
    }

    async fn read_body_text(&self, _frame: &FrameHandle) -> Result<String> {
        Ok(self.state.lock().unwrap().body_text.clone())
    }

    async fn read_family_texts(&self, _frame: &FrameHandle, family: SelectorFamily) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if family == SelectorFamily::DraftsPanelLink {
            return Ok(state.drafts_panel_titles.clone());
        }
        Ok(Vec::new())
    }

    async fn read_family_hrefs(&self, _frame: &FrameHandle, family: SelectorFamily) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if family == SelectorFamily::DraftsPanelLink {
            return Ok(state.drafts_panel_hrefs.clone());
        }
        Ok(Vec::new())
    }

    async fn read_status_text(&self, _frame: &FrameHandle) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().status_text.clone())
    }

    async fn is_family_visible(&self, _frame: &FrameHandle, family: SelectorFamily) -> Result<bool> {
        Ok(visible(&self.state.lock().unwrap(), family))
    }

    async fn find_visible_text(
        &self,
        _frame: &FrameHandle,
        family: SelectorFamily,
        patterns: &[&str],
    ) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        if family == SelectorFamily::Toast && state.toast_visible {
            return Ok(patterns.first().map(|p| p.to_string()));
        }
        if family == SelectorFamily::QuoteBlock && !state.body_text.is_empty() {
            return Ok(Some(state.body_text.clone()));
        }
        Ok(None)
    }

    async fn editor_image_count(&self, _frame: &FrameHandle) -> Result<u32> {
        Ok(self.state.lock().unwrap().editor_image_count)
    }

    async fn session_blocked_probe(&self) -> Result<Option<BlockedReason>> {
        Ok(self.state.lock().unwrap().session_blocked)
    }

    async fn focus_body_end(&self, _frame: &FrameHandle) -> Result<()> {
        Ok(())
    }

    async fn force_hide_overlays(&self, frame: &FrameHandle) -> Result<()> {
        self.set_family_visible(SelectorFamily::Overlay, false);
        let _ = frame;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn html_snapshot(&self, _frame: &FrameHandle) -> Result<String> {
        Ok(String::new())
    }

    async fn drain_events(&self) -> EventBuffers {
        let mut state = self.state.lock().unwrap();
        EventBuffers {
            dialogs: Vec::new(),
            responses: std::mem::take(&mut state.pending_network_responses),
            console: std::mem::take(&mut state.console),
            page_errors: Vec::new(),
        }
    }
}

pub fn attachment(path: &str, image_index: u32) -> ImageAttachment {
    ImageAttachment {
        path: std::path::PathBuf::from(path),
        image_index,
    }
}

pub fn network_response_2xx(url: &str) -> NetworkResponse {
    NetworkResponse {
        url: url.to_string(),
        status: 200,
        extracted_ids: Vec::new(),
    }
}
