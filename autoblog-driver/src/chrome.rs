//! `chromiumoxide`-backed implementation of [`crate::Driver`].
//!
//! The third-party editor lives inside a child frame, and
//! `chromiumoxide`'s high-level `Page::evaluate` only
//! runs in the main frame's default execution context. Rather than bolt on
//! an unsupported `Frame` type, this driver tracks the editor frame's CDP
//! `frameId` and its `Runtime` execution context id directly (the same raw
//! `execute_cdp_raw`-style approach used by the chromiumoxide `Page` wrapper
//! in the retrieval pack) and scopes every evaluate call to that context.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use autoblog_types::BlockedReason;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::dom::FocusParams;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::DispatchKeyEventParams;
use chromiumoxide::cdp::browser_protocol::input::DispatchKeyEventType;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotParams;
use chromiumoxide::cdp::browser_protocol::page::GetFrameTreeParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::cdp::js_protocol::runtime::ExecutionContextId;
use regex_lite::Regex;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;
use tracing::warn;

use crate::DialogEvent;
use crate::DriverError;
use crate::Driver;
use crate::EventBuffers;
use crate::FrameHandle;
use crate::Key;
use crate::NetworkResponse;
use crate::Result;
use crate::SelectorFamily;
use crate::events::EventSink;

/// Known path fragments / frame names for the editor's child frame.
const EDITOR_URL_HINTS: &[&str] = &["PostWriteForm", "SmartEditor", "Redirect=Write"];
const EDITOR_FRAME_NAME: &str = "mainFrame";

/// Host patterns that indicate the session has been redirected to an
/// auth/challenge surface.
const SESSION_BLOCKED_HOST_HINTS: &[&str] = &["nid.naver.com/login", "nid.naver.com/nidlogin"];
const SESSION_BLOCKED_BODY_CUES: &[&str] =
    &["보안 확인", "비정상적인 접근", "약관에 동의", "2단계 인증"];

#[derive(Debug, Clone)]
pub struct ChromiumDriverConfig {
    pub frame_resolve_poll_interval: Duration,
}

impl Default for ChromiumDriverConfig {
    fn default() -> Self {
        Self {
            frame_resolve_poll_interval: Duration::from_millis(150),
        }
    }
}

pub struct ChromiumDriver {
    page: Arc<Page>,
    config: ChromiumDriverConfig,
    events: Arc<Mutex<EventSink>>,
    /// frameId -> last-seen Runtime execution context id. Populated by the
    /// background event task spawned in [`ChromiumDriver::attach`].
    frame_contexts: Arc<Mutex<HashMap<String, i64>>>,
}

impl ChromiumDriver {
    /// Attaches to an already-navigated page and starts the background
    /// event-subscription task. Mirrors `Page::new`'s pattern in the
    /// chromiumoxide wrapper found in the retrieval pack: spawn once,
    /// append to bounded buffers forever, never touch caller state.
    pub fn attach(page: Page, config: ChromiumDriverConfig) -> Self {
        let page = Arc::new(page);
        let events = Arc::new(Mutex::new(EventSink::default()));
        let frame_contexts = Arc::new(Mutex::new(HashMap::new()));

        spawn_event_pump(page.clone(), events.clone(), frame_contexts.clone());

        Self {
            page,
            config,
            events,
            frame_contexts,
        }
    }

    async fn context_id_for(&self, frame: &FrameHandle) -> Result<i64> {
        self.frame_contexts
            .lock()
            .await
            .get(&frame.0)
            .copied()
            .ok_or(DriverError::EditorIframeNotFound)
    }

    async fn eval_in_frame(&self, frame: &FrameHandle, expression: &str) -> Result<serde_json::Value> {
        let context_id = self.context_id_for(frame).await?;
        let params = EvaluateParams::builder()
            .expression(expression)
            .context_id(ExecutionContextId::new(context_id))
            .return_by_value(true)
            .build()
            .map_err(DriverError::Transport)?;
        let result = self
            .page
            .execute(params)
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        Ok(result
            .result
            .result
            .value
            .clone()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn score_frame_candidate(&self, frame_id: &str, url: &str, context_id: i64) -> i32 {
        let mut score = 0;
        if EDITOR_URL_HINTS.iter().any(|hint| url.contains(hint)) || frame_id == EDITOR_FRAME_NAME
        {
            score += 10;
        }
        let handle = FrameHandle(frame_id.to_string());
        self.frame_contexts
            .lock()
            .await
            .insert(handle.0.clone(), context_id);

        if self
            .is_family_visible(&handle, SelectorFamily::ToolbarRoot)
            .await
            .unwrap_or(false)
        {
            score += 3;
        }
        if self
            .is_family_visible(&handle, SelectorFamily::EditableRoot)
            .await
            .unwrap_or(false)
        {
            score += 5;
        }
        if self
            .is_family_visible(&handle, SelectorFamily::SaveButton)
            .await
            .unwrap_or(false)
        {
            score += 2;
        }
        score
    }
}

fn selector_query_js(selectors: &[&str]) -> String {
    let joined = selectors.join("','");
    format!("['{joined}'].map(s => Array.from(document.querySelectorAll(s))).flat()")
}

fn key_code(key: Key) -> &'static str {
    match key {
        Key::Enter => "Enter",
        Key::Escape => "Escape",
        Key::ArrowDown => "ArrowDown",
        Key::S => "s",
    }
}

/// CDP `Input.dispatchKeyEvent`'s `modifiers` bitmask: Alt=1, Ctrl=2,
/// Meta/Command=4, Shift=8.
fn modifier_mask(modifiers: &[crate::Modifier]) -> i64 {
    modifiers.iter().fold(0, |mask, m| {
        mask | match m {
            crate::Modifier::Alt => 1,
            crate::Modifier::Ctrl => 2,
            crate::Modifier::Meta => 4,
            crate::Modifier::Shift => 8,
        }
    })
}

fn is_visible_js_predicate() -> &'static str {
    "(el) => { const r = el.getBoundingClientRect(); const cs = getComputedStyle(el); \
     return r.width > 0 && r.height > 0 && cs.visibility !== 'hidden' && cs.display !== 'none'; }"
}

#[async_trait]
impl Driver for ChromiumDriver {
    async fn navigate(&self, url: &str, budget: Duration) -> Result<()> {
        timeout(budget, self.page.goto(url))
            .await
            .map_err(|_| DriverError::OperationTimeout {
                operation: "navigate".into(),
                budget_ms: budget.as_millis() as u64,
            })?
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?
            .ok_or(DriverError::EditorIframeNotFound)
    }

    async fn resolve_editor_frame(&self, budget: Duration) -> Result<FrameHandle> {
        let deadline = tokio::time::Instant::now() + budget;
        loop {
            let tree = self
                .page
                .execute(GetFrameTreeParams::default())
                .await
                .map_err(|e| DriverError::Transport(e.to_string()))?;

            let mut best: Option<(String, i32)> = None;
            let contexts = self.frame_contexts.lock().await.clone();
            for (frame_id, context_id) in contexts.iter() {
                let url = tree
                    .result
                    .frame_tree
                    .frame
                    .url
                    .clone();
                let score = self
                    .score_frame_candidate(frame_id, &url, *context_id)
                    .await;
                let better = match &best {
                    Some((_, best_score)) => score > *best_score,
                    None => true,
                };
                if score >= 5 && better {
                    best = Some((frame_id.clone(), score));
                }
            }

            if let Some((frame_id, _)) = best {
                return Ok(FrameHandle(frame_id));
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::EditorIframeNotFound);
            }
            tokio::time::sleep(self.config.frame_resolve_poll_interval).await;
        }
    }

    async fn reacquire_editor_frame(&self, budget: Duration) -> Result<FrameHandle> {
        self.frame_contexts.lock().await.clear();
        self.resolve_editor_frame(budget).await
    }

    async fn type_text(&self, frame: &FrameHandle, text: &str, budget: Duration) -> Result<()> {
        self.focus_body_end(frame).await?;
        for ch in text.chars() {
            let key_event = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::Char)
                .text(ch.to_string())
                .build()
                .map_err(DriverError::Transport)?;
            timeout(budget, self.page.execute(key_event))
                .await
                .map_err(|_| DriverError::OperationTimeout {
                    operation: "type_text".into(),
                    budget_ms: budget.as_millis() as u64,
                })?
                .map_err(|e| DriverError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    async fn press_key(&self, frame: &FrameHandle, key: Key, _budget: Duration) -> Result<()> {
        let _ = frame;
        let code = key_code(key);
        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key(code)
            .build()
            .map_err(DriverError::Transport)?;
        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(code)
            .build()
            .map_err(DriverError::Transport)?;
        self.page
            .execute(down)
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        self.page
            .execute(up)
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn press_key_combo(
        &self,
        frame: &FrameHandle,
        modifiers: &[crate::Modifier],
        key: Key,
        _budget: Duration,
    ) -> Result<()> {
        let _ = frame;
        let code = key_code(key);
        let mask = modifier_mask(modifiers);
        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key(code)
            .modifiers(mask)
            .build()
            .map_err(DriverError::Transport)?;
        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(code)
            .modifiers(mask)
            .build()
            .map_err(DriverError::Transport)?;
        self.page
            .execute(down)
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        self.page
            .execute(up)
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn insert_text_direct(&self, frame: &FrameHandle, text: &str, _budget: Duration) -> Result<()> {
        let escaped = serde_json::to_string(text).unwrap_or_default();
        let script = format!(
            "(() => {{ const roots = {}; const el = roots[roots.length - 1]; if (!el) return false; \
             el.focus(); const sel = window.getSelection(); sel.selectAllChildren(el); sel.collapseToEnd(); \
             const ok = document.execCommand('insertText', false, {escaped}); \
             el.dispatchEvent(new InputEvent('input', {{ bubbles: true }})); return ok; }})()",
            selector_query_js(SelectorFamily::EditableRoot.selectors())
        );
        let value = self.eval_in_frame(frame, &script).await?;
        if value == serde_json::Value::Bool(false) {
            return Err(DriverError::Transport("insertText command rejected".into()));
        }
        Ok(())
    }

    async fn paste_text(&self, frame: &FrameHandle, text: &str, _budget: Duration) -> Result<()> {
        let escaped = serde_json::to_string(text).unwrap_or_default();
        let script = format!(
            "(() => {{ const roots = {}; const el = roots[roots.length - 1]; if (!el) return false; \
             el.focus(); const dt = new DataTransfer(); dt.setData('text/plain', {escaped}); \
             const evt = new ClipboardEvent('paste', {{ clipboardData: dt, bubbles: true }}); \
             el.dispatchEvent(evt); return true; }})()",
            selector_query_js(SelectorFamily::EditableRoot.selectors())
        );
        self.eval_in_frame(frame, &script).await?;
        Ok(())
    }

    async fn click_by_selector_list(
        &self,
        frame: &FrameHandle,
        family: SelectorFamily,
        _budget: Duration,
    ) -> Result<()> {
        let script = format!(
            "(() => {{ const els = {}; const visible = els.filter({}); \
             if (visible.length === 0) return false; visible[0].click(); return true; }})()",
            selector_query_js(family.selectors()),
            is_visible_js_predicate(),
        );
        let value = self.eval_in_frame(frame, &script).await?;
        if value != serde_json::Value::Bool(true) {
            return Err(DriverError::NoMatchingElement);
        }
        Ok(())
    }

    async fn click_by_visible_text(
        &self,
        frame: &FrameHandle,
        pattern: &str,
        _budget: Duration,
    ) -> Result<()> {
        let escaped = serde_json::to_string(&pattern.to_lowercase()).unwrap_or_default();
        let script = format!(
            "(() => {{ const candidates = Array.from(document.querySelectorAll('button, a, [role=\"button\"]')); \
             const match = candidates.find(el => {} (el) && (el.textContent || '').toLowerCase().includes({escaped})); \
             if (!match) return false; match.click(); return true; }})()",
            is_visible_js_predicate(),
        );
        let value = self.eval_in_frame(frame, &script).await?;
        if value != serde_json::Value::Bool(true) {
            return Err(DriverError::NoMatchingElement);
        }
        Ok(())
    }

    async fn set_file_on_chooser(&self, frame: &FrameHandle, path: &Path, budget: Duration) -> Result<()> {
        // Strategy (a): click the "from PC" trigger and wait for the native
        // file chooser event; strategy (b)/(c): set files directly on the
        // first `input[type=file]` found in the frame, then the page root.
        let clicked = self
            .click_by_visible_text(frame, "내 PC", budget)
            .await
            .is_ok();

        if clicked {
            // Best-effort: chromiumoxide surfaces `Page.fileChooserOpened`
            // as an event; if it never fires within budget we fall through
            // to the direct input path below rather than erroring out.
            let _ = timeout(budget, self.page.wait_for_navigation()).await;
        }

        let has_input = self
            .eval_in_frame(frame, &selector_query_js(SelectorFamily::FileInput.selectors()))
            .await
            .map(|v| v.as_array().map(|a| !a.is_empty()).unwrap_or(false))
            .unwrap_or(false);

        if !has_input {
            return Err(DriverError::FileChooserNotTriggered);
        }

        if let Some(element) = self
            .page
            .find_element(SelectorFamily::FileInput.selectors()[0])
            .await
            .ok()
        {
            let params = SetFileInputFilesParams::builder()
                .file(path.to_path_buf().to_string_lossy().into_owned())
                .backend_node_id(element.backend_node_id)
                .build()
                .map_err(DriverError::Transport)?;
            timeout(budget, self.page.execute(params))
                .await
                .map_err(|_| DriverError::OperationTimeout {
                    operation: "set_file_on_chooser".into(),
                    budget_ms: budget.as_millis() as u64,
                })?
                .map_err(|e| DriverError::Transport(e.to_string()))?;
            Ok(())
        } else {
            Err(DriverError::FileChooserNotTriggered)
        }
    }

    async fn read_body_text(&self, frame: &FrameHandle) -> Result<String> {
        let script = format!(
            "(() => {{ const roots = {}; return roots.map(el => el.innerText || '').join('\\n'); }})()",
            selector_query_js(SelectorFamily::EditableRoot.selectors())
        );
        let value = self.eval_in_frame(frame, &script).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn read_family_texts(&self, frame: &FrameHandle, family: SelectorFamily) -> Result<Vec<String>> {
        let script = format!(
            "(() => {{ const els = {}; return els.map(el => (el.textContent || '').trim()); }})()",
            selector_query_js(family.selectors())
        );
        let value = self.eval_in_frame(frame, &script).await?;
        Ok(value
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default())
    }

    async fn read_family_hrefs(&self, frame: &FrameHandle, family: SelectorFamily) -> Result<Vec<String>> {
        let script = format!(
            "(() => {{ const els = {}; return els.map(el => el.getAttribute('href')).filter(Boolean); }})()",
            selector_query_js(family.selectors())
        );
        let value = self.eval_in_frame(frame, &script).await?;
        Ok(value
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default())
    }

    async fn read_status_text(&self, frame: &FrameHandle) -> Result<Option<String>> {
        self.find_visible_text(frame, SelectorFamily::Toast, &[]).await
    }

    async fn is_family_visible(&self, frame: &FrameHandle, family: SelectorFamily) -> Result<bool> {
        let script = format!(
            "(() => {{ const els = {}; return els.some({}); }})()",
            selector_query_js(family.selectors()),
            is_visible_js_predicate(),
        );
        let value = self.eval_in_frame(frame, &script).await?;
        Ok(value == serde_json::Value::Bool(true))
    }

    async fn find_visible_text(
        &self,
        frame: &FrameHandle,
        family: SelectorFamily,
        patterns: &[&str],
    ) -> Result<Option<String>> {
        let script = format!(
            "(() => {{ const els = {}; const vis = els.filter({}); \
             if (vis.length === 0) return null; return vis[vis.length - 1].textContent || ''; }})()",
            selector_query_js(family.selectors()),
            is_visible_js_predicate(),
        );
        let value = self.eval_in_frame(frame, &script).await?;
        let text = match value.as_str() {
            Some(t) => t.to_string(),
            None => return Ok(None),
        };
        if patterns.is_empty() {
            return Ok(Some(text));
        }
        let normalized = text.to_lowercase();
        if patterns.iter().any(|p| normalized.contains(&p.to_lowercase())) {
            Ok(Some(text))
        } else {
            Ok(None)
        }
    }

    async fn editor_image_count(&self, frame: &FrameHandle) -> Result<u32> {
        let script = "(() => { \
             const imgs = Array.from(document.images).filter(i => /pstatic\\.net|blogfiles/.test(i.src)).length; \
             const components = document.querySelectorAll('.se-image, [class*=\"se-component-image\"]').length; \
             return Math.max(imgs, components); })()";
        let value = self.eval_in_frame(frame, script).await?;
        Ok(value.as_u64().unwrap_or(0) as u32)
    }

    async fn session_blocked_probe(&self) -> Result<Option<BlockedReason>> {
        let url = self.current_url().await.unwrap_or_default();
        if SESSION_BLOCKED_HOST_HINTS.iter().any(|h| url.contains(h)) {
            if url.contains("captcha") {
                return Ok(Some(BlockedReason::CaptchaDetected));
            }
            return Ok(Some(BlockedReason::LoginFormStillVisible));
        }

        let body = self
            .page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .ok()
            .and_then(|r| r.into_value::<String>().ok())
            .unwrap_or_default();

        for cue in SESSION_BLOCKED_BODY_CUES {
            if body.contains(cue) {
                return Ok(Some(match *cue {
                    "2단계 인증" => BlockedReason::TwoFactorRequired,
                    "약관에 동의" => BlockedReason::TermsAgreementRequired,
                    "보안 확인" => BlockedReason::SecurityCheckRequired,
                    _ => BlockedReason::SessionExpired,
                }));
            }
        }
        Ok(None)
    }

    async fn focus_body_end(&self, frame: &FrameHandle) -> Result<()> {
        let script = format!(
            "(() => {{ const roots = {}; const el = roots[roots.length - 1]; if (!el) return false; \
             el.focus(); const sel = window.getSelection(); sel.selectAllChildren(el); sel.collapseToEnd(); return true; }})()",
            selector_query_js(SelectorFamily::EditableRoot.selectors())
        );
        let value = self.eval_in_frame(frame, &script).await?;
        if value != serde_json::Value::Bool(true) {
            return Err(DriverError::EditorIframeNotFound);
        }
        let _ = self.page.execute(FocusParams::default()).await;
        Ok(())
    }

    async fn force_hide_overlays(&self, frame: &FrameHandle) -> Result<()> {
        let script = format!(
            "(() => {{ const els = {}; els.forEach(el => {{ el.style.display = 'none'; }}); return els.length; }})()",
            selector_query_js(SelectorFamily::Overlay.selectors())
        );
        self.eval_in_frame(frame, &script).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(CaptureScreenshotParams::default())
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))
    }

    async fn html_snapshot(&self, frame: &FrameHandle) -> Result<String> {
        let value = self
            .eval_in_frame(frame, "document.documentElement.outerHTML")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn drain_events(&self) -> EventBuffers {
        self.events.lock().await.drain()
    }
}

/// Background task: listens for `Runtime.executionContextCreated` (to map
/// frameId -> contextId), console API calls, page errors, dialogs and
/// responses, and appends each into the bounded [`EventSink`]. Spawned once
/// per [`ChromiumDriver::attach`] and lives for the page's lifetime.
fn spawn_event_pump(
    page: Arc<Page>,
    events: Arc<Mutex<EventSink>>,
    frame_contexts: Arc<Mutex<HashMap<String, i64>>>,
) {
    use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
    use chromiumoxide::cdp::browser_protocol::page::EventJavascriptDialogOpening;
    use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
    use chromiumoxide::cdp::js_protocol::runtime::EventExceptionThrown;
    use chromiumoxide::cdp::js_protocol::runtime::EventExecutionContextCreated;
    use futures::StreamExt;

    #[allow(clippy::expect_used)]
    let upload_url_pattern = Regex::new(r"(?i)(autosave|temp|temporary|draft|save|postwrite|upload)")
        .expect("static regex is valid");

    let context_page = page.clone();
    tokio::spawn(async move {
        let page = context_page;
        let mut contexts = match page.event_listener::<EventExecutionContextCreated>().await {
            Ok(s) => s,
            Err(e) => {
                warn!("execution context listener failed: {e}");
                return;
            }
        };
        let frame_contexts = frame_contexts.clone();
        tokio::spawn(async move {
            while let Some(evt) = contexts.next().await {
                if let Some(frame_id) = evt
                    .context
                    .aux_data
                    .as_ref()
                    .and_then(|v| v.get("frameId"))
                    .and_then(|v| v.as_str())
                {
                    frame_contexts
                        .lock()
                        .await
                        .insert(frame_id.to_string(), evt.context.id.inner().to_owned() as i64);
                }
            }
        });
    });

    {
        let page = page.clone();
        let events = events.clone();
        tokio::spawn(async move {
            if let Ok(mut stream) = page.event_listener::<EventConsoleApiCalled>().await {
                while let Some(evt) = stream.next().await {
                    let text = serde_json::to_string(&evt.args).unwrap_or_default();
                    events.lock().await.push_console(text);
                }
            }
        });
    }

    {
        let page = page.clone();
        let events = events.clone();
        tokio::spawn(async move {
            if let Ok(mut stream) = page.event_listener::<EventExceptionThrown>().await {
                while let Some(evt) = stream.next().await {
                    events
                        .lock()
                        .await
                        .push_page_error(evt.exception_details.text.clone());
                }
            }
        });
    }

    {
        let page = page.clone();
        let events = events.clone();
        tokio::spawn(async move {
            if let Ok(mut stream) = page.event_listener::<EventResponseReceived>().await {
                while let Some(evt) = stream.next().await {
                    let url = evt.response.url.clone();
                    if !upload_url_pattern.is_match(&url) {
                        continue;
                    }
                    events.lock().await.push_response(NetworkResponse {
                        url,
                        status: evt.response.status as u16,
                        extracted_ids: Vec::new(),
                    });
                }
            }
        });
    }

    {
        let page = page.clone();
        let events = events.clone();
        tokio::spawn(async move {
            if let Ok(mut stream) = page.event_listener::<EventJavascriptDialogOpening>().await {
                while let Some(evt) = stream.next().await {
                    events.lock().await.push_dialog(DialogEvent {
                        message: evt.message.clone(),
                        accepted: false,
                    });
                }
            }
        });
    }

    debug!("event pump attached");
}
