//! In-memory engine, host and clock for driving a session without CEF.

#![allow(dead_code)]

use efb_cef::*;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

/// Owned form of [`EngineEvent`], so tests can queue events ahead of a pump.
#[derive(Debug, Clone)]
pub enum Scripted {
    AfterCreated,
    BeforeClose,
    Paint {
        layer: PaintLayer,
        buffer: Vec<u8>,
        width: u32,
        height: u32,
        rects: Vec<DirtyRect>,
    },
    PopupShow(bool),
    PopupSize(PopupGeometry),
    Cursor(CursorKind),
    Keyboard(TextInputMode),
    Loading {
        is_loading: bool,
        can_go_back: bool,
        can_go_forward: bool,
    },
    LoadEnd(bool),
    LoadError(i32, String),
    Title(String),
    Address(String),
    DocumentAvailable,
    Popup { url: String, user_gesture: bool },
    Alert(String),
    Download(String),
    DownloadUpdated(i32, bool),
    Permission(PermissionKind),
    ResourceLoad(String),
}

impl Scripted {
    fn as_event(&self) -> EngineEvent<'_> {
        match self {
            Scripted::AfterCreated => EngineEvent::AfterCreated,
            Scripted::BeforeClose => EngineEvent::BeforeClose,
            Scripted::Paint {
                layer,
                buffer,
                width,
                height,
                rects,
            } => EngineEvent::Paint(PaintFrame {
                layer: *layer,
                buffer,
                width: *width,
                height: *height,
                dirty_rects: rects.clone(),
            }),
            Scripted::PopupShow(shown) => EngineEvent::PopupShow(*shown),
            Scripted::PopupSize(popup) => EngineEvent::PopupSize(*popup),
            Scripted::Cursor(cursor) => EngineEvent::CursorChange(*cursor),
            Scripted::Keyboard(mode) => EngineEvent::VirtualKeyboardRequested(*mode),
            Scripted::Loading {
                is_loading,
                can_go_back,
                can_go_forward,
            } => EngineEvent::LoadingStateChange {
                is_loading: *is_loading,
                can_go_back: *can_go_back,
                can_go_forward: *can_go_forward,
            },
            Scripted::LoadEnd(main) => EngineEvent::LoadEnd {
                is_main_frame: *main,
                http_status: 200,
            },
            Scripted::LoadError(code, url) => EngineEvent::LoadError {
                code: LoadErrorCode::from_raw(*code),
                text: "failed",
                failed_url: url,
            },
            Scripted::Title(title) => EngineEvent::TitleChange(title),
            Scripted::Address(url) => EngineEvent::AddressChange {
                url,
                is_main_frame: true,
            },
            Scripted::DocumentAvailable => EngineEvent::DocumentAvailable,
            Scripted::Popup { url, user_gesture } => EngineEvent::BeforePopup {
                target_url: url,
                user_gesture: *user_gesture,
            },
            Scripted::Alert(message) => EngineEvent::JsDialog {
                kind: JsDialogKind::Alert,
                message,
            },
            Scripted::Download(name) => EngineEvent::BeforeDownload {
                suggested_name: name,
            },
            Scripted::DownloadUpdated(percent, done) => EngineEvent::DownloadUpdated {
                percent_complete: *percent,
                is_complete: *done,
            },
            Scripted::Permission(kind) => EngineEvent::PermissionRequest {
                origin: "https://example.com",
                kind: *kind,
            },
            Scripted::ResourceLoad(ua) => EngineEvent::BeforeResourceLoad { user_agent: ua },
        }
    }
}

/// Everything the session asked the engine to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Bootstrap,
    Create(String),
    Close(bool),
    Move(i32, i32),
    Click { x: i32, y: i32, up: bool },
    Wheel { x: i32, y: i32, dx: i32, dy: i32 },
    Key(KeyEvent),
    SetFocus(bool),
    LoadUrl(String),
    Script(String),
    GoBack,
    Invalidate(PaintLayer),
    AudioMuted(bool),
}

#[derive(Default)]
pub struct MockEngine {
    pub running: bool,
    pub fail_create: bool,
    /// Deliver `AfterCreated` on the pump after `create_browser`.
    pub auto_create: bool,
    /// Deliver `BeforeClose` on the pump after `close_browser`.
    pub confirm_close: bool,
    pub close_requested: bool,
    pub queued: VecDeque<Scripted>,
    pub calls: Vec<Call>,
    pub responses: Vec<EventResponse>,
    pub history: Vec<String>,
    pub pumps: usize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            auto_create: true,
            confirm_close: true,
            ..Self::default()
        }
    }

    pub fn push(&mut self, event: Scripted) {
        self.queued.push_back(event);
    }

    pub fn scripts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Script(js) => Some(js.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn key_events(&self) -> Vec<KeyEvent> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Key(event) => Some(*event),
                _ => None,
            })
            .collect()
    }

    fn navigate(&mut self, url: &str) {
        self.history.push(url.to_string());
        self.push(Scripted::Address(url.to_string()));
        self.push(Scripted::Loading {
            is_loading: false,
            can_go_back: self.history.len() > 1,
            can_go_forward: false,
        });
    }
}

impl BrowserEngine for MockEngine {
    fn is_running(&self) -> bool {
        self.running
    }

    fn bootstrap(&mut self, _cache_dir: &Path) -> Result<()> {
        self.calls.push(Call::Bootstrap);
        self.running = true;
        Ok(())
    }

    fn create_browser(&mut self, request: &CreateRequest) -> Result<()> {
        if self.fail_create {
            return Err(BrowserError::CreationFailure("mock refused".to_string()));
        }
        self.calls.push(Call::Create(request.url.clone()));
        if self.auto_create {
            self.push(Scripted::AfterCreated);
            self.navigate(&request.url);
        }
        Ok(())
    }

    fn close_browser(&mut self, force: bool) {
        self.calls.push(Call::Close(force));
        self.close_requested = true;
        if self.confirm_close {
            self.push(Scripted::BeforeClose);
        }
    }

    fn pump(&mut self, sink: &mut dyn EngineEventSink) {
        self.pumps += 1;
        while let Some(event) = self.queued.pop_front() {
            let response = sink.on_event(event.as_event());
            self.responses.push(response);
        }
    }

    fn send_mouse_move(&mut self, event: &MouseEvent, _mouse_leave: bool) {
        self.calls.push(Call::Move(event.x, event.y));
    }

    fn send_mouse_click(&mut self, event: &MouseEvent, _button: MouseButton, mouse_up: bool, _count: u32) {
        self.calls.push(Call::Click {
            x: event.x,
            y: event.y,
            up: mouse_up,
        });
    }

    fn send_mouse_wheel(&mut self, event: &MouseEvent, delta_x: i32, delta_y: i32) {
        self.calls.push(Call::Wheel {
            x: event.x,
            y: event.y,
            dx: delta_x,
            dy: delta_y,
        });
    }

    fn send_key_event(&mut self, event: &KeyEvent) {
        self.calls.push(Call::Key(*event));
    }

    fn set_focus(&mut self, focus: bool) {
        self.calls.push(Call::SetFocus(focus));
    }

    fn load_url(&mut self, url: &str) {
        self.calls.push(Call::LoadUrl(url.to_string()));
        self.navigate(url);
    }

    fn execute_script(&mut self, script: &str) {
        self.calls.push(Call::Script(script.to_string()));
    }

    fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }

    fn can_go_forward(&self) -> bool {
        false
    }

    fn go_back(&mut self) {
        self.calls.push(Call::GoBack);
        if self.history.pop().is_some() {
            if let Some(previous) = self.history.last().cloned() {
                self.push(Scripted::Address(previous));
            }
        }
    }

    fn invalidate(&mut self, layer: PaintLayer) {
        self.calls.push(Call::Invalidate(layer));
    }

    fn set_audio_muted(&mut self, muted: bool) {
        self.calls.push(Call::AudioMuted(muted));
    }
}

/// Host double. Keyboard claim calls are recorded in `focus_log` so tests can
/// check their order relative to engine calls.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub notifications: Vec<(String, String)>,
    pub status_title: String,
    pub loading: bool,
    pub download_progress: Option<(i32, bool)>,
    pub keyboard_claimed: bool,
    pub focus_log: Vec<&'static str>,
    pub location: Option<LocationFix>,
    pub locale: HostLocale,
}

impl HostServices for RecordingHost {
    fn show_notification(&mut self, title: &str, body: &str) {
        self.notifications.push((title.to_string(), body.to_string()));
    }

    fn set_status_title(&mut self, title: &str) {
        self.status_title = title.to_string();
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_download_progress(&mut self, percent: i32, complete: bool) {
        self.download_progress = Some((percent, complete));
    }

    fn claim_keyboard_focus(&mut self) {
        self.keyboard_claimed = true;
        self.focus_log.push("claim");
    }

    fn release_keyboard_focus(&mut self) {
        self.keyboard_claimed = false;
        self.focus_log.push("release");
    }

    fn has_keyboard_focus(&self) -> bool {
        self.keyboard_claimed
    }

    fn bring_to_front(&mut self) {
        self.focus_log.push("front");
    }

    fn location(&self) -> Option<LocationFix> {
        self.location
    }

    fn locale(&self) -> HostLocale {
        self.locale
    }
}

/// Clock advanced by hand, and by `sleep`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

pub type TestSession = EmbeddedBrowserSession<MockEngine, CpuTexture, RecordingHost>;

pub struct Harness {
    pub engine: Rc<RefCell<MockEngine>>,
    pub clock: Rc<ManualClock>,
    pub session: TestSession,
    _cache: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> anyhow::Result<Self> {
        Self::with(SessionOptions::default(), MockEngine::new())
    }

    pub fn with(mut options: SessionOptions, engine: MockEngine) -> anyhow::Result<Self> {
        let cache = tempfile::tempdir()?;
        options.cache_dir = cache.path().join("cache");
        options.downloads.directory = cache.path().join("downloads");

        let engine = Rc::new(RefCell::new(engine));
        let clock = Rc::new(ManualClock::default());
        let session = SessionBuilder::new(options)
            .with_panel(PanelGeometry::new(0.0, 0.0, 800.0, 480.0))
            .with_band(PanelBand::new(0.0, 1.0)?)
            .with_clock(clock.clone())
            .initialize(Rc::clone(&engine), RecordingHost::default(), |surface| {
                Ok(CpuTexture::for_surface(surface))
            })?;

        Ok(Self {
            engine,
            clock,
            session,
            _cache: cache,
        })
    }

    /// Show the session and pump until the browser is live.
    pub fn live() -> anyhow::Result<Self> {
        let mut harness = Self::new()?;
        harness.session.set_visible(true);
        harness.session.update();
        anyhow::ensure!(
            harness.session.lifecycle_state() == SessionLifecycleState::Live,
            "browser did not come up"
        );
        harness.engine.borrow_mut().calls.clear();
        Ok(harness)
    }

    pub fn push(&self, event: Scripted) {
        self.engine.borrow_mut().push(event);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.engine.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.engine.borrow_mut().calls.clear();
    }
}
