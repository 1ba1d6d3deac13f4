//! The seam between the session and a browser engine.
//!
//! An engine does nothing unless [`BrowserEngine::pump`] is called. Every
//! callback the engine has queued is delivered to the sink during that call,
//! on the caller's thread, as one [`EngineEvent`]. The sink must not call
//! back into the engine from inside `on_event`; it answers through the
//! returned [`EventResponse`] or queues an [`EngineCommand`] for later.

use crate::error::Result;
use crate::frame::{PaintFrame, PaintLayer, PopupGeometry};
use crate::input::{KeyEvent, MouseButton, MouseEvent};
use crate::lifecycle::CreateRequest;
use std::path::{Path, PathBuf};

/// Mouse cursor the page asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorKind {
    #[default]
    Default,
    Hand,
    Text,
}

/// Input mode reported with a virtual keyboard request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputMode {
    None,
    Text,
    Numeric,
    Other(u32),
}

impl TextInputMode {
    pub fn wants_keyboard(self) -> bool {
        self != TextInputMode::None
    }
}

/// Why a page load failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorCode {
    /// The load was cancelled, usually by navigating away.
    Aborted,
    Other(i32),
}

impl LoadErrorCode {
    /// Map a net error code (`ERR_ABORTED` is -3).
    pub fn from_raw(code: i32) -> Self {
        if code == -3 {
            LoadErrorCode::Aborted
        } else {
            LoadErrorCode::Other(code)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsDialogKind {
    Alert,
    Confirm,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Geolocation,
    Media,
    Other(u32),
}

/// Mirror of the engine's navigation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub current_url: String,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub is_loading: bool,
}

/// Everything an engine reports while being pumped.
#[derive(Debug, Clone)]
pub enum EngineEvent<'a> {
    /// The browser requested by `create_browser` now exists.
    AfterCreated,
    /// The browser is gone; its handle must not be used again.
    BeforeClose,
    Paint(PaintFrame<'a>),
    PopupShow(bool),
    PopupSize(PopupGeometry),
    CursorChange(CursorKind),
    VirtualKeyboardRequested(TextInputMode),
    LoadingStateChange {
        is_loading: bool,
        can_go_back: bool,
        can_go_forward: bool,
    },
    LoadEnd {
        is_main_frame: bool,
        http_status: i32,
    },
    LoadError {
        code: LoadErrorCode,
        text: &'a str,
        failed_url: &'a str,
    },
    TitleChange(&'a str),
    AddressChange {
        url: &'a str,
        is_main_frame: bool,
    },
    DocumentAvailable,
    /// `window.open` or a `target=_blank` link.
    BeforePopup {
        target_url: &'a str,
        user_gesture: bool,
    },
    JsDialog {
        kind: JsDialogKind,
        message: &'a str,
    },
    BeforeDownload {
        suggested_name: &'a str,
    },
    DownloadUpdated {
        percent_complete: i32,
        is_complete: bool,
    },
    PermissionRequest {
        origin: &'a str,
        kind: PermissionKind,
    },
    BeforeResourceLoad {
        user_agent: &'a str,
    },
}

/// The sink's answer to an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventResponse {
    /// Let the engine do what it would do on its own.
    #[default]
    Default,
    /// Handled here; the engine must not run its own handling
    /// (no native dialog, no popup window).
    Handled,
    /// Refuse a permission or cancel a download.
    Deny,
    /// Save an accepted download to this path.
    SaveTo(PathBuf),
    /// Send this User-Agent header instead.
    SetUserAgent(String),
}

/// Receives engine callbacks during [`BrowserEngine::pump`].
pub trait EngineEventSink {
    fn on_event(&mut self, event: EngineEvent<'_>) -> EventResponse;
}

/// Off-screen browser engine with an explicitly pumped message loop.
pub trait BrowserEngine {
    /// Whether the host process already runs an initialized engine.
    fn is_running(&self) -> bool;

    /// Initialize the engine for windowless rendering. Called at most once
    /// per process, and never paired with a shutdown.
    fn bootstrap(&mut self, cache_dir: &Path) -> Result<()>;

    /// Ask for a browser. Creation completes asynchronously with
    /// [`EngineEvent::AfterCreated`].
    fn create_browser(&mut self, request: &CreateRequest) -> Result<()>;

    /// Ask the browser to close. Confirmation arrives as
    /// [`EngineEvent::BeforeClose`].
    fn close_browser(&mut self, force: bool);

    /// Run one iteration of the message loop, delivering queued callbacks to `sink`.
    fn pump(&mut self, sink: &mut dyn EngineEventSink);

    fn send_mouse_move(&mut self, event: &MouseEvent, mouse_leave: bool);
    fn send_mouse_click(
        &mut self,
        event: &MouseEvent,
        button: MouseButton,
        mouse_up: bool,
        click_count: u32,
    );
    fn send_mouse_wheel(&mut self, event: &MouseEvent, delta_x: i32, delta_y: i32);
    fn send_key_event(&mut self, event: &KeyEvent);

    fn set_focus(&mut self, focus: bool);
    fn load_url(&mut self, url: &str);
    fn execute_script(&mut self, script: &str);
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
    fn go_back(&mut self);
    fn invalidate(&mut self, layer: PaintLayer);
    fn set_audio_muted(&mut self, muted: bool);
}

/// Work the session wants done once the current pump returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    LoadUrl(String),
    ExecuteScript(String),
    SetFocus(bool),
    Invalidate(PaintLayer),
    SetAudioMuted(bool),
}

impl EngineCommand {
    pub fn apply<E: BrowserEngine + ?Sized>(self, engine: &mut E) {
        match self {
            EngineCommand::LoadUrl(url) => engine.load_url(&url),
            EngineCommand::ExecuteScript(script) => engine.execute_script(&script),
            EngineCommand::SetFocus(focus) => engine.set_focus(focus),
            EngineCommand::Invalidate(layer) => engine.invalidate(layer),
            EngineCommand::SetAudioMuted(muted) => engine.set_audio_muted(muted),
        }
    }
}
