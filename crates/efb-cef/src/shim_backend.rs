//! [`BrowserEngine`] backed by the C++ shim.

use crate::engine::{
    BrowserEngine, CursorKind, EngineEvent, EngineEventSink, EventResponse, JsDialogKind,
    LoadErrorCode, PermissionKind, TextInputMode,
};
use crate::error::{BrowserError, Result};
use crate::frame::{DirtyRect, PaintFrame, PaintLayer, PopupGeometry};
use crate::input::{KeyEvent, KeyEventKind, MouseButton, MouseEvent};
use crate::lifecycle::CreateRequest;
use crate::shim_ffi::*;
use std::borrow::Cow;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// CEF may only be initialized once per process.
static BOOTSTRAPPED: AtomicBool = AtomicBool::new(false);

const CT_HAND: c_int = 2;
const CT_IBEAM: c_int = 3;
const CT_VERTICALTEXT: c_int = 30;

const TEXT_INPUT_MODE_NONE: c_int = 1;
const TEXT_INPUT_MODE_TEXT: c_int = 2;
const TEXT_INPUT_MODE_NUMERIC: c_int = 6;
const TEXT_INPUT_MODE_DECIMAL: c_int = 7;

const PERMISSION_GEOLOCATION: u32 = 1 << 8;

fn log_dir(cache_dir: &Path) -> PathBuf {
    if let Ok(dir) = std::env::var("EFB_CEF_LOG_DIR") {
        return PathBuf::from(dir);
    }
    cache_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn c_string(value: &str) -> Result<CString> {
    CString::new(value).map_err(|e| BrowserError::CreationFailure(e.to_string()))
}

fn path_c_string(path: &Path) -> Result<CString> {
    c_string(&path.to_string_lossy())
}

/// State reachable from the shim's event callback.
struct EventContext {
    /// Set only for the duration of [`ShimEngine::pump`].
    sink: Option<*mut (dyn EngineEventSink + 'static)>,
    /// Backs the `text` of the last response.
    response_text: Option<CString>,
    closed: bool,
}

/// Headless CEF browser driven through `efb_cef_shim`.
///
/// Must stay on the thread that bootstrapped CEF.
pub struct ShimEngine {
    library: Arc<ShimLibrary>,
    browser: EfbCefBrowser,
    context: *mut EventContext,
}

impl ShimEngine {
    /// Load the shim from `EFB_CEF_SHIM_PATH` or the system library path.
    /// No browser exists until [`BrowserEngine::create_browser`].
    pub fn new() -> Result<Self> {
        Self::with_library_path(None)
    }

    /// Load the shim from `path` (a file or a directory containing it),
    /// falling back to [`ShimEngine::new`]'s search.
    pub fn with_library_path(path: Option<&Path>) -> Result<Self> {
        let library = get_shim_library(path)?;
        let context = Box::into_raw(Box::new(EventContext {
            sink: None,
            response_text: None,
            closed: false,
        }));
        Ok(Self {
            library,
            browser: ptr::null_mut(),
            context,
        })
    }

    fn browser(&self) -> Option<EfbCefBrowser> {
        // SAFETY: context is only freed in Drop.
        let closed = unsafe { (*self.context).closed };
        (!self.browser.is_null() && !closed).then_some(self.browser)
    }

    fn send_string(&self, f: impl FnOnce(EfbCefBrowser, *const c_char), value: &str) {
        let Some(browser) = self.browser() else {
            return;
        };
        match CString::new(value) {
            Ok(value) => f(browser, value.as_ptr()),
            Err(e) => log::warn!("dropping string with interior NUL: {e}"),
        }
    }
}

fn mouse_event(event: &MouseEvent) -> EfbCefMouseEvent {
    EfbCefMouseEvent {
        x: event.x,
        y: event.y,
        modifiers: event.modifiers.bits(),
    }
}

impl BrowserEngine for ShimEngine {
    fn is_running(&self) -> bool {
        BOOTSTRAPPED.load(Ordering::Acquire) || unsafe { (self.library.efb_cef_is_running)() } != 0
    }

    fn bootstrap(&mut self, cache_dir: &Path) -> Result<()> {
        if BOOTSTRAPPED.load(Ordering::Acquire) {
            return Ok(());
        }

        let cache_c = path_c_string(cache_dir)?;
        let log_file_c = path_c_string(&log_dir(cache_dir).join("efb_cef.log"))?;

        let init_result = unsafe {
            (self.library.efb_cef_init)(
                cache_c.as_ptr(),
                cache_c.as_ptr(),
                log_file_c.as_ptr(),
                1, // external_message_pump
            )
        };

        if init_result == 0 {
            return Err(BrowserError::CreationFailure(
                "efb_cef_init returned failure".to_string(),
            ));
        }

        BOOTSTRAPPED.store(true, Ordering::Release);
        log::info!("CEF initialized, cache at {}", cache_dir.display());
        Ok(())
    }

    fn create_browser(&mut self, request: &CreateRequest) -> Result<()> {
        let url_c = c_string(&request.url)?;
        let language_c = request.accept_language.as_deref().map(c_string).transpose()?;

        let config = EfbCefCreateConfig {
            width: request.width,
            height: request.height,
            frame_rate: request.frame_rate,
            background_color: request.background_color,
            accept_language: language_c.as_ref().map_or(ptr::null(), |c| c.as_ptr()),
        };

        unsafe {
            (*self.context).closed = false;
        }

        let browser = unsafe {
            (self.library.efb_cef_create_browser)(
                &config,
                url_c.as_ptr(),
                on_shim_event,
                self.context.cast::<c_void>(),
            )
        };

        if browser.is_null() {
            return Err(BrowserError::CreationFailure(
                "efb_cef_create_browser returned null".to_string(),
            ));
        }

        self.browser = browser;
        Ok(())
    }

    fn close_browser(&mut self, force: bool) {
        if let Some(browser) = self.browser() {
            unsafe { (self.library.efb_cef_close_browser)(browser, c_int::from(force)) };
        }
    }

    fn pump(&mut self, sink: &mut dyn EngineEventSink) {
        let sink: *mut (dyn EngineEventSink + '_) = sink;
        // SAFETY: the pointer is cleared before this borrow ends, and the shim
        // only invokes the callback from inside do_message_loop_work.
        let sink: *mut (dyn EngineEventSink + 'static) = unsafe { std::mem::transmute(sink) };
        unsafe {
            (*self.context).sink = Some(sink);
            (self.library.efb_cef_do_message_loop_work)();
            (*self.context).sink = None;
        }
        if unsafe { (*self.context).closed } {
            self.browser = ptr::null_mut();
        }
    }

    fn send_mouse_move(&mut self, event: &MouseEvent, mouse_leave: bool) {
        if let Some(browser) = self.browser() {
            let ffi_event = mouse_event(event);
            unsafe {
                (self.library.efb_cef_send_mouse_move)(browser, &ffi_event, c_int::from(mouse_leave))
            };
        }
    }

    fn send_mouse_click(
        &mut self,
        event: &MouseEvent,
        button: MouseButton,
        mouse_up: bool,
        click_count: u32,
    ) {
        let Some(browser) = self.browser() else {
            return;
        };
        let button = match button {
            MouseButton::Left => EFB_MOUSE_LEFT,
            MouseButton::Middle => EFB_MOUSE_MIDDLE,
            MouseButton::Right => EFB_MOUSE_RIGHT,
        };
        let ffi_event = mouse_event(event);
        unsafe {
            (self.library.efb_cef_send_mouse_click)(
                browser,
                &ffi_event,
                button,
                c_int::from(mouse_up),
                click_count.min(c_int::MAX as u32) as c_int,
            );
        }
    }

    fn send_mouse_wheel(&mut self, event: &MouseEvent, delta_x: i32, delta_y: i32) {
        if let Some(browser) = self.browser() {
            let ffi_event = mouse_event(event);
            unsafe { (self.library.efb_cef_send_mouse_wheel)(browser, &ffi_event, delta_x, delta_y) };
        }
    }

    fn send_key_event(&mut self, event: &KeyEvent) {
        let Some(browser) = self.browser() else {
            return;
        };
        let kind = match event.kind {
            KeyEventKind::KeyDown => EFB_KEY_RAWKEYDOWN,
            KeyEventKind::KeyUp => EFB_KEY_KEYUP,
            KeyEventKind::Char => EFB_KEY_CHAR,
        };
        let ffi_event = EfbCefKeyEvent {
            kind,
            modifiers: event.modifiers.bits(),
            windows_key_code: event.windows_key_code,
            native_key_code: event.native_key_code,
            is_system_key: c_int::from(event.is_system_key),
            character: event.character,
            unmodified_character: event.unmodified_character,
        };
        unsafe { (self.library.efb_cef_send_key_event)(browser, &ffi_event) };
    }

    fn set_focus(&mut self, focus: bool) {
        if let Some(browser) = self.browser() {
            unsafe { (self.library.efb_cef_set_focus)(browser, c_int::from(focus)) };
        }
    }

    fn load_url(&mut self, url: &str) {
        let load = self.library.efb_cef_load_url;
        self.send_string(|browser, url| unsafe { load(browser, url) }, url);
    }

    fn execute_script(&mut self, script: &str) {
        let execute = self.library.efb_cef_execute_script;
        self.send_string(|browser, script| unsafe { execute(browser, script) }, script);
    }

    fn can_go_back(&self) -> bool {
        self.browser()
            .is_some_and(|browser| unsafe { (self.library.efb_cef_can_go_back)(browser) } != 0)
    }

    fn can_go_forward(&self) -> bool {
        self.browser()
            .is_some_and(|browser| unsafe { (self.library.efb_cef_can_go_forward)(browser) } != 0)
    }

    fn go_back(&mut self) {
        if let Some(browser) = self.browser() {
            unsafe { (self.library.efb_cef_go_back)(browser) };
        }
    }

    fn invalidate(&mut self, layer: PaintLayer) {
        if let Some(browser) = self.browser() {
            let layer = match layer {
                PaintLayer::Main => EFB_PAINT_VIEW,
                PaintLayer::Popup => EFB_PAINT_POPUP,
            };
            unsafe { (self.library.efb_cef_invalidate)(browser, layer) };
        }
    }

    fn set_audio_muted(&mut self, muted: bool) {
        if let Some(browser) = self.browser() {
            unsafe { (self.library.efb_cef_set_audio_muted)(browser, c_int::from(muted)) };
        }
    }
}

impl Drop for ShimEngine {
    fn drop(&mut self) {
        if self.browser().is_some() {
            // CEF still holds the callback context; it has to outlive us.
            log::warn!("ShimEngine dropped with a live browser, leaking its event context");
            self.close_browser(true);
            return;
        }
        // SAFETY: allocated in new(), and no browser can call back any more.
        drop(unsafe { Box::from_raw(self.context) });
    }
}

unsafe extern "C" fn on_shim_event(
    user_data: *mut c_void,
    event: *const EfbCefEvent,
    response: *mut EfbCefResponse,
) {
    if user_data.is_null() || event.is_null() || response.is_null() {
        return;
    }
    // SAFETY: user_data is the EventContext registered in create_browser.
    let context = unsafe { &mut *user_data.cast::<EventContext>() };
    let event = unsafe { &*event };
    let response = unsafe { &mut *response };

    response.action = EFB_RESPONSE_DEFAULT;
    response.text = ptr::null();

    if event.kind == EFB_EVENT_BEFORE_CLOSE {
        context.closed = true;
    }

    let Some(sink) = context.sink else {
        log::debug!("dropping shim event {} outside of pump", event.kind);
        return;
    };

    // SAFETY: sink is valid while pump() runs, which is the only time it is set.
    let answer = catch_unwind(AssertUnwindSafe(|| unsafe { dispatch(event, &mut *sink) }));
    match answer {
        Ok(answer) => respond(context, answer, response),
        Err(_) => log::error!("panic while handling shim event {}", event.kind),
    }
}

fn respond(context: &mut EventContext, answer: EventResponse, response: &mut EfbCefResponse) {
    let (action, text) = match answer {
        EventResponse::Default => (EFB_RESPONSE_DEFAULT, None),
        EventResponse::Handled => (EFB_RESPONSE_HANDLED, None),
        EventResponse::Deny => (EFB_RESPONSE_DENY, None),
        EventResponse::SaveTo(path) => (EFB_RESPONSE_SAVE_TO, Some(path.to_string_lossy().into_owned())),
        EventResponse::SetUserAgent(ua) => (EFB_RESPONSE_SET_HEADER, Some(ua)),
    };

    context.response_text = match text.map(CString::new) {
        None => None,
        Some(Ok(text)) => Some(text),
        Some(Err(e)) => {
            log::warn!("response text has an interior NUL, using default: {e}");
            return;
        }
    };
    response.action = action;
    response.text = context
        .response_text
        .as_ref()
        .map_or(ptr::null(), |text| text.as_ptr());
}

/// # Safety
/// `ptr` must be null or a NUL-terminated string valid for `'a`.
unsafe fn text<'a>(ptr: *const c_char) -> Cow<'a, str> {
    if ptr.is_null() {
        Cow::Borrowed("")
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy()
    }
}

fn dimension(value: c_int) -> u32 {
    value.max(0) as u32
}

/// # Safety
/// Pointers in `event` must be valid as documented for its tag.
unsafe fn dispatch(event: &EfbCefEvent, sink: &mut dyn EngineEventSink) -> EventResponse {
    let text_a = unsafe { text(event.text_a) };
    let text_b = unsafe { text(event.text_b) };
    let rects: &[EfbCefRect] = if event.rects.is_null() || event.rect_count == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(event.rects, event.rect_count) }
    };

    let engine_event = match event.kind {
        EFB_EVENT_AFTER_CREATED => EngineEvent::AfterCreated,
        EFB_EVENT_BEFORE_CLOSE => EngineEvent::BeforeClose,
        EFB_EVENT_PAINT => {
            let layer = if event.int_a == EFB_PAINT_POPUP {
                PaintLayer::Popup
            } else {
                PaintLayer::Main
            };
            let (width, height) = (dimension(event.width), dimension(event.height));
            let len = width as usize * height as usize * 4;
            let buffer: &[u8] = if event.pixels.is_null() {
                &[]
            } else {
                unsafe { slice::from_raw_parts(event.pixels, len) }
            };
            let dirty_rects = rects
                .iter()
                .map(|r| {
                    DirtyRect::new(
                        dimension(r.x),
                        dimension(r.y),
                        dimension(r.width),
                        dimension(r.height),
                        layer,
                    )
                })
                .collect();
            EngineEvent::Paint(PaintFrame {
                layer,
                buffer,
                width,
                height,
                dirty_rects,
            })
        }
        EFB_EVENT_POPUP_SHOW => EngineEvent::PopupShow(event.flag_a != 0),
        EFB_EVENT_POPUP_SIZE => {
            let Some(rect) = rects.first() else {
                return EventResponse::Default;
            };
            EngineEvent::PopupSize(PopupGeometry {
                x: rect.x,
                y: rect.y,
                width: dimension(rect.width),
                height: dimension(rect.height),
            })
        }
        EFB_EVENT_CURSOR_CHANGE => EngineEvent::CursorChange(match event.int_a {
            CT_HAND => CursorKind::Hand,
            CT_IBEAM | CT_VERTICALTEXT => CursorKind::Text,
            _ => CursorKind::Default,
        }),
        EFB_EVENT_VIRTUAL_KEYBOARD => EngineEvent::VirtualKeyboardRequested(match event.int_a {
            TEXT_INPUT_MODE_NONE => TextInputMode::None,
            TEXT_INPUT_MODE_TEXT => TextInputMode::Text,
            TEXT_INPUT_MODE_NUMERIC | TEXT_INPUT_MODE_DECIMAL => TextInputMode::Numeric,
            other => TextInputMode::Other(other.max(0) as u32),
        }),
        EFB_EVENT_LOADING_STATE => EngineEvent::LoadingStateChange {
            is_loading: event.flag_a != 0,
            can_go_back: event.flag_b != 0,
            can_go_forward: event.flag_c != 0,
        },
        EFB_EVENT_LOAD_END => EngineEvent::LoadEnd {
            is_main_frame: event.flag_a != 0,
            http_status: event.int_a,
        },
        EFB_EVENT_LOAD_ERROR => EngineEvent::LoadError {
            code: LoadErrorCode::from_raw(event.int_a),
            text: &text_a,
            failed_url: &text_b,
        },
        EFB_EVENT_TITLE_CHANGE => EngineEvent::TitleChange(&text_a),
        EFB_EVENT_ADDRESS_CHANGE => EngineEvent::AddressChange {
            url: &text_a,
            is_main_frame: event.flag_a != 0,
        },
        EFB_EVENT_DOCUMENT_AVAILABLE => EngineEvent::DocumentAvailable,
        EFB_EVENT_BEFORE_POPUP => EngineEvent::BeforePopup {
            target_url: &text_a,
            user_gesture: event.flag_a != 0,
        },
        EFB_EVENT_JS_DIALOG => EngineEvent::JsDialog {
            kind: match event.int_a {
                1 => JsDialogKind::Confirm,
                2 => JsDialogKind::Prompt,
                _ => JsDialogKind::Alert,
            },
            message: &text_a,
        },
        EFB_EVENT_BEFORE_DOWNLOAD => EngineEvent::BeforeDownload {
            suggested_name: &text_a,
        },
        EFB_EVENT_DOWNLOAD_UPDATED => EngineEvent::DownloadUpdated {
            percent_complete: event.int_a,
            is_complete: event.flag_a != 0,
        },
        EFB_EVENT_PERMISSION_REQUEST => {
            let bits = event.int_a as u32;
            let kind = if event.flag_a != 0 {
                PermissionKind::Media
            } else if bits & PERMISSION_GEOLOCATION != 0 {
                PermissionKind::Geolocation
            } else {
                PermissionKind::Other(bits)
            };
            EngineEvent::PermissionRequest {
                origin: &text_a,
                kind,
            }
        }
        EFB_EVENT_BEFORE_RESOURCE_LOAD => EngineEvent::BeforeResourceLoad {
            user_agent: &text_a,
        },
        unknown => {
            log::debug!("ignoring unknown shim event {unknown}");
            return EventResponse::Default;
        }
    };

    sink.on_event(engine_event)
}
