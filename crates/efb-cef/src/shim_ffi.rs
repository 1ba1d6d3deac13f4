//! FFI bindings to the C++ CEF shim (`efb_cef_shim`).
//!
//! The shim is a dynamic library (for example `libefb_cef_shim.so` on Linux)
//! linked against the CEF runtime. It exposes a flat `extern "C"` API, and
//! reports every CEF client callback through one event callback, invoked
//! synchronously from `efb_cef_do_message_loop_work`.

use crate::error::{BrowserError, Result};
use libloading::{Library, Symbol};
use std::ffi::{c_char, c_int, c_void};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub type EfbCefBrowser = *mut c_void;

#[repr(C)]
pub struct EfbCefCreateConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub background_color: u32,
    /// Null when the engine default should be used.
    pub accept_language: *const c_char,
}

#[repr(C)]
pub struct EfbCefMouseEvent {
    pub x: i32,
    pub y: i32,
    pub modifiers: u32,
}

pub const EFB_MOUSE_LEFT: c_int = 0;
pub const EFB_MOUSE_MIDDLE: c_int = 1;
pub const EFB_MOUSE_RIGHT: c_int = 2;

pub const EFB_KEY_RAWKEYDOWN: c_int = 0;
pub const EFB_KEY_KEYUP: c_int = 2;
pub const EFB_KEY_CHAR: c_int = 3;

#[repr(C)]
pub struct EfbCefKeyEvent {
    pub kind: c_int,
    pub modifiers: u32,
    pub windows_key_code: c_int,
    pub native_key_code: c_int,
    pub is_system_key: c_int,
    pub character: u16,
    pub unmodified_character: u16,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct EfbCefRect {
    pub x: c_int,
    pub y: c_int,
    pub width: c_int,
    pub height: c_int,
}

pub const EFB_PAINT_VIEW: c_int = 0;
pub const EFB_PAINT_POPUP: c_int = 1;

/// Event tags. Which payload fields are meaningful depends on the tag.
pub const EFB_EVENT_AFTER_CREATED: u32 = 0;
pub const EFB_EVENT_BEFORE_CLOSE: u32 = 1;
/// `int_a` layer, `pixels`/`width`/`height`, `rects`/`rect_count`.
pub const EFB_EVENT_PAINT: u32 = 2;
/// `flag_a` shown.
pub const EFB_EVENT_POPUP_SHOW: u32 = 3;
/// `rects[0]` popup rect.
pub const EFB_EVENT_POPUP_SIZE: u32 = 4;
/// `int_a` cursor type.
pub const EFB_EVENT_CURSOR_CHANGE: u32 = 5;
/// `int_a` text input mode.
pub const EFB_EVENT_VIRTUAL_KEYBOARD: u32 = 6;
/// `flag_a` loading, `flag_b` can go back, `flag_c` can go forward.
pub const EFB_EVENT_LOADING_STATE: u32 = 7;
/// `flag_a` main frame, `int_a` HTTP status.
pub const EFB_EVENT_LOAD_END: u32 = 8;
/// `int_a` error code, `text_a` error text, `text_b` failed URL.
pub const EFB_EVENT_LOAD_ERROR: u32 = 9;
/// `text_a` title.
pub const EFB_EVENT_TITLE_CHANGE: u32 = 10;
/// `text_a` URL, `flag_a` main frame.
pub const EFB_EVENT_ADDRESS_CHANGE: u32 = 11;
pub const EFB_EVENT_DOCUMENT_AVAILABLE: u32 = 12;
/// `text_a` target URL, `flag_a` user gesture.
pub const EFB_EVENT_BEFORE_POPUP: u32 = 13;
/// `int_a` dialog type, `text_a` message.
pub const EFB_EVENT_JS_DIALOG: u32 = 14;
/// `text_a` suggested name.
pub const EFB_EVENT_BEFORE_DOWNLOAD: u32 = 15;
/// `int_a` percent, `flag_a` complete.
pub const EFB_EVENT_DOWNLOAD_UPDATED: u32 = 16;
/// `int_a` permission bits, `text_a` origin, `flag_a` set for media capture.
pub const EFB_EVENT_PERMISSION_REQUEST: u32 = 17;
/// `text_a` current User-Agent.
pub const EFB_EVENT_BEFORE_RESOURCE_LOAD: u32 = 18;

#[repr(C)]
pub struct EfbCefEvent {
    pub kind: u32,
    pub int_a: c_int,
    pub flag_a: c_int,
    pub flag_b: c_int,
    pub flag_c: c_int,
    pub text_a: *const c_char,
    pub text_b: *const c_char,
    pub pixels: *const u8,
    pub width: c_int,
    pub height: c_int,
    pub rects: *const EfbCefRect,
    pub rect_count: usize,
}

pub const EFB_RESPONSE_DEFAULT: c_int = 0;
pub const EFB_RESPONSE_HANDLED: c_int = 1;
pub const EFB_RESPONSE_DENY: c_int = 2;
/// `text` is the download path.
pub const EFB_RESPONSE_SAVE_TO: c_int = 3;
/// `text` is the User-Agent header.
pub const EFB_RESPONSE_SET_HEADER: c_int = 4;

#[repr(C)]
pub struct EfbCefResponse {
    pub action: c_int,
    /// Owned by the caller of the event callback; valid until the next event.
    pub text: *const c_char,
}

pub type EfbCefEventCallback =
    unsafe extern "C" fn(user_data: *mut c_void, event: *const EfbCefEvent, response: *mut EfbCefResponse);

type EfbCefIsRunningFn = unsafe extern "C" fn() -> c_int;
type EfbCefInitFn =
    unsafe extern "C" fn(*const c_char, *const c_char, *const c_char, c_int) -> c_int;
type EfbCefCreateBrowserFn = unsafe extern "C" fn(
    *const EfbCefCreateConfig,
    *const c_char,
    EfbCefEventCallback,
    *mut c_void,
) -> EfbCefBrowser;
type EfbCefCloseBrowserFn = unsafe extern "C" fn(EfbCefBrowser, c_int);
type EfbCefDoMessageLoopWorkFn = unsafe extern "C" fn();
type EfbCefSendMouseMoveFn = unsafe extern "C" fn(EfbCefBrowser, *const EfbCefMouseEvent, c_int);
type EfbCefSendMouseClickFn =
    unsafe extern "C" fn(EfbCefBrowser, *const EfbCefMouseEvent, c_int, c_int, c_int);
type EfbCefSendMouseWheelFn =
    unsafe extern "C" fn(EfbCefBrowser, *const EfbCefMouseEvent, c_int, c_int);
type EfbCefSendKeyEventFn = unsafe extern "C" fn(EfbCefBrowser, *const EfbCefKeyEvent);
type EfbCefSetFlagFn = unsafe extern "C" fn(EfbCefBrowser, c_int);
type EfbCefStringFn = unsafe extern "C" fn(EfbCefBrowser, *const c_char);
type EfbCefQueryFn = unsafe extern "C" fn(EfbCefBrowser) -> c_int;
type EfbCefActionFn = unsafe extern "C" fn(EfbCefBrowser);

/// Dynamically loaded `efb_cef_shim` library.
pub(crate) struct ShimLibrary {
    #[allow(dead_code)]
    lib: Library,
    pub efb_cef_is_running: EfbCefIsRunningFn,
    pub efb_cef_init: EfbCefInitFn,
    pub efb_cef_create_browser: EfbCefCreateBrowserFn,
    pub efb_cef_close_browser: EfbCefCloseBrowserFn,
    pub efb_cef_do_message_loop_work: EfbCefDoMessageLoopWorkFn,
    pub efb_cef_send_mouse_move: EfbCefSendMouseMoveFn,
    pub efb_cef_send_mouse_click: EfbCefSendMouseClickFn,
    pub efb_cef_send_mouse_wheel: EfbCefSendMouseWheelFn,
    pub efb_cef_send_key_event: EfbCefSendKeyEventFn,
    pub efb_cef_set_focus: EfbCefSetFlagFn,
    pub efb_cef_set_audio_muted: EfbCefSetFlagFn,
    pub efb_cef_invalidate: EfbCefSetFlagFn,
    pub efb_cef_load_url: EfbCefStringFn,
    pub efb_cef_execute_script: EfbCefStringFn,
    pub efb_cef_can_go_back: EfbCefQueryFn,
    pub efb_cef_can_go_forward: EfbCefQueryFn,
    pub efb_cef_go_back: EfbCefActionFn,
}

/// Resolve one symbol and copy the function pointer out.
///
/// # Safety
/// `T` must match the symbol's real signature.
unsafe fn symbol<T: Copy>(lib: &Library, name: &str) -> Result<T> {
    let symbol: Symbol<T> = unsafe { lib.get(name.as_bytes()) }
        .map_err(|e| BrowserError::SymbolNotFound(format!("{name}: {e}")))?;
    Ok(*symbol)
}

impl ShimLibrary {
    fn load(explicit: Option<&Path>) -> Result<Self> {
        let lib_name = Self::library_name();

        let search_dir = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("EFB_CEF_SHIM_PATH").map(PathBuf::from))
            .or_else(|| option_env!("EFB_CEF_SHIM_DEFAULT_DIR").map(PathBuf::from));

        let lib = if let Some(path) = search_dir {
            let lib_path = if path.is_file() {
                path
            } else {
                path.join(lib_name)
            };
            log::info!("loading efb_cef_shim from {}", lib_path.display());
            unsafe { Library::new(&lib_path) }
        } else {
            log::info!("loading efb_cef_shim from system path: {lib_name}");
            unsafe { Library::new(lib_name) }
        }
        .map_err(|e| BrowserError::LibraryLoad(format!("efb_cef_shim: {e}")))?;

        unsafe {
            Ok(Self {
                efb_cef_is_running: symbol(&lib, "efb_cef_is_running")?,
                efb_cef_init: symbol(&lib, "efb_cef_init")?,
                efb_cef_create_browser: symbol(&lib, "efb_cef_create_browser")?,
                efb_cef_close_browser: symbol(&lib, "efb_cef_close_browser")?,
                efb_cef_do_message_loop_work: symbol(&lib, "efb_cef_do_message_loop_work")?,
                efb_cef_send_mouse_move: symbol(&lib, "efb_cef_send_mouse_move")?,
                efb_cef_send_mouse_click: symbol(&lib, "efb_cef_send_mouse_click")?,
                efb_cef_send_mouse_wheel: symbol(&lib, "efb_cef_send_mouse_wheel")?,
                efb_cef_send_key_event: symbol(&lib, "efb_cef_send_key_event")?,
                efb_cef_set_focus: symbol(&lib, "efb_cef_set_focus")?,
                efb_cef_set_audio_muted: symbol(&lib, "efb_cef_set_audio_muted")?,
                efb_cef_invalidate: symbol(&lib, "efb_cef_invalidate")?,
                efb_cef_load_url: symbol(&lib, "efb_cef_load_url")?,
                efb_cef_execute_script: symbol(&lib, "efb_cef_execute_script")?,
                efb_cef_can_go_back: symbol(&lib, "efb_cef_can_go_back")?,
                efb_cef_can_go_forward: symbol(&lib, "efb_cef_can_go_forward")?,
                efb_cef_go_back: symbol(&lib, "efb_cef_go_back")?,
                lib,
            })
        }
    }

    #[cfg(target_os = "windows")]
    fn library_name() -> &'static str {
        "efb_cef_shim.dll"
    }

    #[cfg(target_os = "macos")]
    fn library_name() -> &'static str {
        "libefb_cef_shim.dylib"
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    fn library_name() -> &'static str {
        "libefb_cef_shim.so"
    }
}

static SHIM_LIBRARY: OnceLock<Arc<ShimLibrary>> = OnceLock::new();

/// Get the globally loaded shim library instance. `explicit` only matters
/// for the first successful load.
pub(crate) fn get_shim_library(explicit: Option<&Path>) -> Result<Arc<ShimLibrary>> {
    if let Some(lib) = SHIM_LIBRARY.get() {
        return Ok(Arc::clone(lib));
    }

    let lib = ShimLibrary::load(explicit).map(Arc::new)?;
    // In case of concurrent initialization, prefer the one that won the race.
    if SHIM_LIBRARY.set(Arc::clone(&lib)).is_err() {
        if let Some(existing) = SHIM_LIBRARY.get() {
            return Ok(Arc::clone(existing));
        }
    }
    Ok(lib)
}
