//! Off-screen Chromium (CEF) browser composited into a cockpit tablet panel.
//!
//! The engine renders windowless into BGRA paint buffers, which are blitted
//! into a power-of-two wgpu texture and drawn as a quad over a horizontal
//! band of the host panel. Host mouse and keyboard input is mapped back into
//! browser pixels and forwarded, and keyboard focus is arbitrated between the
//! host and the page.
//!
//! [`EmbeddedBrowserSession`] ties everything together. It is generic over
//! the [`BrowserEngine`], the [`TextureTarget`] and the [`HostServices`], so
//! it can run against the native shim, a wgpu texture and a real host, or
//! against in-memory doubles in tests.
//!
//! # Features
//!
//! - `cef-shim` (default): [`ShimEngine`], which loads `efb_cef_shim` at runtime

mod compositor;
mod engine;
mod error;
mod focus;
mod frame;
mod geometry;
mod host;
mod input;
pub mod keymap;
mod lifecycle;
mod policy;
pub mod scripts;
mod session;
mod texture;
mod variant;

#[cfg(feature = "cef-shim")]
mod shim_ffi;

#[cfg(feature = "cef-shim")]
mod shim_backend;

pub use compositor::{BlitRegion, CpuTexture, PaintOutcome, SurfaceCompositor, TextureTarget};
pub use engine::{
    BrowserEngine, CursorKind, EngineCommand, EngineEvent, EngineEventSink, EventResponse,
    JsDialogKind, LoadErrorCode, NavigationState, PermissionKind, TextInputMode,
};
pub use error::{BrowserError, Result};
pub use focus::{FocusAction, FocusArbiter, FocusState};
pub use frame::{DirtyRect, PaintFrame, PaintLayer, PopupGeometry};
pub use geometry::{
    from_browser_pixels, is_inside_band, to_browser_pixels, DrawQuad, PanelBand, PanelGeometry,
    QuadVertex, SurfaceDescriptor, FIXED_ASPECT_RATIO,
};
pub use host::{accept_language, HostLocale, HostServices, LocationFix};
pub use input::{
    ClickPhase, HostKeyFlags, InputRouter, KeyEvent, KeyEventKind, KeyStroke, KeyTranslation,
    Modifiers, MouseButton, MouseEvent,
};
pub use lifecycle::{
    ensure_engine_running, prepare_cache_dir, Clock, CreateRequest, LifecycleController,
    SessionLifecycleState, ShutdownOutcome, ShutdownTiming, SystemClock,
};
pub use policy::{rewrite_user_agent, truncate_title, DownloadPolicy, BROWSER_UA_TOKEN};
pub use session::{
    BackOutcome, EmbeddedBrowserSession, SessionBuilder, SessionCommand, SessionCore,
    SessionOptions,
};
pub use texture::WgpuTextureTarget;
pub use variant::{BackAction, BackButton, DeviceVariant, UnknownVariant, VariantProfile};

#[cfg(feature = "cef-shim")]
pub use shim_backend::ShimEngine;
