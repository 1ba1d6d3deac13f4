//! One embedded browser drawn into a panel band.
//!
//! [`EmbeddedBrowserSession`] owns the texture, the focus and lifecycle state
//! machines and the navigation mirror. The engine is shared through
//! `Rc<RefCell<_>>` because the host keeps one engine per process, while
//! engine callbacks land in [`SessionCore`], which the session lends to
//! [`BrowserEngine::pump`] as the event sink.
//!
//! Everything here runs on the host's main thread.

use crate::compositor::{SurfaceCompositor, TextureTarget};
use crate::engine::{
    BrowserEngine, CursorKind, EngineCommand, EngineEvent, EngineEventSink, EventResponse,
    JsDialogKind, LoadErrorCode, NavigationState, PermissionKind,
};
use crate::error::{BrowserError, Result};
use crate::focus::{FocusAction, FocusArbiter};
use crate::frame::PaintLayer;
use crate::geometry::{
    is_inside_band, to_browser_pixels, DrawQuad, PanelBand, PanelGeometry, SurfaceDescriptor,
};
use crate::host::{accept_language, HostServices};
use crate::input::{ClickPhase, HostKeyFlags, InputRouter, KeyTranslation};
use crate::lifecycle::{
    ensure_engine_running, prepare_cache_dir, Clock, CreateRequest, LifecycleController,
    SessionLifecycleState, ShutdownOutcome, ShutdownTiming, SystemClock,
};
use crate::policy::{rewrite_user_agent, truncate_title, DownloadPolicy};
use crate::scripts;
use crate::variant::{BackAction, BackButton, DeviceVariant, VariantProfile};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

const CREATE_FAILED_TITLE: &str = "Error creating browser";
const CREATE_FAILED_BODY: &str =
    "An error occurred while starting the browser.\nPlease check for plugin updates and try again.";

/// Tunables for a session, usually derived from the user configuration.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub homepage: String,
    pub audio_muted: bool,
    /// Wheel delta per scroll tick.
    pub scroll_speed: i32,
    pub frame_rate: u32,
    /// `Accept-Language` override; empty uses the host locale.
    pub forced_language: String,
    /// User-Agent override; empty rewrites the engine default.
    pub user_agent: String,
    pub hide_addressbar: bool,
    /// Panels narrower than this are rendered upscaled. 0 disables.
    pub minimum_width: u32,
    /// How long a key must be held before it auto-repeats.
    pub key_repeat_delay: Duration,
    /// Interval between aircraft position pushes to the page.
    pub location_interval: Duration,
    pub cache_dir: PathBuf,
    pub downloads: DownloadPolicy,
    pub key_translation: KeyTranslation,
    pub shutdown: ShutdownTiming,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            homepage: "https://www.google.com".to_string(),
            audio_muted: false,
            scroll_speed: 5,
            frame_rate: 25,
            forced_language: String::new(),
            user_agent: String::new(),
            hide_addressbar: false,
            minimum_width: 0,
            key_repeat_delay: Duration::from_millis(300),
            location_interval: Duration::from_secs(1),
            cache_dir: PathBuf::from("cache"),
            downloads: DownloadPolicy::default(),
            key_translation: KeyTranslation::default(),
            shutdown: ShutdownTiming::default(),
        }
    }
}

/// Work queued while the engine is being pumped, run in order afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Engine(EngineCommand),
    Focus(FocusAction),
}

/// Result of [`EmbeddedBrowserSession::press_back`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// Navigated back in the page history.
    WentBack,
    /// The host should show the device home screen.
    Home,
    /// The host should hide the browser and show the device home screen.
    HideAndHome,
}

/// Configures and creates an [`EmbeddedBrowserSession`].
///
/// ```no_run
/// # use efb_cef::*;
/// # fn run<E: BrowserEngine, H: HostServices>(engine: std::rc::Rc<std::cell::RefCell<E>>, host: H) -> Result<()> {
/// let session = SessionBuilder::new(SessionOptions::default())
///     .with_variant(DeviceVariant::Zibo738)
///     .with_panel(PanelGeometry::new(0.0, 0.0, 800.0, 480.0))
///     .initialize(engine, host, |surface| Ok(CpuTexture::for_surface(surface)))?;
/// # let _ = session;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    options: SessionOptions,
    variant: DeviceVariant,
    band: Option<PanelBand>,
    panel: Option<PanelGeometry>,
    clock: Option<Rc<dyn Clock>>,
}

impl SessionBuilder {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            variant: DeviceVariant::Generic,
            band: None,
            panel: None,
            clock: None,
        }
    }

    pub fn with_variant(mut self, variant: DeviceVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Override the band that would otherwise come from the variant.
    pub fn with_band(mut self, band: PanelBand) -> Self {
        self.band = Some(band);
        self
    }

    pub fn with_panel(mut self, panel: PanelGeometry) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Size the surface, allocate the texture and hand back an idle session.
    /// The browser itself is created the first time the session becomes
    /// visible.
    pub fn initialize<E, T, H, F>(
        self,
        engine: Rc<RefCell<E>>,
        host: H,
        make_texture: F,
    ) -> Result<EmbeddedBrowserSession<E, T, H>>
    where
        E: BrowserEngine + ?Sized,
        T: TextureTarget,
        H: HostServices,
        F: FnOnce(&SurfaceDescriptor) -> Result<T>,
    {
        let panel = self.panel.ok_or(BrowserError::ConfigurationMissing)?;
        let profile = self.variant.profile();
        let band = self.band.unwrap_or(profile.band);
        let surface =
            SurfaceDescriptor::from_panel(panel.width, panel.height, self.options.minimum_width)?;
        let texture = make_texture(&surface)?;

        log::info!(
            "{} panel {}x{} -> browser {}x{} (texture {}x{})",
            self.variant,
            panel.width,
            panel.height,
            surface.browser_width,
            surface.browser_height,
            surface.texture_width,
            surface.texture_height
        );

        let clock = self
            .clock
            .unwrap_or_else(|| Rc::new(SystemClock::new()) as Rc<dyn Clock>);
        let router = InputRouter::new(self.options.key_translation);

        Ok(EmbeddedBrowserSession {
            engine,
            router,
            clock,
            variant: self.variant,
            profile,
            band,
            panel,
            brightness: 1.0,
            visible: false,
            last_location_push: None,
            held_key: None,
            core: SessionCore::new(self.options, surface, texture, host),
        })
    }
}

/// Engine callback state. Everything an [`EngineEvent`] can touch lives here.
pub struct SessionCore<T, H> {
    options: SessionOptions,
    compositor: SurfaceCompositor,
    texture: Option<T>,
    focus: FocusArbiter,
    lifecycle: LifecycleController,
    navigation: NavigationState,
    cursor: CursorKind,
    host: H,
    pending: Vec<SessionCommand>,
}

impl<T: TextureTarget, H: HostServices> SessionCore<T, H> {
    fn new(options: SessionOptions, surface: SurfaceDescriptor, texture: T, host: H) -> Self {
        let navigation = NavigationState {
            current_url: options.homepage.clone(),
            ..NavigationState::default()
        };
        Self {
            lifecycle: LifecycleController::new(options.shutdown),
            options,
            compositor: SurfaceCompositor::new(surface),
            texture: Some(texture),
            focus: FocusArbiter::new(),
            navigation,
            cursor: CursorKind::Default,
            host,
            pending: Vec::new(),
        }
    }

    fn queue(&mut self, command: EngineCommand) {
        self.pending.push(SessionCommand::Engine(command));
    }

    fn queue_focus(&mut self, actions: Vec<FocusAction>) {
        self.pending
            .extend(actions.into_iter().map(SessionCommand::Focus));
    }

    fn inject_address_bar(&mut self) {
        if self.options.hide_addressbar {
            return;
        }
        let script =
            scripts::address_bar(self.navigation.can_go_back, self.navigation.can_go_forward);
        self.queue(EngineCommand::ExecuteScript(script));
    }

    fn accept_download(&mut self, suggested_name: &str) -> EventResponse {
        let Some(path) = self.options.downloads.destination(suggested_name) else {
            log::info!("refusing download of {suggested_name:?}");
            self.host.show_notification(
                "Download failed",
                "Could not download the requested file.",
            );
            return EventResponse::Deny;
        };
        if let Some(dir) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(dir) {
                log::warn!("cannot create download directory {}: {err}", dir.display());
                self.host.show_notification(
                    "Download failed",
                    "Could not download the requested file.",
                );
                return EventResponse::Deny;
            }
        }
        log::info!("downloading {suggested_name:?} to {}", path.display());
        EventResponse::SaveTo(path)
    }
}

impl<T: TextureTarget, H: HostServices> EngineEventSink for SessionCore<T, H> {
    fn on_event(&mut self, event: EngineEvent<'_>) -> EventResponse {
        match event {
            EngineEvent::AfterCreated => {
                log::info!("browser created");
                self.lifecycle.on_after_created();
                self.queue(EngineCommand::SetAudioMuted(self.options.audio_muted));
                // Focus taken while creating never reached the engine.
                if self.focus.has_input_focus() {
                    self.queue_focus(vec![FocusAction::EngineFocus(true)]);
                }
                EventResponse::Default
            }
            EngineEvent::BeforeClose => {
                log::info!("browser closed");
                self.lifecycle.on_closed();
                self.host.set_status_title("");
                if self.focus.has_input_focus() {
                    self.host.release_keyboard_focus();
                }
                self.focus.reset();
                self.cursor = CursorKind::Default;
                EventResponse::Default
            }
            EngineEvent::Paint(frame) => {
                let Some(texture) = self.texture.as_mut() else {
                    return EventResponse::Default;
                };
                let outcome = self.compositor.apply_paint(&frame, texture);
                if outcome.popup_damaged {
                    self.queue(EngineCommand::Invalidate(PaintLayer::Popup));
                }
                EventResponse::Default
            }
            EngineEvent::PopupShow(true) => {
                self.compositor.popup_shown();
                self.queue(EngineCommand::Invalidate(PaintLayer::Popup));
                EventResponse::Default
            }
            EngineEvent::PopupShow(false) => {
                self.compositor.popup_hidden();
                self.queue(EngineCommand::Invalidate(PaintLayer::Main));
                EventResponse::Default
            }
            EngineEvent::PopupSize(popup) => {
                self.compositor.set_popup_geometry(popup);
                EventResponse::Default
            }
            EngineEvent::CursorChange(cursor) => {
                self.cursor = cursor;
                EventResponse::Default
            }
            EngineEvent::VirtualKeyboardRequested(mode) => {
                let actions = self.focus.virtual_keyboard_requested(mode);
                self.queue_focus(actions);
                EventResponse::Default
            }
            EngineEvent::LoadingStateChange {
                is_loading,
                can_go_back,
                can_go_forward,
            } => {
                self.navigation.is_loading = is_loading;
                self.navigation.can_go_back = can_go_back;
                self.navigation.can_go_forward = can_go_forward;
                self.host.set_loading(is_loading);
                if !is_loading {
                    self.inject_address_bar();
                }
                EventResponse::Default
            }
            EngineEvent::LoadEnd {
                is_main_frame,
                http_status,
            } => {
                if is_main_frame {
                    log::debug!("main frame loaded ({http_status})");
                    self.inject_address_bar();
                }
                EventResponse::Default
            }
            EngineEvent::LoadError {
                code,
                text,
                failed_url,
            } => {
                if let LoadErrorCode::Other(raw) = code {
                    log::warn!("failed to load {failed_url}: {text} ({raw})");
                }
                EventResponse::Default
            }
            EngineEvent::TitleChange(title) => {
                self.host.set_status_title(&truncate_title(title));
                EventResponse::Default
            }
            EngineEvent::AddressChange { url, is_main_frame } => {
                if is_main_frame {
                    self.navigation.current_url = url.to_string();
                }
                EventResponse::Default
            }
            EngineEvent::DocumentAvailable => {
                self.queue(EngineCommand::ExecuteScript(
                    scripts::GEOLOCATION_SHIM.to_string(),
                ));
                EventResponse::Default
            }
            EngineEvent::BeforePopup {
                target_url,
                user_gesture,
            } => {
                // No popup windows: follow user-initiated ones in place.
                if user_gesture && !target_url.is_empty() {
                    self.queue(EngineCommand::LoadUrl(target_url.to_string()));
                }
                EventResponse::Handled
            }
            EngineEvent::JsDialog { kind, message } => {
                if kind != JsDialogKind::Alert {
                    log::debug!("suppressing {kind:?} dialog");
                }
                self.host.show_notification("Alert", message);
                EventResponse::Handled
            }
            EngineEvent::BeforeDownload { suggested_name } => self.accept_download(suggested_name),
            EngineEvent::DownloadUpdated {
                percent_complete,
                is_complete,
            } => {
                self.host
                    .set_download_progress(percent_complete, is_complete);
                if is_complete {
                    self.host.show_notification(
                        "Download finished",
                        "The download has been completed.",
                    );
                }
                EventResponse::Default
            }
            EngineEvent::PermissionRequest { origin, kind } => match kind {
                PermissionKind::Geolocation => EventResponse::Default,
                PermissionKind::Media => EventResponse::Deny,
                PermissionKind::Other(bits) => {
                    log::info!("denying permission {bits:#x} for {origin}");
                    EventResponse::Deny
                }
            },
            EngineEvent::BeforeResourceLoad { user_agent } => {
                let rewritten = rewrite_user_agent(user_agent, &self.options.user_agent);
                if rewritten == user_agent {
                    EventResponse::Default
                } else {
                    EventResponse::SetUserAgent(rewritten)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HeldKey {
    raw_char: u8,
    virtual_key: u8,
    flags: HostKeyFlags,
    pressed_at: Duration,
}

/// A browser bound to one panel band.
pub struct EmbeddedBrowserSession<E: ?Sized, T, H> {
    engine: Rc<RefCell<E>>,
    router: InputRouter,
    clock: Rc<dyn Clock>,
    variant: DeviceVariant,
    profile: VariantProfile,
    band: PanelBand,
    panel: PanelGeometry,
    brightness: f32,
    visible: bool,
    last_location_push: Option<Duration>,
    held_key: Option<HeldKey>,
    core: SessionCore<T, H>,
}

impl<E, T, H> EmbeddedBrowserSession<E, T, H>
where
    E: BrowserEngine + ?Sized,
    T: TextureTarget,
    H: HostServices,
{
    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    pub fn profile(&self) -> &VariantProfile {
        &self.profile
    }

    pub fn band(&self) -> &PanelBand {
        &self.band
    }

    pub fn surface(&self) -> &SurfaceDescriptor {
        self.core.compositor.surface()
    }

    pub fn panel(&self) -> &PanelGeometry {
        &self.panel
    }

    /// The host moved or resized the panel. The browser keeps its size.
    pub fn set_panel(&mut self, panel: PanelGeometry) {
        self.panel = panel;
    }

    pub fn lifecycle_state(&self) -> SessionLifecycleState {
        self.core.lifecycle.state()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.core.navigation
    }

    pub fn current_url(&self) -> &str {
        &self.core.navigation.current_url
    }

    pub fn cursor_kind(&self) -> CursorKind {
        self.core.cursor
    }

    pub fn has_input_focus(&self) -> bool {
        self.core.focus.has_input_focus()
    }

    pub fn wants_virtual_keyboard(&self) -> bool {
        self.core.focus.wants_virtual_keyboard()
    }

    pub fn texture(&self) -> Option<&T> {
        self.core.texture.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.core.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.core.host
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness.clamp(0.0, 1.0);
    }

    /// Show or hide the browser. The first show creates it.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;

        if visible {
            self.last_location_push = Some(self.clock.now());
            let needs_browser = matches!(
                self.core.lifecycle.state(),
                SessionLifecycleState::Uninitialized | SessionLifecycleState::Destroyed
            );
            if needs_browser && self.core.texture.is_some() {
                // Failures are reported to the user; showing again retries.
                let _ = self.create_browser();
            }
        } else {
            self.last_location_push = None;
            self.held_key = None;
            let actions = self.core.focus.set_focus(false);
            self.run_focus_actions(actions);
        }
    }

    /// Request a browser from the engine, bootstrapping it if needed.
    pub fn create_browser(&mut self) -> Result<()> {
        if self.core.texture.is_none() {
            return Err(BrowserError::NotLive);
        }
        self.core.lifecycle.begin_create()?;

        let request = CreateRequest {
            url: self.create_url(),
            width: self.surface().browser_width,
            height: self.surface().browser_height,
            frame_rate: self.core.options.frame_rate,
            cache_dir: self.core.options.cache_dir.clone(),
            accept_language: accept_language(
                self.core.host.locale(),
                &self.core.options.forced_language,
            ),
            windowless: true,
            background_color: 0xFFFF_FFFF,
        };

        let created = prepare_cache_dir(&request.cache_dir).and_then(|()| {
            let mut engine = self.engine.borrow_mut();
            ensure_engine_running(&mut *engine, &request.cache_dir)?;
            engine.create_browser(&request)
        });

        match created {
            Ok(()) => {
                log::info!("creating browser for {}", request.url);
                Ok(())
            }
            Err(err) => {
                log::error!("browser creation failed: {err}");
                self.core.lifecycle.creation_failed();
                self.core
                    .host
                    .show_notification(CREATE_FAILED_TITLE, CREATE_FAILED_BODY);
                Err(BrowserError::CreationFailure(err.to_string()))
            }
        }
    }

    fn create_url(&self) -> String {
        let url = &self.core.navigation.current_url;
        if url.is_empty() {
            self.core.options.homepage.clone()
        } else {
            url.clone()
        }
    }

    /// Per-frame work: pump the engine while visible, then run queued
    /// commands, key repeat, position pushes and focus reconciliation.
    pub fn update(&mut self) {
        if !self.visible || !self.core.lifecycle.is_active() {
            return;
        }

        self.pump();

        if !self.core.lifecycle.is_live() {
            return;
        }

        self.repeat_held_key();
        self.push_location();

        let actions = self
            .core
            .focus
            .reconcile(self.core.host.has_keyboard_focus());
        self.run_focus_actions(actions);
    }

    fn pump(&mut self) {
        self.engine.borrow_mut().pump(&mut self.core);
        self.flush_pending();
    }

    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.core.pending);
        for command in pending {
            match command {
                SessionCommand::Engine(command) => {
                    if self.core.lifecycle.is_live() {
                        command.apply(&mut *self.engine.borrow_mut());
                    }
                }
                SessionCommand::Focus(action) => self.run_focus_action(action),
            }
        }
    }

    fn run_focus_actions(&mut self, actions: Vec<FocusAction>) {
        for action in actions {
            self.run_focus_action(action);
        }
    }

    fn run_focus_action(&mut self, action: FocusAction) {
        let live = self.core.lifecycle.is_live();
        match action {
            FocusAction::ClaimHostFocus => self.core.host.claim_keyboard_focus(),
            FocusAction::BringToFront => self.core.host.bring_to_front(),
            FocusAction::EngineFocus(focus) if live => self.engine.borrow_mut().set_focus(focus),
            FocusAction::BlurActiveElement if live => self
                .engine
                .borrow_mut()
                .execute_script(scripts::BLUR_ACTIVE_ELEMENT),
            FocusAction::EngineFocus(_) | FocusAction::BlurActiveElement => {}
            FocusAction::ReleaseHostFocus => self.core.host.release_keyboard_focus(),
        }
    }

    fn push_location(&mut self) {
        let now = self.clock.now();
        let due = self
            .last_location_push
            .is_none_or(|at| now.saturating_sub(at) >= self.core.options.location_interval);
        if !due {
            return;
        }
        self.last_location_push = Some(now);
        if let Some(fix) = self.core.host.location() {
            self.engine
                .borrow_mut()
                .execute_script(&scripts::location_push(&fix));
        }
    }

    fn repeat_held_key(&mut self) {
        let Some(held) = self.held_key else {
            return;
        };
        if !self.core.focus.has_input_focus() {
            self.held_key = None;
            return;
        }
        let now = self.clock.now();
        if now.saturating_sub(held.pressed_at) < self.core.options.key_repeat_delay {
            return;
        }
        let flags = (held.flags - HostKeyFlags::UP) | HostKeyFlags::DOWN;
        self.router.send_key(
            &mut *self.engine.borrow_mut(),
            held.raw_char,
            held.virtual_key,
            flags,
        );
    }

    /// Where to draw the texture this frame, or `None` once torn down.
    pub fn draw(&self) -> Option<DrawQuad> {
        self.core.texture.as_ref()?;
        Some(DrawQuad::new(
            &self.panel,
            &self.band,
            self.surface(),
            self.brightness,
        ))
    }

    /// Browser pixel position for normalized panel coordinates, if the
    /// point is inside the band and the browser can take input.
    fn browser_point(&self, norm_x: f32, norm_y: f32) -> Option<(f32, f32)> {
        if !self.core.lifecycle.is_live() || !is_inside_band(norm_x, norm_y, &self.band) {
            return None;
        }
        let (px, py) = to_browser_pixels(norm_x, norm_y, &self.band, self.surface());
        (py >= 0.0).then_some((px, py))
    }

    pub fn mouse_move(&mut self, norm_x: f32, norm_y: f32) {
        if let Some((px, py)) = self.browser_point(norm_x, norm_y) {
            self.router
                .send_move(&mut *self.engine.borrow_mut(), px, py);
        }
    }

    /// Returns whether the click was consumed by the browser.
    pub fn click(&mut self, norm_x: f32, norm_y: f32, phase: ClickPhase) -> bool {
        match self.browser_point(norm_x, norm_y) {
            Some((px, py)) => {
                self.router
                    .send_click(&mut *self.engine.borrow_mut(), px, py, phase);
                true
            }
            None => {
                if phase == ClickPhase::Down && self.core.focus.has_input_focus() {
                    self.host_focus_lost();
                }
                false
            }
        }
    }

    /// Returns whether the scroll was consumed by the browser.
    pub fn scroll(&mut self, norm_x: f32, norm_y: f32, clicks: i32, horizontal: bool) -> bool {
        let Some((px, py)) = self.browser_point(norm_x, norm_y) else {
            return false;
        };
        let ticks = clicks.saturating_mul(self.core.options.scroll_speed);
        self.router.send_scroll(
            &mut *self.engine.borrow_mut(),
            px,
            py,
            ticks,
            horizontal,
        );
        true
    }

    /// Forward a host key. Key-downs only reach the page while it holds
    /// input focus; key-ups always do so nothing stays pressed.
    pub fn key(&mut self, raw_char: u8, virtual_key: u8, flags: HostKeyFlags) -> bool {
        if !self.core.lifecycle.is_live() {
            return false;
        }
        let down = flags.is_key_down();
        if down && !self.core.focus.has_input_focus() {
            return false;
        }

        if down {
            let pressed_at = self.clock.now();
            self.held_key = Some(HeldKey {
                raw_char,
                virtual_key,
                flags,
                pressed_at,
            });
        } else if self
            .held_key
            .is_some_and(|held| held.virtual_key == virtual_key)
        {
            self.held_key = None;
        }

        self.router.send_key(
            &mut *self.engine.borrow_mut(),
            raw_char,
            virtual_key,
            flags,
        );
        true
    }

    /// Navigate to `url`. Before the browser exists this only changes the
    /// URL it will be created with.
    pub fn load_url(&mut self, url: &str) {
        self.core.navigation.current_url = url.to_string();
        if self.core.lifecycle.is_live() {
            self.engine.borrow_mut().load_url(url);
        }
    }

    /// Go back in history. Returns false if there was nothing to go back to.
    pub fn go_back(&mut self) -> bool {
        if !self.core.lifecycle.is_live() {
            return false;
        }
        let mut engine = self.engine.borrow_mut();
        if !engine.can_go_back() {
            return false;
        }
        engine.go_back();
        true
    }

    pub fn set_focus(&mut self, focus: bool) {
        let actions = self.core.focus.set_focus(focus);
        self.run_focus_actions(actions);
    }

    /// The host reports it took keyboard focus back.
    pub fn host_focus_lost(&mut self) {
        let actions = self.core.focus.host_focus_lost();
        self.run_focus_actions(actions);
    }

    /// The device back affordance was pressed.
    pub fn press_back(&mut self) -> BackOutcome {
        match self.profile.back_action {
            BackAction::HideAndHome => BackOutcome::HideAndHome,
            BackAction::HistoryOrHome => {
                // The close icon of the generic layout always leaves the browser.
                let closes = matches!(self.profile.back_button, BackButton::Icon { .. })
                    && !self.core.options.hide_addressbar;
                if !closes && self.go_back() {
                    BackOutcome::WentBack
                } else {
                    BackOutcome::Home
                }
            }
        }
    }

    /// Close the browser and release the texture, blocking until the engine
    /// confirms or the shutdown ceiling passes. The session is inert
    /// afterwards.
    pub fn destroy(&mut self) -> ShutdownOutcome {
        self.visible = false;
        self.held_key = None;
        self.core.pending.clear();

        let outcome = if self.core.lifecycle.begin_close() {
            log::info!("closing browser");
            self.engine.borrow_mut().close_browser(true);

            let timing = self.core.lifecycle.timing();
            let clock = Rc::clone(&self.clock);
            let engine = &self.engine;
            let core = &mut self.core;
            let outcome = timing.wait_for_close(&*clock, || {
                engine.borrow_mut().pump(&mut *core);
                core.pending.clear();
                core.lifecycle.close_confirmed()
            });
            if outcome == ShutdownOutcome::TimedOut {
                log::warn!("{}", BrowserError::ShutdownTimeout(timing.ceiling));
            }
            outcome
        } else {
            ShutdownOutcome::NotLive
        };

        if self.core.focus.has_input_focus() {
            self.core.host.release_keyboard_focus();
        }
        self.core.focus.reset();
        self.core.host.set_status_title("");
        self.core.lifecycle.finish();
        self.core.texture = None;
        outcome
    }
}

impl<E: ?Sized, T, H> Drop for EmbeddedBrowserSession<E, T, H> {
    fn drop(&mut self) {
        if self.core.texture.is_some() && self.core.lifecycle.is_active() {
            log::warn!("session dropped without destroy(), browser left open");
        }
    }
}
