//! EFB tablet browser.
//!
//! Glue between the user configuration ([`efb_config`]) and the embedded
//! browser session ([`efb_cef`]).

use anyhow::{Context, Result};
use efb_cef::{
    BrowserEngine, DeviceVariant, DownloadPolicy, EmbeddedBrowserSession, HostServices,
    PanelGeometry, SessionBuilder, SessionOptions, ShutdownTiming, SurfaceDescriptor,
    TextureTarget,
};
use efb_config::{EfbConfig, PanelConfig};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub use efb_cef as cef;
pub use efb_config as config;

/// Session tunables for `config`.
pub fn session_options(config: &EfbConfig) -> SessionOptions {
    let browser = &config.browser;
    SessionOptions {
        homepage: browser.homepage.clone(),
        audio_muted: browser.audio_muted,
        scroll_speed: browser.scroll_speed,
        frame_rate: browser.framerate.max(1),
        forced_language: browser.forced_language.clone(),
        user_agent: browser.user_agent.clone(),
        hide_addressbar: browser.hide_addressbar,
        minimum_width: browser.minimum_width,
        key_repeat_delay: Duration::from_millis(browser.key_repeat_delay_ms),
        cache_dir: config.engine.cache_dir.clone(),
        downloads: DownloadPolicy {
            allowed_names: config.downloads.allowed_names.clone(),
            allowed_extensions: config.downloads.allowed_extensions.clone(),
            directory: config.downloads.directory.clone(),
        },
        shutdown: ShutdownTiming::default(),
        ..SessionOptions::default()
    }
}

/// Panel placement in host pixels, with the tablet aspect applied if asked.
pub fn panel_geometry(panel: &PanelConfig) -> PanelGeometry {
    let geometry = PanelGeometry::new(
        panel.left as f32,
        panel.bottom as f32,
        panel.width as f32,
        panel.height as f32,
    );
    if panel.fixed_aspect_ratio {
        geometry.with_fixed_aspect()
    } else {
        geometry
    }
}

pub fn device_variant(config: &EfbConfig) -> DeviceVariant {
    DeviceVariant::from_name_or_generic(config.variant.as_deref())
}

/// Builder for `config`. The panel is left unset when the configuration has
/// none, so initializing fails with a configuration error.
pub fn session_builder(config: &EfbConfig) -> SessionBuilder {
    let builder = SessionBuilder::new(session_options(config)).with_variant(device_variant(config));
    match &config.panel {
        Some(panel) => builder.with_panel(panel_geometry(panel)),
        None => builder,
    }
}

/// Build a session for `config` against `engine`.
pub fn open_session<E, T, H, F>(
    config: &EfbConfig,
    engine: Rc<RefCell<E>>,
    host: H,
    make_texture: F,
) -> Result<EmbeddedBrowserSession<E, T, H>>
where
    E: BrowserEngine + ?Sized,
    T: TextureTarget,
    H: HostServices,
    F: FnOnce(&SurfaceDescriptor) -> efb_cef::Result<T>,
{
    session_builder(config)
        .initialize(engine, host, make_texture)
        .with_context(|| format!("failed to set up the {} tablet", device_variant(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use efb_config::BrowserConfig;

    #[test]
    fn options_follow_config() {
        let config = EfbConfig {
            browser: BrowserConfig {
                homepage: "https://navigraph.com".to_string(),
                scroll_speed: 3,
                key_repeat_delay_ms: 450,
                hide_addressbar: true,
                ..BrowserConfig::default()
            },
            ..EfbConfig::default()
        };

        let options = session_options(&config);
        assert_eq!(options.homepage, "https://navigraph.com");
        assert_eq!(options.scroll_speed, 3);
        assert_eq!(options.key_repeat_delay, Duration::from_millis(450));
        assert!(options.hide_addressbar);
        assert_eq!(options.downloads.allowed_extensions, vec!["fms".to_string()]);
    }

    #[test]
    fn fixed_aspect_recentres_panel() {
        let panel = PanelConfig {
            left: 100,
            bottom: 50,
            width: 1000,
            height: 800,
            fixed_aspect_ratio: true,
        };
        let geometry = panel_geometry(&panel);
        assert_eq!(geometry.height, 600.0);
        assert_eq!(geometry.y, 150.0);

        let free = panel_geometry(&PanelConfig {
            fixed_aspect_ratio: false,
            ..panel
        });
        assert_eq!((free.y, free.height), (50.0, 800.0));
    }

    #[test]
    fn unknown_variant_is_generic() {
        let config = EfbConfig {
            variant: Some("concorde".to_string()),
            ..EfbConfig::default()
        };
        assert_eq!(device_variant(&config), DeviceVariant::Generic);
    }
}
