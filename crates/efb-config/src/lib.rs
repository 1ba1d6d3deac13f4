//! EFB browser configuration system
//!
//! Settings are read from `efb.toml` and may be overridden through
//! environment variables, so a flight can be tweaked without editing the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "efb.toml";

/// Maximum number of bookmark shortcuts shown on the status bar.
pub const MAX_BOOKMARKS: usize = 5;

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EfbConfig {
    /// Device variant name (`generic`, `zibo738`, `levelup737`, `felis742`,
    /// `justflight`, `ixeg737`). Unknown names fall back to `generic`.
    pub variant: Option<String>,
    /// Browser behaviour
    pub browser: BrowserConfig,
    /// Tablet panel placement in host pixels. Required to open a session.
    pub panel: Option<PanelConfig>,
    /// Status bar shortcuts
    pub bookmarks: Vec<Bookmark>,
    /// Download whitelist
    pub downloads: DownloadsConfig,
    /// Rendering engine location and cache
    pub engine: EngineConfig,
}

/// Browser behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Page opened when the browser is first shown
    pub homepage: String,
    /// Mute page audio
    pub audio_muted: bool,
    /// Minimum logical browser width; narrower panels are upscaled (0 disables)
    pub minimum_width: u32,
    /// Wheel ticks are multiplied by this value
    pub scroll_speed: i32,
    /// Accept-language override (e.g. `nl-NL`). Empty uses the host locale.
    pub forced_language: String,
    /// User-Agent override. Empty derives one from the engine default.
    pub user_agent: String,
    /// Hide the injected address bar overlay
    pub hide_addressbar: bool,
    /// Off-screen frames per second
    pub framerate: u32,
    /// Delay before a held key starts repeating, in milliseconds
    pub key_repeat_delay_ms: u64,
}

/// Panel placement configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    pub left: i32,
    pub bottom: i32,
    pub width: u32,
    pub height: u32,
    /// Recentre the panel to a 0.6 height/width ratio (800x480 tablets)
    pub fixed_aspect_ratio: bool,
}

/// A status bar shortcut
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Bookmark {
    /// Feather icon name
    pub icon: String,
    pub url: String,
}

/// Download whitelist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadsConfig {
    /// Exact file names that may be saved
    pub allowed_names: Vec<String>,
    /// File extensions (without the dot) that may be saved
    pub allowed_extensions: Vec<String>,
    /// Destination directory for accepted downloads
    pub directory: PathBuf,
}

/// Rendering engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Persistent cache directory, created on first use
    pub cache_dir: PathBuf,
    /// Path to the native CEF shim library (file or directory)
    pub shim_path: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            homepage: "https://www.google.com".to_string(),
            audio_muted: false,
            minimum_width: 0,
            scroll_speed: 5,
            forced_language: String::new(),
            user_agent: String::new(),
            hide_addressbar: false,
            framerate: 25,
            key_repeat_delay_ms: 300,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            left: 0,
            bottom: 0,
            width: 800,
            height: 480,
            fixed_aspect_ratio: true,
        }
    }
}

impl Default for Bookmark {
    fn default() -> Self {
        Self {
            icon: "globe".to_string(),
            url: String::new(),
        }
    }
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            allowed_names: vec!["b738x.xml".to_string()],
            allowed_extensions: vec!["fms".to_string()],
            directory: PathBuf::from("output/FMS plans"),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            shim_path: None,
        }
    }
}

impl EfbConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `efb.toml` in the current directory, or
    /// return the default configuration if the file is missing or malformed
    pub fn load_or_default() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(homepage) = std::env::var("EFB_HOMEPAGE") {
            self.browser.homepage = homepage;
        }
        if let Ok(language) = std::env::var("EFB_FORCED_LANGUAGE") {
            self.browser.forced_language = language;
        }
        if let Ok(user_agent) = std::env::var("EFB_USER_AGENT") {
            self.browser.user_agent = user_agent;
        }
        if let Ok(val) = std::env::var("EFB_HIDE_ADDRESSBAR") {
            self.browser.hide_addressbar = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("EFB_AUDIO_MUTED") {
            self.browser.audio_muted = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("EFB_FRAMERATE") {
            if let Ok(fps) = val.parse::<u32>() {
                self.browser.framerate = fps;
            }
        }
        if let Ok(variant) = std::env::var("EFB_VARIANT") {
            self.variant = Some(variant);
        }
        if let Ok(path) = std::env::var("EFB_CEF_SHIM_PATH") {
            self.engine.shim_path = Some(PathBuf::from(path));
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from efb.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }

    /// Bookmarks that have a URL, capped at [`MAX_BOOKMARKS`].
    pub fn active_bookmarks(&self) -> impl Iterator<Item = &Bookmark> {
        self.bookmarks
            .iter()
            .filter(|b| !b.url.trim().is_empty())
            .take(MAX_BOOKMARKS)
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EfbConfig::default();
        assert_eq!(config.browser.homepage, "https://www.google.com");
        assert_eq!(config.browser.scroll_speed, 5);
        assert_eq!(config.browser.framerate, 25);
        assert_eq!(config.browser.key_repeat_delay_ms, 300);
        assert!(!config.browser.hide_addressbar);
        assert!(config.panel.is_none());
    }

    #[test]
    fn test_toml_serialization() {
        let mut config = EfbConfig::default();
        config.panel = Some(PanelConfig::default());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: EfbConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.panel, Some(PanelConfig::default()));
        assert_eq!(parsed.browser.homepage, config.browser.homepage);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
variant = "zibo738"

[browser]
homepage = "https://dispatch.simbrief.com"
hide_addressbar = true

[panel]
left = 10
bottom = 20
width = 640
height = 400

[[bookmarks]]
icon = "map"
url = "https://vatsim-radar.com"

[[bookmarks]]
icon = "mail"
url = ""
"#
        )
        .unwrap();

        let config = EfbConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.variant.as_deref(), Some("zibo738"));
        assert_eq!(config.browser.homepage, "https://dispatch.simbrief.com");
        assert!(config.browser.hide_addressbar);
        assert_eq!(config.browser.scroll_speed, 5);

        let panel = config.panel.unwrap();
        assert_eq!((panel.left, panel.bottom, panel.width, panel.height), (10, 20, 640, 400));
        assert!(panel.fixed_aspect_ratio);

        let bookmarks: Vec<_> = config.active_bookmarks().collect();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].icon, "map");
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[browser\nhomepage = ").unwrap();
        let err = EfbConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = EfbConfig::load_from_file("/nonexistent/efb.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_bookmarks_are_capped() {
        let mut config = EfbConfig::default();
        config.bookmarks = (0..8)
            .map(|i| Bookmark {
                icon: "globe".into(),
                url: format!("https://example.com/{i}"),
            })
            .collect();
        assert_eq!(config.active_bookmarks().count(), MAX_BOOKMARKS);
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("EFB_FORCED_LANGUAGE", "nl-NL");
            std::env::set_var("EFB_HIDE_ADDRESSBAR", "true");
            std::env::set_var("EFB_FRAMERATE", "60");
        }

        let mut config = EfbConfig::default();
        config.merge_with_env();

        assert_eq!(config.browser.forced_language, "nl-NL");
        assert!(config.browser.hide_addressbar);
        assert_eq!(config.browser.framerate, 60);

        unsafe {
            std::env::remove_var("EFB_FORCED_LANGUAGE");
            std::env::remove_var("EFB_HIDE_ADDRESSBAR");
            std::env::remove_var("EFB_FRAMERATE");
        }
    }
}
