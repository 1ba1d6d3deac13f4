//! What the session needs from the host simulator.

/// Aircraft position fed to pages through the geolocation shim.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub heading_deg: f64,
    pub speed_mps: f64,
}

/// Host UI language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostLocale {
    #[default]
    Unknown,
    English,
    French,
    German,
    Italian,
    Spanish,
    Korean,
    Russian,
    Greek,
    Japanese,
    Chinese,
    Ukrainian,
}

impl HostLocale {
    pub fn accept_language(self) -> Option<&'static str> {
        let list = match self {
            HostLocale::English => "en-US,en",
            HostLocale::French => "fr-FR,fr",
            HostLocale::German => "de-DE,de",
            HostLocale::Italian => "it-IT,it",
            HostLocale::Spanish => "es-ES,es",
            HostLocale::Korean => "ko-KR,ko",
            HostLocale::Russian => "ru-RU,ru",
            HostLocale::Greek => "el-GR,el",
            HostLocale::Japanese => "ja-JP,ja",
            HostLocale::Chinese => "zh-CN,zh",
            HostLocale::Ukrainian => "uk-UA,uk",
            HostLocale::Unknown => return None,
        };
        Some(list)
    }
}

/// `Accept-Language` for a session; a non-empty `forced` value wins.
pub fn accept_language(locale: HostLocale, forced: &str) -> Option<String> {
    let forced = forced.trim();
    if !forced.is_empty() {
        return Some(forced.to_string());
    }
    locale.accept_language().map(str::to_string)
}

/// Host-side collaborators: notifications, the status bar, keyboard focus
/// and aircraft position.
pub trait HostServices {
    /// Show a transient notification.
    fn show_notification(&mut self, title: &str, body: &str);

    /// Title shown on the active tab; empty clears it.
    fn set_status_title(&mut self, title: &str);

    fn set_loading(&mut self, loading: bool);

    /// Download progress in percent; `complete` is set once finished.
    fn set_download_progress(&mut self, percent: i32, complete: bool);

    /// Route keyboard input to the panel window.
    fn claim_keyboard_focus(&mut self);
    fn release_keyboard_focus(&mut self);
    /// Whether the panel window currently holds the host keyboard claim.
    fn has_keyboard_focus(&self) -> bool;

    fn bring_to_front(&mut self);

    /// Current aircraft position, if available.
    fn location(&self) -> Option<LocationFix> {
        None
    }

    fn locale(&self) -> HostLocale {
        HostLocale::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_language_overrides_locale() {
        assert_eq!(
            accept_language(HostLocale::German, ""),
            Some("de-DE,de".to_string())
        );
        assert_eq!(
            accept_language(HostLocale::German, "nl-NL,nl"),
            Some("nl-NL,nl".to_string())
        );
        assert_eq!(accept_language(HostLocale::Unknown, "  "), None);
    }
}
