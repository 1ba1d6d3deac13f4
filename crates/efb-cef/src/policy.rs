//! Small request and UI policies applied to engine callbacks.

use std::path::{Path, PathBuf};

/// Token that replaces the simulator name in the engine's default User-Agent.
pub const BROWSER_UA_TOKEN: &str = "Chrome/117.2.5.0";

const SIMULATOR_UA_TOKEN: &str = "X-Plane";

/// Longest tab title shown before truncation.
pub const MAX_TITLE_CHARS: usize = 12;

/// User-Agent to send: `override_ua` verbatim if set, otherwise `engine_ua`
/// with its simulator token swapped for a generic browser token.
pub fn rewrite_user_agent(engine_ua: &str, override_ua: &str) -> String {
    if !override_ua.is_empty() {
        return override_ua.to_string();
    }
    match engine_ua.find(SIMULATOR_UA_TOKEN) {
        Some(start) => {
            let end = engine_ua[start..]
                .find(' ')
                .map_or(engine_ua.len(), |offset| start + offset);
            let mut ua = String::with_capacity(engine_ua.len() + BROWSER_UA_TOKEN.len());
            ua.push_str(&engine_ua[..start]);
            ua.push_str(BROWSER_UA_TOKEN);
            ua.push_str(&engine_ua[end..]);
            ua
        }
        None => engine_ua.to_string(),
    }
}

/// Shorten a page title for the status bar.
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let mut short: String = title.chars().take(MAX_TITLE_CHARS).collect();
        short.push_str("...");
        short
    } else {
        title.to_string()
    }
}

/// Which downloads may be saved, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPolicy {
    pub allowed_names: Vec<String>,
    pub allowed_extensions: Vec<String>,
    pub directory: PathBuf,
}

impl DownloadPolicy {
    /// Destination for `suggested_name`, or `None` if it is not whitelisted.
    pub fn destination(&self, suggested_name: &str) -> Option<PathBuf> {
        // Only the final component; never let a page pick the directory.
        let name = Path::new(suggested_name).file_name()?.to_str()?;
        let by_name = self.allowed_names.iter().any(|n| n == name);
        let by_extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)));

        (by_name || by_extension).then(|| self.directory.join(name))
    }
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            allowed_names: vec!["b738x.xml".to_string()],
            allowed_extensions: vec!["fms".to_string()],
            directory: PathBuf::from("output/FMS plans"),
        }
    }
}
