use serde::{Deserialize, Serialize};

/// Queries shorter than this return the whole publication list unfiltered.
pub(crate) const SEARCH_MIN_QUERY_CHARS: usize = 3;
/// Upper bound on publication picker results.
pub(crate) const SEARCH_MAX_RESULTS: usize = 50;
pub(crate) const READABLE_DATE_SEPARATOR: &str = ".";
pub(crate) const UNTITLED_LABEL: &str = "Untitled";

const DEFAULT_API_URL: &str = "http://localhost:8000/digitaledition";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime configuration injected by the hosting page as `window.ENV`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    /// Project pre-selected in the collection picker.
    pub project: String,
    pub log_level: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            project: String::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl EnvConfig {
    /// Read `window.ENV`, falling back to defaults for anything missing.
    ///
    /// Both `API_URL` (deployment docs) and `api_url` spellings are accepted.
    pub fn from_window() -> Self {
        let mut cfg = Self::default();

        let Some(env) = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object())
        else {
            return cfg;
        };

        let read = |keys: [&str; 2]| -> Option<String> {
            keys.iter().find_map(|k| {
                js_sys::Reflect::get(&env, &(*k).into())
                    .ok()
                    .and_then(|v| v.as_string())
            })
        };

        if let Some(v) = read(["API_URL", "api_url"]) {
            cfg.api_url = v;
        }
        if let Some(v) = read(["PROJECT", "project"]) {
            cfg.project = v;
        }
        if let Some(v) = read(["LOG_LEVEL", "log_level"]) {
            cfg.log_level = v;
        }

        cfg.normalized()
    }

    fn normalized(mut self) -> Self {
        self.api_url = self.api_url.trim().trim_end_matches('/').to_string();
        if self.api_url.is_empty() {
            self.api_url = DEFAULT_API_URL.to_string();
        }
        self.project = self.project.trim().to_string();
        if self.log_level.trim().is_empty() {
            self.log_level = DEFAULT_LOG_LEVEL.to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EnvConfig::default();
        assert_eq!(cfg.api_url, "http://localhost:8000/digitaledition");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.project.is_empty());
    }

    #[test]
    fn test_normalized_trims_trailing_slash_and_blanks() {
        let cfg = EnvConfig {
            api_url: " https://api.example.org/digitaledition/ ".to_string(),
            project: " topelius ".to_string(),
            log_level: "".to_string(),
        }
        .normalized();
        assert_eq!(cfg.api_url, "https://api.example.org/digitaledition");
        assert_eq!(cfg.project, "topelius");
        assert_eq!(cfg.log_level, "info");

        let cfg = EnvConfig {
            api_url: "   ".to_string(),
            ..EnvConfig::default()
        }
        .normalized();
        assert_eq!(cfg.api_url, "http://localhost:8000/digitaledition");
    }

    #[test]
    fn test_search_constants() {
        assert_eq!(SEARCH_MIN_QUERY_CHARS, 3);
        assert_eq!(SEARCH_MAX_RESULTS, 50);
    }
}
