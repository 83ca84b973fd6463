use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/json_data/";

#[derive(Clone, Debug)]
pub struct Config {
    /// Base location of `event_ids.json` and the per-event files.
    pub data_base_url: String,
    /// When set, resources are read from this directory instead of over HTTP.
    pub data_dir: Option<PathBuf>,
    pub http_timeout_secs: u64,
    /// Window selected before the user picks one.
    pub default_window: u32,
    /// Maximum characters per rendered title line.
    pub title_wrap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: None,
            http_timeout_secs: 10,
            default_window: 45,
            title_wrap: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_base_url: std::env::var("DATA_BASE_URL").unwrap_or(defaults.data_base_url),
            data_dir: std::env::var("DATA_DIR").ok().filter(|v| !v.is_empty()).map(PathBuf::from),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(defaults.http_timeout_secs),
            default_window: std::env::var("DEFAULT_WINDOW").ok().and_then(|v| v.parse().ok()).unwrap_or(defaults.default_window),
            title_wrap: std::env::var("TITLE_WRAP").ok().and_then(|v| v.parse().ok()).filter(|w| *w > 0).unwrap_or(defaults.title_wrap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.default_window, 45);
        assert_eq!(cfg.title_wrap, 100);
        assert!(cfg.data_dir.is_none());
        assert!(cfg.data_base_url.ends_with('/'));
    }
}
