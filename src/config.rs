use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_URL_ENV: &str = "CHEMVIS_API_URL";
pub const REPORT_DIR_ENV: &str = "CHEMVIS_REPORT_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL every endpoint path is joined onto
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub poll_interval_secs: u64,
    /// Where exported reports are written; empty means the working directory
    pub report_dir: String,
    /// Rows plotted in the trend chart
    pub trend_rows: usize,
    /// Rows shown in the dashboard table
    pub preview_rows: usize,
    /// Rows included in the PDF table
    pub report_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/".to_string(),
            request_timeout_secs: 10,
            poll_interval_secs: 5,
            report_dir: String::new(),
            trend_rows: 30,
            preview_rows: 10,
            report_rows: 50,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".chemvis-tui"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    /// Location of the persisted token pair
    pub fn session_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("session.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("chemvis-tui.log"))
    }

    /// Read the config file if present, falling back to defaults
    pub fn load() -> Config {
        let from_file = Self::config_path().and_then(|path| Self::read_file(&path));
        from_file.unwrap_or_default().with_env_overrides(|key| env::var(key).ok())
    }

    /// `None` when the file is missing or not valid config JSON
    fn read_file(path: &Path) -> Option<Config> {
        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str::<Config>(&contents).ok()
    }

    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = lookup(REPORT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.report_dir = dir;
        }
        self
    }

    /// Save the config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = config_dir.join("config.json");
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Write a default config file on first run so users have something to edit
    pub fn write_default_if_missing() -> anyhow::Result<()> {
        match Self::config_path() {
            Some(path) if !path.exists() => Config::default().save(),
            _ => Ok(()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn report_dir(&self) -> PathBuf {
        if self.report_dir.trim().is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.report_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"poll_interval_secs": 2}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.api_base_url, "http://localhost:8000/api/");
        assert_eq!(config.report_rows, 50);
    }

    #[test]
    fn test_read_file_parses_or_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert!(Config::read_file(&path).is_none());

        std::fs::write(&path, r#"{"trend_rows": 12}"#).unwrap();
        let config = Config::read_file(&path).unwrap();
        assert_eq!(config.trend_rows, 12);
        assert_eq!(config.preview_rows, 10);

        std::fs::write(&path, "not json").unwrap();
        assert!(Config::read_file(&path).is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_env_overrides(|key| match key {
            API_URL_ENV => Some("https://chem.example.com/api".to_string()),
            REPORT_DIR_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://chem.example.com/api");
        assert_eq!(config.report_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_zero_durations_are_clamped() {
        let config = Config {
            request_timeout_secs: 0,
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
