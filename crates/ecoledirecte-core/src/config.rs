//! Configuration loading.
//!
//! Configuration comes from a TOML file; credentials may be overridden by
//! environment variables so they can stay out of the file:
//!
//! ```toml
//! username = "jdupont"
//! password = "secret"
//! qcm_file = "qcm.json"
//! refresh_interval = 30
//! lunch_break_time = "13:00"
//!
//! [notify]
//! webhook_url = "http://homeassistant.local:8123/api/webhook/ecole_directe"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Default endpoint constants.
pub mod endpoints {
    pub const API_URL: &str = "https://api.ecoledirecte.com/v3";
    pub const API_VERSION: &str = "4.56.0";
}

/// Default option values.
pub mod defaults {
    /// Minutes between two polls.
    pub const REFRESH_INTERVAL: u64 = 30;
    pub const MIN_REFRESH_INTERVAL: u64 = 5;
    pub const MAX_REFRESH_INTERVAL: u64 = 1440;
    pub const LUNCH_BREAK_TIME: &str = "13:00";
    pub const GRADES_TO_DISPLAY: usize = 15;
    pub const ATTENDANCE_TO_DISPLAY: usize = 20;
    pub const HOMEWORK_DESC_MAX_LENGTH: usize = 125;
    pub const QCM_ATTEMPTS: u32 = 5;
    pub const QCM_FILE: &str = "qcm.json";
    pub const HTTP_TIMEOUT_SECS: u64 = 120;
    pub const CONFIG_FILE: &str = "ecoledirecte.toml";
}

/// Environment variable names.
pub mod env_vars {
    pub const USERNAME: &str = "ECOLEDIRECTE_USERNAME";
    pub const PASSWORD: &str = "ECOLEDIRECTE_PASSWORD";
    pub const QCM_FILE: &str = "ECOLEDIRECTE_QCM_FILE";
    pub const LOG_JSON: &str = "ECOLEDIRECTE_LOG_JSON";
}

/// API endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, without trailing slash.
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Value sent as the `v` query parameter.
    #[serde(default = "default_api_version")]
    pub version: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    endpoints::API_URL.to_string()
}
fn default_api_version() -> String {
    endpoints::API_VERSION.to_string()
}
fn default_timeout() -> u64 {
    defaults::HTTP_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            version: default_api_version(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiConfig {
    /// Build a full endpoint URL, appending the API version parameter.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{}/{}{}v={}", base, path, sep, self.version)
    }
}

/// Where new-item events are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Log every event through `tracing`.
    #[serde(default = "default_true")]
    pub log: bool,

    /// POST every event as JSON to this URL.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            log: true,
            webhook_url: None,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// May be left out when set through the environment.
    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing)]
    pub password: String,

    /// JSON file holding known QCM questions and their answers.
    #[serde(default = "default_qcm_file")]
    pub qcm_file: PathBuf,

    /// Poll interval in minutes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// `HH:MM` separating morning and afternoon lessons.
    #[serde(default = "default_lunch_break_time")]
    pub lunch_break_time: String,

    /// Strip HTML markup from homework descriptions.
    #[serde(default)]
    pub decode_html: bool,

    /// Maximum number of grades (and evaluations) kept per poll.
    #[serde(default = "default_grades_to_display")]
    pub grades_to_display: usize,

    /// Bounded number of QCM attempts per login.
    #[serde(default = "default_qcm_attempts")]
    pub qcm_attempts: u32,

    /// When set, every raw API response is written here as JSON.
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

fn default_qcm_file() -> PathBuf {
    PathBuf::from(defaults::QCM_FILE)
}
fn default_refresh_interval() -> u64 {
    defaults::REFRESH_INTERVAL
}
fn default_lunch_break_time() -> String {
    defaults::LUNCH_BREAK_TIME.to_string()
}
fn default_grades_to_display() -> usize {
    defaults::GRADES_TO_DISPLAY
}
fn default_qcm_attempts() -> u32 {
    defaults::QCM_ATTEMPTS
}

impl Config {
    /// Create a configuration with default options.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            qcm_file: default_qcm_file(),
            refresh_interval: default_refresh_interval(),
            lunch_break_time: default_lunch_break_time(),
            decode_html: false,
            grades_to_display: default_grades_to_display(),
            qcm_attempts: default_qcm_attempts(),
            debug_dir: None,
            api: ApiConfig::default(),
            notify: NotifyConfig::default(),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfiguration(format!("cannot read {}: {}", path.display(), e))
        })?;
        info!(category = "config", path = %path.display(), "Loading config");

        let mut config = Self::from_toml(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override credentials and QCM file from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(username) = std::env::var(env_vars::USERNAME) {
            self.username = username;
        }
        if let Ok(password) = std::env::var(env_vars::PASSWORD) {
            self.password = password;
        }
        if let Ok(qcm_file) = std::env::var(env_vars::QCM_FILE) {
            self.qcm_file = PathBuf::from(qcm_file);
        }
    }

    /// Normalize and check option values.
    pub fn validate(&mut self) -> Result<()> {
        self.username = self.username.trim().to_string();

        if self.username.is_empty() {
            return Err(Error::InvalidConfiguration("username is empty".into()));
        }
        if self.password.is_empty() {
            return Err(Error::InvalidConfiguration("password is empty".into()));
        }
        if !(defaults::MIN_REFRESH_INTERVAL..=defaults::MAX_REFRESH_INTERVAL)
            .contains(&self.refresh_interval)
        {
            return Err(Error::InvalidConfiguration(format!(
                "refresh_interval must be between {} and {} minutes, got {}",
                defaults::MIN_REFRESH_INTERVAL,
                defaults::MAX_REFRESH_INTERVAL,
                self.refresh_interval
            )));
        }
        if self.qcm_attempts == 0 {
            return Err(Error::InvalidConfiguration(
                "qcm_attempts must be at least 1".into(),
            ));
        }
        self.lunch_break()?;
        Ok(())
    }

    /// The lunch-break cutoff as a time of day.
    pub fn lunch_break(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.lunch_break_time.trim(), "%H:%M").map_err(|e| {
            Error::InvalidConfiguration(format!(
                "lunch_break_time '{}' is not HH:MM: {}",
                self.lunch_break_time, e
            ))
        })
    }

    /// Poll interval as a `Duration`.
    pub fn refresh_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_version() {
        let api = ApiConfig::default();
        assert_eq!(
            api.endpoint("login.awp"),
            "https://api.ecoledirecte.com/v3/login.awp?v=4.56.0"
        );
        assert_eq!(
            api.endpoint("/eleves/42/notes.awp?verbe=get"),
            "https://api.ecoledirecte.com/v3/eleves/42/notes.awp?verbe=get&v=4.56.0"
        );
    }

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config = Config::from_toml("username = \"jdupont\"\npassword = \"pw\"\n").unwrap();
        assert_eq!(config.refresh_interval, 30);
        assert_eq!(config.lunch_break_time, "13:00");
        assert_eq!(config.grades_to_display, 15);
        assert_eq!(config.qcm_attempts, 5);
        assert_eq!(config.qcm_file, PathBuf::from("qcm.json"));
        assert!(!config.decode_html);
        assert!(config.notify.log);
        assert!(config.notify.webhook_url.is_none());
        assert_eq!(config.api.timeout_secs, 120);
    }

    #[test]
    fn test_validate_trims_username() {
        let mut config = Config::new("  jdupont ", "pw");
        config.validate().unwrap();
        assert_eq!(config.username, "jdupont");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::new("jdupont", "");
        assert!(config.validate().is_err());

        let mut config = Config::new("jdupont", "pw");
        config.refresh_interval = 2;
        assert!(config.validate().is_err());

        let mut config = Config::new("jdupont", "pw");
        config.lunch_break_time = "midi".into();
        assert!(config.validate().is_err());

        let mut config = Config::new("jdupont", "pw");
        config.qcm_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lunch_break_parsed() {
        let mut config = Config::new("jdupont", "pw");
        config.lunch_break_time = "12:30".into();
        assert_eq!(
            config.lunch_break().unwrap(),
            NaiveTime::from_hms_opt(12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_password_not_serialized() {
        let config = Config::new("jdupont", "secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
