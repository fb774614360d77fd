//! Configuration file handling
//!
//! Replaces the hardcoded target URL, credentials and output directory of a
//! throwaway smoke script with one explicit object handed to the runner.
//! Every field has a documented default, so an absent file is valid.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Application under test
    #[serde(default)]
    pub target: TargetConfig,

    /// Login credentials used by the built-in scenarios
    #[serde(default)]
    pub credentials: Credentials,

    /// Screenshot output
    #[serde(default)]
    pub artifacts: ArtifactConfig,

    /// WebDriver session settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Application under test
#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    /// Base URL of the already-running app server
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8081".to_string()
}

/// Credentials typed into the login form
#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    #[serde(default = "default_email")]
    pub email: String,

    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: default_email(),
            password: default_password(),
        }
    }
}

fn default_email() -> String {
    "test@test.com".to_string()
}
fn default_password() -> String {
    "test1234".to_string()
}

/// Screenshot output settings
#[derive(Debug, Deserialize, Clone)]
pub struct ArtifactConfig {
    /// Directory screenshots are written to, created if absent
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: default_screenshot_dir(),
        }
    }
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("tests").join("screenshots")
}

/// WebDriver session settings
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    /// WebDriver server (chromedriver, geckodriver, selenium)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Viewport width; defaults to a phone-sized window
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}
fn default_headless() -> bool {
    true
}
fn default_window_width() -> u32 {
    390
}
fn default_window_height() -> u32 {
    844
}

/// Timeout settings
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Upper bound for a page load plus network idle
    #[serde(default = "default_page_load")]
    pub page_load_secs: u64,

    /// How long the resource count must stay unchanged to count as idle
    #[serde(default = "default_idle_quiet")]
    pub idle_quiet_ms: u64,

    /// Default polling window for classify and wait_for steps
    #[serde(default = "default_classify")]
    pub classify_secs: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_load_secs: default_page_load(),
            idle_quiet_ms: default_idle_quiet(),
            classify_secs: default_classify(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_page_load() -> u64 {
    15
}
fn default_idle_quiet() -> u64 {
    500
}
fn default_classify() -> u64 {
    5
}
fn default_poll_interval() -> u64 {
    250
}

impl Timeouts {
    pub fn page_load(&self) -> Duration {
        Duration::from_secs(self.page_load_secs)
    }

    pub fn idle_quiet(&self) -> Duration {
        Duration::from_millis(self.idle_quiet_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero interval would spin the poll loops
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the platform config file is
    /// used if present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
