//! Error types for the smoke runner
//!
//! Most of these never reach the user as a process failure: the scenario
//! runner catches them at its top-level boundary and turns them into a
//! `failure` outcome plus a diagnostic screenshot. Only configuration and
//! scenario-loading errors surface from the CLI directly.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the smoke runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Invalid scenario '{name}': {reason}")]
    ScenarioParse { name: String, reason: String },

    // === Browser Errors ===
    #[error("Failed to open browser session at {endpoint}: {reason}. Is the WebDriver server running?")]
    BrowserLaunch { endpoint: String, reason: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Failed to load '{url}': {reason}. Is the app server running?")]
    Navigation { url: String, reason: String },

    #[error("Browser session already closed")]
    SessionClosed,

    // === Artifact Errors ===
    #[error("Failed to write artifact '{path}': {error}")]
    Artifact { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a browser launch error
    pub fn browser_launch(endpoint: &str, reason: impl ToString) -> Self {
        Self::BrowserLaunch {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a navigation error
    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a scenario parse error
    pub fn scenario_parse(name: &str, reason: impl ToString) -> Self {
        Self::ScenarioParse {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_mentions_endpoint() {
        let err = Error::browser_launch("http://localhost:9515", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("http://localhost:9515"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
