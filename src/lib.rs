//! smoke - browser-driven smoke scenarios
//!
//! Runs scripted user journeys (login, reservation) against a web app
//! through WebDriver and classifies each run as success, failure or
//! indeterminate from markers on the final page.

pub mod browser;
pub mod cli;
pub mod commands;
pub mod common;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Config, Error, Result};
pub use scenario::{Outcome, RunReport, Runner, RunnerOptions, Scenario, Step};
