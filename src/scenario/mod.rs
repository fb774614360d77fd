//! Scenario runner
//!
//! Loads YAML scenarios, drives them through a [`crate::browser::Browser`]
//! and classifies what the page shows at the end.

pub mod artifacts;
pub mod builtin;
pub mod classify;
mod config;
mod runner;

pub use artifacts::ArtifactWriter;
pub use classify::{classify, Observation, Outcome};
pub use config::*;
pub use runner::{resolve_url, Progress, RunReport, Runner, RunnerOptions};
