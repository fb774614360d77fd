//! CLI command definitions
//!
//! Defines the clap commands for the smoke CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with the configured test account
    Login,

    /// Log in, then reserve the first listed product
    #[command(alias = "reservation")]
    Reserve,

    /// Execute a scenario defined in a YAML file
    Run {
        /// Path to the YAML scenario file
        path: PathBuf,
    },

    /// Print a built-in scenario as YAML, with configuration filled in
    Show {
        /// Scenario name: login or reservation
        name: String,
    },
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the running app server
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory screenshots are written to
    #[arg(long, global = true)]
    pub screenshot_dir: Option<PathBuf>,

    /// WebDriver server URL
    #[arg(long, global = true)]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    pub headed: bool,

    /// Print the run report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Exit with status 1 unless the outcome is success
    #[arg(long, global = true)]
    pub strict: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,
}
