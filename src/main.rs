//! smoke - browser-driven smoke scenarios for the Save It web app
//!
//! Drives a WebDriver browser through the login and reservation journeys
//! against an already running dev server, saving screenshots along the way.

use clap::Parser;
use smoke::cli;
use smoke::commands::{Commands, GlobalOptions};
use smoke::common::logging;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "smoke", about = "Browser-driven smoke scenarios")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: GlobalOptions,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // Held until main returns so the file log is flushed
    let _log_guard = logging::init_cli(cli.options.verbose);

    let result = cli::dispatch(cli.command, &cli.options).await;
    if let Err(e) = &result {
        eprintln!("Error: {e}");
    }

    // The outcome is reported on stdout and in the screenshots; only
    // --strict turns it into an exit status.
    ExitCode::from(cli::exit_status(&result, cli.options.strict))
}
