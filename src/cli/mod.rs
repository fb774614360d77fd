//! CLI command handling
//!
//! Resolves configuration, picks the scenario and hands it to the runner.

use crate::browser::WebDriverLauncher;
use crate::commands::{Commands, GlobalOptions};
use crate::common::{Config, Result};
use crate::scenario::{builtin, Progress, RunReport, Runner, RunnerOptions, Scenario};

/// What a command produced
pub enum Completion {
    /// A scenario ran
    Ran(RunReport),
    /// Nothing was run
    Done,
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, options: &GlobalOptions) -> Result<Completion> {
    let config = resolve_config(options)?;

    let scenario = match command {
        Commands::Login => builtin::login(&config)?,
        Commands::Reserve => builtin::reservation(&config)?,
        Commands::Run { path } => Scenario::load(&path, &builtin::vars(&config))?,
        Commands::Show { name } => {
            let scenario = builtin::by_name(&name, &config)?;
            let yaml = serde_yaml::to_string(&scenario)
                .map_err(|e| crate::Error::Internal(format!("Failed to render scenario: {}", e)))?;
            print!("{}", yaml);
            return Ok(Completion::Done);
        }
    };

    tracing::info!(
        scenario = %scenario.name,
        base_url = %config.target.base_url,
        screenshots = %config.artifacts.screenshot_dir.display(),
        "starting scenario"
    );

    let runner = Runner::new(
        WebDriverLauncher::new(&config),
        runner_options(&config, options),
    );
    let report = runner.run(&scenario).await;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(Completion::Ran(report))
}

/// Runner settings for this invocation
///
/// With `--json` the report is the only thing on stdout.
pub fn runner_options(config: &Config, options: &GlobalOptions) -> RunnerOptions {
    let progress = if options.json {
        Progress::Stderr
    } else {
        Progress::Stdout
    };
    RunnerOptions::from_config(config, options.verbose).with_progress(progress)
}

/// Process exit status for a finished command
///
/// The outcome only matters with `--strict`; errors always exit 1.
pub fn exit_status(result: &Result<Completion>, strict: bool) -> u8 {
    match result {
        Ok(Completion::Ran(report)) if strict && !report.outcome.is_success() => 1,
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Load the configuration file and apply command-line overrides
pub fn resolve_config(options: &GlobalOptions) -> Result<Config> {
    let mut config = Config::load(options.config.as_deref())?;

    if let Some(url) = &options.base_url {
        config.target.base_url = url.clone();
    }
    if let Some(dir) = &options.screenshot_dir {
        config.artifacts.screenshot_dir = dir.clone();
    }
    if let Some(url) = &options.webdriver_url {
        config.browser.webdriver_url = url.clone();
    }
    if options.headed {
        config.browser.headless = false;
    }

    Ok(config)
}
