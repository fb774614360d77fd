//! Scenario runner
//!
//! Executes a scenario against a fresh browser session. The run always ends
//! with a report: missing elements become warnings, errors and panics are
//! caught once at the top, a diagnostic screenshot is attempted and the
//! session is closed on every path.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::time::Instant;

use crate::browser::{describe_chain, first_match, Browser, Launcher};
use crate::common::config::{Config, Timeouts};
use crate::common::{Error, Result};

use super::artifacts::ArtifactWriter;
use super::classify::{classify, observe, Observation, Outcome};
use super::config::{MarkerSet, Scenario, Step};

/// Where progress lines are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Progress {
    #[default]
    Stdout,
    /// Keeps stdout free for machine-readable output
    Stderr,
}

/// Print a progress line to the stream chosen in the options
macro_rules! say {
    ($options:expr, $($arg:tt)*) => {
        match $options.progress {
            Progress::Stdout => println!($($arg)*),
            Progress::Stderr => eprintln!($($arg)*),
        }
    };
}

/// Settings the runner needs from configuration
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Used when a scenario has no URL of its own
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub timeouts: Timeouts,
    pub verbose: bool,
    pub progress: Progress,
}

impl RunnerOptions {
    pub fn from_config(config: &Config, verbose: bool) -> Self {
        Self {
            base_url: config.target.base_url.clone(),
            screenshot_dir: config.artifacts.screenshot_dir.clone(),
            timeouts: config.timeouts.clone(),
            verbose,
            progress: Progress::Stdout,
        }
    }

    /// Send progress lines to the given stream
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }
}

/// Result of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub name: String,
    pub outcome: Outcome,
    pub steps_run: usize,
    pub steps_total: usize,
    pub warnings: Vec<String>,
    pub screenshots: Vec<PathBuf>,
    pub error: Option<String>,
}

/// Runs scenarios, one fresh session each
pub struct Runner<L> {
    launcher: L,
    options: RunnerOptions,
}

impl<L: Launcher> Runner<L> {
    pub fn new(launcher: L, options: RunnerOptions) -> Self {
        Self { launcher, options }
    }

    /// Run a scenario to completion
    ///
    /// Never returns an error and never panics on account of the scenario.
    pub async fn run(&self, scenario: &Scenario) -> RunReport {
        let mut report = RunReport {
            name: scenario.name.clone(),
            outcome: Outcome::Indeterminate,
            steps_run: 0,
            steps_total: scenario.steps.len(),
            warnings: Vec::new(),
            screenshots: Vec::new(),
            error: None,
        };

        say!(self.options, 
            "\n{} {}",
            "Running Scenario:".blue().bold(),
            scenario.name.white().bold()
        );
        if let Some(desc) = &scenario.description {
            say!(self.options, "  {}", desc.dimmed());
        }

        let artifacts = ArtifactWriter::new(&self.options.screenshot_dir, &scenario.artifact_prefix);
        if let Err(e) = artifacts.ensure_dir() {
            return self.abort(report, e);
        }

        let browser = match self.launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => return self.abort(report, e),
        };
        if self.options.verbose {
            say!(self.options, "  Browser: {}", self.launcher.describe().dimmed());
        }

        let mut session = Session {
            browser,
            artifacts,
            options: &self.options,
            warnings: Vec::new(),
            steps_run: 0,
            outcome: Outcome::Indeterminate,
        };

        let caught = AssertUnwindSafe(session.execute(scenario))
            .catch_unwind()
            .await;
        let error = match caught {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(panic) => Some(panic_message(panic.as_ref())),
        };

        if let Some(message) = &error {
            tracing::error!(scenario = %scenario.name, error = %message, "scenario aborted");
            say!(self.options, "  {} {}", "✗".red(), message);
            session.capture_diagnostic().await;
            session.outcome = Outcome::Failure;
        }

        if let Err(e) = session.browser.close().await {
            tracing::warn!(error = %e, "failed to close browser session");
        }

        report.outcome = session.outcome;
        report.steps_run = session.steps_run;
        report.warnings = session.warnings;
        report.screenshots = session.artifacts.written().to_vec();
        report.error = error;

        self.summarize(&report);
        report
    }

    /// Report a run that never got a working session
    fn abort(&self, mut report: RunReport, error: Error) -> RunReport {
        tracing::error!(scenario = %report.name, error = %error, "scenario could not start");
        say!(self.options, "  {} {}", "✗".red(), error);
        report.outcome = Outcome::Failure;
        report.error = Some(error.to_string());
        self.summarize(&report);
        report
    }

    fn summarize(&self, report: &RunReport) {
        say!(self.options, 
            "\n{} {}: {} ({}/{} steps, {} warnings). Screenshots: {}\n",
            report.outcome.banner(),
            report.name.bold(),
            report.outcome.to_string().bold(),
            report.steps_run,
            report.steps_total,
            report.warnings.len(),
            self.options.screenshot_dir.display()
        );
    }
}

enum Flow {
    Continue,
    Stop,
}

/// State of one run over an open browser
struct Session<'a> {
    browser: Box<dyn Browser>,
    artifacts: ArtifactWriter,
    options: &'a RunnerOptions,
    warnings: Vec<String>,
    steps_run: usize,
    outcome: Outcome,
}

impl Session<'_> {
    async fn execute(&mut self, scenario: &Scenario) -> Result<()> {
        let start_url = scenario
            .url
            .clone()
            .unwrap_or_else(|| self.options.base_url.clone());
        self.navigate(&start_url, None).await?;
        say!(self.options, "  {} Opened {}", "✓".green(), start_url.dimmed());

        say!(self.options, "\n{}", "Steps:".cyan());
        for (i, step) in scenario.steps.iter().enumerate() {
            let step_num = i + 1;
            self.steps_run = step_num;
            tracing::debug!(step = step_num, kind = step.kind(), "executing step");

            if let Flow::Stop = self.execute_step(step, step_num, &start_url).await? {
                say!(self.options, 
                    "  {} Step {}: checkpoint failed, stopping",
                    "✗".red(),
                    step_num
                );
                break;
            }
        }
        Ok(())
    }

    async fn execute_step(&mut self, step: &Step, step_num: usize, start_url: &str) -> Result<Flow> {
        match step {
            Step::Navigate { url, timeout_secs } => {
                let url = resolve_url(start_url, url);
                self.navigate(&url, *timeout_secs).await?;
                self.ok(step_num, &format!("navigate {}", url));
            }
            Step::Fill { locate, value } => {
                let filled = match first_match(self.browser.as_mut(), locate).await? {
                    Some(locator) => self.browser.fill_first(locator, value).await?.then_some(locator),
                    None => None,
                };
                match filled {
                    Some(locator) => self.ok(step_num, &format!("fill {}", locator)),
                    None => self.warn(step_num, &format!("no input for {}", describe_chain(locate))),
                }
            }
            Step::Click { locate } => {
                let clicked = match first_match(self.browser.as_mut(), locate).await? {
                    Some(locator) => self.browser.click_first(locator).await?.then_some(locator),
                    None => None,
                };
                match clicked {
                    Some(locator) => self.ok(step_num, &format!("click {}", locator)),
                    None => self.warn(
                        step_num,
                        &format!("nothing to click for {}", describe_chain(locate)),
                    ),
                }
            }
            Step::Wait { millis } => {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
                self.ok(step_num, &format!("wait {} ms", millis));
            }
            Step::WaitFor {
                markers,
                timeout_secs,
            } => {
                let timeout = self.window(*timeout_secs);
                if self.wait_for(markers, timeout).await? {
                    self.ok(step_num, "wait_for marker visible");
                } else {
                    self.warn(
                        step_num,
                        &format!("no marker visible after {} ms", timeout.as_millis()),
                    );
                }
            }
            Step::Screenshot { label } => {
                let png = self.browser.screenshot_png().await?;
                let path = self.artifacts.save(label, &png)?;
                self.ok(step_num, &format!("screenshot {}", path.display()));
            }
            Step::Inspect { locate } => {
                let title = self.browser.title().await?;
                let title = if title.is_empty() { "(none)".to_string() } else { title };
                let mut counts = Vec::with_capacity(locate.len());
                for locator in locate {
                    let count = self.browser.count(locator).await?;
                    counts.push(format!("{}: {}", locator, count));
                }
                self.ok(
                    step_num,
                    &format!("inspect title {} [{}]", title, counts.join(", ")),
                );
            }
            Step::Classify {
                success,
                failure,
                timeout_secs,
                stop_on_failure,
            } => {
                let timeout = self.window(*timeout_secs);
                let (verdict, obs) = self.poll_verdict(success, failure, timeout).await?;
                self.outcome = verdict;

                let evidence = obs
                    .evidence(verdict)
                    .map(|e| format!(" ({})", e))
                    .unwrap_or_default();
                say!(self.options, 
                    "  {} Step {}: classify → {}{}",
                    verdict.glyph(),
                    step_num,
                    verdict,
                    evidence.dimmed()
                );
                tracing::info!(step = step_num, outcome = %verdict, "classified");

                if verdict == Outcome::Failure && *stop_on_failure {
                    return Ok(Flow::Stop);
                }
            }
        }
        Ok(Flow::Continue)
    }

    async fn navigate(&mut self, url: &str, timeout_secs: Option<u64>) -> Result<()> {
        let timeout = timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.options.timeouts.page_load());

        self.browser.goto(url).await?;
        if !self.browser.wait_for_idle(timeout).await? {
            let message = format!(
                "network still busy after {} s on {}",
                timeout.as_secs(),
                url
            );
            self.warnings.push(message.clone());
            tracing::warn!(%url, "network did not settle");
            say!(self.options, "  {} {}", "⚠".yellow(), message);
        }
        Ok(())
    }

    /// Poll until any marker in the set is visible
    async fn wait_for(&mut self, markers: &MarkerSet, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let obs = observe(self.browser.as_mut(), markers, &MarkerSet::default()).await?;
            if obs.success.is_some() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.options.timeouts.poll_interval()).await;
        }
    }

    /// Poll until a verdict other than indeterminate, or the window closes
    async fn poll_verdict(
        &mut self,
        success: &MarkerSet,
        failure: &MarkerSet,
        timeout: Duration,
    ) -> Result<(Outcome, Observation)> {
        let deadline = Instant::now() + timeout;
        loop {
            let obs = observe(self.browser.as_mut(), success, failure).await?;
            let settled = Instant::now() >= deadline;
            let verdict = classify(&obs, settled);
            if verdict != Outcome::Indeterminate || settled {
                return Ok((verdict, obs));
            }
            tokio::time::sleep(self.options.timeouts.poll_interval()).await;
        }
    }

    /// Best effort: a broken page may not even screenshot
    async fn capture_diagnostic(&mut self) {
        let saved = match self.browser.screenshot_png().await {
            Ok(png) => self.artifacts.save_diagnostic(&png),
            Err(e) => Err(e),
        };
        match saved {
            Ok(path) => say!(self.options, "  {} diagnostic screenshot {}", "⚠".yellow(), path.display()),
            Err(e) => tracing::warn!(error = %e, "diagnostic screenshot failed"),
        }
    }

    fn window(&self, timeout_secs: Option<u64>) -> Duration {
        Duration::from_secs(timeout_secs.unwrap_or(self.options.timeouts.classify_secs))
    }

    fn ok(&self, step_num: usize, what: &str) {
        say!(self.options, "  {} Step {}: {}", "✓".green(), step_num, what.dimmed());
    }

    fn warn(&mut self, step_num: usize, what: &str) {
        tracing::warn!(step = step_num, "{}", what);
        say!(self.options, "  {} Step {}: {}", "⚠".yellow(), step_num, what);
        self.warnings.push(format!("step {}: {}", step_num, what));
    }
}

/// Resolve a step URL against the scenario's start URL
pub fn resolve_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if let Some(path) = url.strip_prefix('/') {
        format!("{}/{}", origin(base), path)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), url)
    }
}

/// Scheme and authority of a URL
fn origin(url: &str) -> &str {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[after_scheme..].find('/') {
        Some(i) => &url[..after_scheme + i],
        None => url.trim_end_matches('/'),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
