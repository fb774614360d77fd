//! Outcome classification
//!
//! A run never fails on an ambiguous page; it reports `indeterminate`
//! and leaves the call to whoever reads the screenshots.

use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::fmt;

use super::config::MarkerSet;
use crate::browser::Browser;
use crate::common::Result;

/// Three-way result of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    Indeterminate,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }

    /// Glyph for per-step lines
    pub fn glyph(self) -> ColoredString {
        match self {
            Outcome::Success => "✓".green(),
            Outcome::Failure => "✗".red(),
            Outcome::Indeterminate => "?".yellow(),
        }
    }

    /// Glyph for the closing summary line
    pub fn banner(self) -> &'static str {
        match self {
            Outcome::Success => "✅",
            Outcome::Failure => "❌",
            Outcome::Indeterminate => "❔",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

/// Which markers were visible in one look at the page
///
/// Each field holds a description of the first marker that matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub success: Option<String>,
    /// Failure text, e.g. an error banner
    pub failure_text: Option<String>,
    /// Failure element, e.g. the login form still on screen
    pub failure_element: Option<String>,
}

impl Observation {
    /// The marker behind a verdict, for console output
    pub fn evidence(&self, outcome: Outcome) -> Option<&str> {
        match outcome {
            Outcome::Success => self.success.as_deref(),
            Outcome::Failure => self
                .failure_text
                .as_deref()
                .or(self.failure_element.as_deref()),
            Outcome::Indeterminate => None,
        }
    }
}

/// Decide the outcome of one observation
///
/// Failure markers take precedence over success markers. Element failure
/// markers describe UI that may still be on its way out, so while one is
/// present the verdict stays open until the page is `settled` (the polling
/// window is over), even if a success marker is already visible.
pub fn classify(obs: &Observation, settled: bool) -> Outcome {
    if obs.failure_text.is_some() {
        Outcome::Failure
    } else if obs.failure_element.is_some() {
        if settled {
            Outcome::Failure
        } else {
            Outcome::Indeterminate
        }
    } else if obs.success.is_some() {
        Outcome::Success
    } else {
        Outcome::Indeterminate
    }
}

/// Look at the page once and record which markers are present
pub async fn observe(
    browser: &mut dyn Browser,
    success: &MarkerSet,
    failure: &MarkerSet,
) -> Result<Observation> {
    let text = browser.visible_text().await?;
    let mut obs = Observation {
        success: success.text_hit(&text).map(|m| format!("text \"{m}\"")),
        failure_text: failure.text_hit(&text).map(|m| format!("text \"{m}\"")),
        failure_element: None,
    };

    if obs.success.is_none() {
        obs.success = present(browser, &success.elements).await?;
    }
    obs.failure_element = present(browser, &failure.elements).await?;

    Ok(obs)
}

/// First marker element present on the page
async fn present(
    browser: &mut dyn Browser,
    elements: &[crate::browser::Locator],
) -> Result<Option<String>> {
    for locator in elements {
        if browser.count(locator).await? > 0 {
            return Ok(Some(format!("element {locator}")));
        }
    }
    Ok(None)
}
