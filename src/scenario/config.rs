//! Scenario definition types
//!
//! Scenarios are written in YAML. String fields may reference
//! `{{base_url}}`, `{{email}}` and `{{password}}`, which are filled in from
//! configuration before the run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::browser::Locator;
use crate::common::{Error, Result};

/// Template variables available to scenario files
pub type Vars = HashMap<&'static str, String>;

/// A named, ordered user journey
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Scenario {
    pub name: String,
    /// Optional description of what the scenario checks
    pub description: Option<String>,
    /// Page opened before the first step; defaults to the base URL
    pub url: Option<String>,
    /// Prepended to every screenshot filename
    #[serde(default)]
    pub artifact_prefix: String,
    pub steps: Vec<Step>,
}

/// A single interaction within a scenario
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load a URL (absolute, or a path under the scenario URL)
    Navigate {
        url: String,
        timeout_secs: Option<u64>,
    },
    /// Type into the first input found by the locator chain
    Fill { locate: Vec<Locator>, value: String },
    /// Click the first element found by the locator chain
    Click { locate: Vec<Locator> },
    /// Sleep for a fixed time
    Wait { millis: u64 },
    /// Poll until any marker is visible
    WaitFor {
        markers: MarkerSet,
        timeout_secs: Option<u64>,
    },
    /// Save the current page as the next numbered screenshot
    Screenshot { label: String },
    /// Print the page title and how many elements each locator finds
    Inspect {
        #[serde(default)]
        locate: Vec<Locator>,
    },
    /// Decide the outcome from markers on the page
    Classify {
        #[serde(default)]
        success: MarkerSet,
        #[serde(default)]
        failure: MarkerSet,
        timeout_secs: Option<u64>,
        /// End the scenario here when the verdict is failure
        #[serde(default)]
        stop_on_failure: bool,
    },
}

/// Markers indicating a page state
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    /// Substrings of the visible page text
    #[serde(default)]
    pub text: Vec<String>,
    /// Elements whose presence is the marker
    #[serde(default)]
    pub elements: Vec<Locator>,
}

impl MarkerSet {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.elements.is_empty()
    }

    /// First text marker contained in `page_text`
    pub fn text_hit(&self, page_text: &str) -> Option<&str> {
        self.text
            .iter()
            .find(|marker| page_text.contains(marker.as_str()))
            .map(|s| s.as_str())
    }
}

impl Step {
    /// Short name used in progress lines
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Navigate { .. } => "navigate",
            Step::Fill { .. } => "fill",
            Step::Click { .. } => "click",
            Step::Wait { .. } => "wait",
            Step::WaitFor { .. } => "wait_for",
            Step::Screenshot { .. } => "screenshot",
            Step::Inspect { .. } => "inspect",
            Step::Classify { .. } => "classify",
        }
    }

    fn render(&mut self, vars: &Vars) {
        match self {
            Step::Navigate { url, .. } => *url = render(url, vars),
            Step::Fill { locate, value } => {
                render_chain(locate, vars);
                *value = render(value, vars);
            }
            Step::Click { locate } | Step::Inspect { locate } => render_chain(locate, vars),
            Step::WaitFor { markers, .. } => markers.render(vars),
            Step::Classify {
                success, failure, ..
            } => {
                success.render(vars);
                failure.render(vars);
            }
            Step::Screenshot { label } => *label = render(label, vars),
            Step::Wait { .. } => {}
        }
    }
}

impl MarkerSet {
    fn render(&mut self, vars: &Vars) {
        for text in &mut self.text {
            *text = render(text, vars);
        }
        render_chain(&mut self.elements, vars);
    }
}

fn render_chain(chain: &mut [Locator], vars: &Vars) {
    for locator in chain {
        match locator {
            Locator::Placeholder(s)
            | Locator::Text(s)
            | Locator::TextContains(s)
            | Locator::TestId(s)
            | Locator::Css(s) => *s = render(s, vars),
        }
    }
}

/// Replace `{{name}}` references; unknown names are left untouched
pub fn render(template: &str, vars: &Vars) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

impl Scenario {
    /// Parse a scenario from YAML text
    pub fn from_yaml(source_name: &str, content: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(content)
            .map_err(|e| Error::scenario_parse(source_name, e))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario file and fill in template variables
    pub fn load(path: &Path, vars: &Vars) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let mut scenario = Self::from_yaml(&path.display().to_string(), &content)?;
        scenario.render(vars);
        Ok(scenario)
    }

    /// Fill in template variables in every string field
    pub fn render(&mut self, vars: &Vars) {
        if let Some(url) = &mut self.url {
            *url = render(url, vars);
        }
        for step in &mut self.steps {
            step.render(vars);
        }
    }

    /// Reject steps that could never do anything
    pub fn validate(&self) -> Result<()> {
        let invalid = |step_num: usize, reason: &str| {
            Error::scenario_parse(&self.name, format!("step {step_num}: {reason}"))
        };

        if self.name.trim().is_empty() {
            return Err(Error::scenario_parse("<unnamed>", "scenario name is empty"));
        }

        for (i, step) in self.steps.iter().enumerate() {
            let step_num = i + 1;
            match step {
                Step::Fill { locate, .. } | Step::Click { locate } if locate.is_empty() => {
                    return Err(invalid(step_num, "needs at least one locator"));
                }
                Step::Screenshot { label } => {
                    if label.is_empty()
                        || !label
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                    {
                        return Err(invalid(
                            step_num,
                            "screenshot label must be non-empty [A-Za-z0-9_-]",
                        ));
                    }
                }
                Step::WaitFor { markers, .. } if markers.is_empty() => {
                    return Err(invalid(step_num, "wait_for needs at least one marker"));
                }
                Step::Classify {
                    success, failure, ..
                } if success.is_empty() && failure.is_empty() => {
                    return Err(invalid(step_num, "classify needs success or failure markers"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
