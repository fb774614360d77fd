//! Locator strategies
//!
//! A step names its target as an ordered list of locators. Each one is tried
//! in turn and reports found / not found; the first locator with a match
//! wins, and within it the first element in document order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule for finding an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LocatorSpec", into = "LocatorSpec")]
pub enum Locator {
    /// Substring of the `placeholder` attribute
    Placeholder(String),
    /// Exact visible text, whitespace-normalized
    Text(String),
    /// Substring of the visible text
    TextContains(String),
    /// Exact `data-testid` attribute
    TestId(String),
    /// Raw CSS selector
    Css(String),
}

/// Query understood by a WebDriver endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl Locator {
    /// Translate into a CSS or XPath query
    ///
    /// Text locators resolve to the innermost matching element so that a
    /// click lands on the label and bubbles up to its touchable wrapper.
    pub fn query(&self) -> Query {
        match self {
            Locator::Placeholder(s) => Query::Css(format!("[placeholder*={}]", css_string(s))),
            Locator::TestId(s) => Query::Css(format!("[data-testid={}]", css_string(s))),
            Locator::Css(s) => Query::Css(s.clone()),
            Locator::Text(s) => {
                let lit = xpath_literal(s);
                Query::XPath(format!(
                    "//body//*[normalize-space(.)={lit}][not(.//*[normalize-space(.)={lit}])]"
                ))
            }
            Locator::TextContains(s) => {
                let lit = xpath_literal(s);
                Query::XPath(format!(
                    "//body//*[contains(normalize-space(.),{lit})][not(.//*[contains(normalize-space(.),{lit})])]"
                ))
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Placeholder(s) => write!(f, "placeholder*=\"{s}\""),
            Locator::Text(s) => write!(f, "text=\"{s}\""),
            Locator::TextContains(s) => write!(f, "text~=\"{s}\""),
            Locator::TestId(s) => write!(f, "test_id=\"{s}\""),
            Locator::Css(s) => write!(f, "css({s})"),
        }
    }
}

/// Render a locator chain for console output
pub fn describe_chain(chain: &[Locator]) -> String {
    chain
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Quote a string for use inside a CSS attribute selector
fn css_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Quote a string as an XPath 1.0 literal
///
/// XPath has no escape sequences, so a string holding both quote kinds has
/// to be assembled with `concat()`.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{s}'")
    } else if !s.contains('"') {
        format!("\"{s}\"")
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// On-disk form: a single-key map such as `{ placeholder: 이메일 }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LocatorSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    test_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    css: Option<String>,
}

impl TryFrom<LocatorSpec> for Locator {
    type Error = String;

    fn try_from(spec: LocatorSpec) -> Result<Self, Self::Error> {
        let mut found = Vec::new();
        if let Some(v) = spec.placeholder {
            found.push(Locator::Placeholder(v));
        }
        if let Some(v) = spec.text {
            found.push(Locator::Text(v));
        }
        if let Some(v) = spec.text_contains {
            found.push(Locator::TextContains(v));
        }
        if let Some(v) = spec.test_id {
            found.push(Locator::TestId(v));
        }
        if let Some(v) = spec.css {
            found.push(Locator::Css(v));
        }

        if found.len() != 1 {
            return Err(format!(
                "a locator needs exactly one of placeholder, text, text_contains, test_id, css (got {})",
                found.len()
            ));
        }
        let locator = found.remove(0);
        let value = match &locator {
            Locator::Placeholder(v)
            | Locator::Text(v)
            | Locator::TextContains(v)
            | Locator::TestId(v)
            | Locator::Css(v) => v,
        };
        if value.trim().is_empty() {
            return Err(format!("empty locator value in {locator}"));
        }
        Ok(locator)
    }
}

impl From<Locator> for LocatorSpec {
    fn from(locator: Locator) -> Self {
        let mut spec = LocatorSpec::default();
        match locator {
            Locator::Placeholder(v) => spec.placeholder = Some(v),
            Locator::Text(v) => spec.text = Some(v),
            Locator::TextContains(v) => spec.text_contains = Some(v),
            Locator::TestId(v) => spec.test_id = Some(v),
            Locator::Css(v) => spec.css = Some(v),
        }
        spec
    }
}
