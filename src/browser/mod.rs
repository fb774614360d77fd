//! Browser automation capability
//!
//! The runner only talks to the page through [`Browser`]; sessions come
//! from a [`Launcher`]. The production pair drives a W3C WebDriver endpoint,
//! the mock pair replays an in-memory site for rehearsals and tests.

pub mod idle;
pub mod locator;
pub mod mock;
pub mod webdriver;

use async_trait::async_trait;
use std::time::Duration;

use crate::common::Result;

pub use locator::{describe_chain, Locator, Query};
pub use webdriver::{WebDriverBrowser, WebDriverLauncher};

/// One open browser page
///
/// Element operations act on the first match in document order and report
/// whether anything matched instead of failing on an empty result.
#[async_trait]
pub trait Browser: Send {
    /// Load a URL
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Wait until network activity settles, returning false on timeout
    async fn wait_for_idle(&mut self, timeout: Duration) -> Result<bool>;

    async fn title(&mut self) -> Result<String>;

    /// Number of elements matching a locator
    async fn count(&mut self, locator: &Locator) -> Result<usize>;

    /// Type into the first matching input; false if nothing matched
    async fn fill_first(&mut self, locator: &Locator, value: &str) -> Result<bool>;

    /// Click the first matching element; false if nothing matched
    async fn click_first(&mut self, locator: &Locator) -> Result<bool>;

    /// Rendered text of the whole page
    async fn visible_text(&mut self) -> Result<String>;

    async fn screenshot_png(&mut self) -> Result<Vec<u8>>;

    /// End the session. Further calls fail with `SessionClosed`.
    async fn close(&mut self) -> Result<()>;
}

/// Opens fresh browser sessions
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Browser>>;

    /// Where sessions come from, for console output
    fn describe(&self) -> String;
}

/// Try each locator in order and return the first one with a match
pub async fn first_match<'a>(
    browser: &mut dyn Browser,
    chain: &'a [Locator],
) -> Result<Option<&'a Locator>> {
    for locator in chain {
        let count = browser.count(locator).await?;
        tracing::trace!(%locator, count, "locator probed");
        if count > 0 {
            return Ok(Some(locator));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::mock::{MockElement, MockLauncher, MockPage, MockSite};
    use super::*;

    #[tokio::test]
    async fn test_first_match_prefers_earlier_locator() {
        let site = MockSite::new().page(
            "http://app",
            MockPage::new("App")
                .element(MockElement::button("로그인"))
                .element(MockElement::button("로그인").test_id("login-button")),
        );
        let launcher = MockLauncher::new(site);
        let mut browser = launcher.launch().await.unwrap();
        browser.goto("http://app").await.unwrap();

        let chain = vec![
            Locator::TestId("missing".into()),
            Locator::Text("로그인".into()),
            Locator::TestId("login-button".into()),
        ];
        let found = first_match(browser.as_mut(), &chain).await.unwrap();
        assert_eq!(found, Some(&Locator::Text("로그인".into())));
    }

    #[tokio::test]
    async fn test_first_match_none_when_all_missing() {
        let site = MockSite::new().page("http://app", MockPage::new("App"));
        let launcher = MockLauncher::new(site);
        let mut browser = launcher.launch().await.unwrap();
        browser.goto("http://app").await.unwrap();

        let chain = vec![Locator::TestId("a".into()), Locator::Css("b".into())];
        assert_eq!(first_match(browser.as_mut(), &chain).await.unwrap(), None);
    }
}
