//! WebDriver-backed browser sessions
//!
//! Talks W3C WebDriver to an already running driver server (chromedriver by
//! default) through `thirtyfour`.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};

use super::idle::{IdleTracker, IDLE_PROBE};
use super::locator::{Locator, Query};
use super::{Browser, Launcher};
use crate::common::config::{BrowserConfig, Config, Timeouts};
use crate::common::{Error, Result};

impl From<WebDriverError> for Error {
    fn from(e: WebDriverError) -> Self {
        Error::Browser(e.to_string())
    }
}

/// Opens Chrome sessions on a WebDriver server
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    browser: BrowserConfig,
    timeouts: Timeouts,
}

impl WebDriverLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            browser: config.browser.clone(),
            timeouts: config.timeouts.clone(),
        }
    }

    fn capabilities(&self) -> Result<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        if self.browser.headless {
            caps.set_headless()?;
        }
        caps.add_arg(&format!(
            "--window-size={},{}",
            self.browser.window_width, self.browser.window_height
        ))?;
        Ok(caps)
    }
}

#[async_trait]
impl Launcher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>> {
        let endpoint = &self.browser.webdriver_url;
        let caps = self.capabilities()?;

        tracing::debug!(%endpoint, headless = self.browser.headless, "opening WebDriver session");
        let driver = WebDriver::new(endpoint.as_str(), caps)
            .await
            .map_err(|e| Error::browser_launch(endpoint, e))?;

        Ok(Box::new(WebDriverBrowser {
            driver: Some(driver),
            idle_quiet: self.timeouts.idle_quiet(),
            poll_interval: self.timeouts.poll_interval(),
        }))
    }

    fn describe(&self) -> String {
        format!("WebDriver at {}", self.browser.webdriver_url)
    }
}

/// One WebDriver session
pub struct WebDriverBrowser {
    driver: Option<WebDriver>,
    idle_quiet: Duration,
    poll_interval: Duration,
}

impl WebDriverBrowser {
    fn driver(&self) -> Result<&WebDriver> {
        self.driver.as_ref().ok_or(Error::SessionClosed)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<WebElement>> {
        let by = match locator.query() {
            Query::Css(css) => By::Css(css),
            Query::XPath(xpath) => By::XPath(xpath),
        };
        Ok(self.driver()?.find_all(by).await?)
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.driver()?
            .goto(url)
            .await
            .map_err(|e| Error::navigation(url, e))
    }

    async fn wait_for_idle(&mut self, timeout: Duration) -> Result<bool> {
        let start = Instant::now();
        let mut tracker = IdleTracker::new(self.idle_quiet);

        loop {
            let ret = self.driver()?.execute(IDLE_PROBE, Vec::new()).await?;
            let sample = ret.json();
            let ready = sample["ready"].as_bool().unwrap_or(false);
            let resources = sample["resources"].as_u64().unwrap_or(0) as usize;

            if tracker.observe(ready, resources, Instant::now()) {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self.driver()?.title().await?)
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize> {
        Ok(self.find_all(locator).await?.len())
    }

    async fn fill_first(&mut self, locator: &Locator, value: &str) -> Result<bool> {
        let elements = self.find_all(locator).await?;
        let Some(input) = elements.first() else {
            return Ok(false);
        };
        input.clear().await?;
        input.send_keys(value).await?;
        Ok(true)
    }

    async fn click_first(&mut self, locator: &Locator) -> Result<bool> {
        let elements = self.find_all(locator).await?;
        let Some(element) = elements.first() else {
            return Ok(false);
        };
        element.click().await?;
        Ok(true)
    }

    async fn visible_text(&mut self) -> Result<String> {
        let ret = self
            .driver()?
            .execute("return document.body ? document.body.innerText : '';", Vec::new())
            .await?;
        Ok(ret.json().as_str().unwrap_or_default().to_string())
    }

    async fn screenshot_png(&mut self) -> Result<Vec<u8>> {
        Ok(self.driver()?.screenshot_as_png().await?)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await?;
        }
        Ok(())
    }
}
