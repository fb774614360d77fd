//! In-memory browser for rehearsals and tests
//!
//! A [`MockSite`] is a set of pages keyed by URL. Elements carry the
//! attributes locators look at, and a click can move to another page. Every
//! interaction is recorded in a shared [`MockJournal`] that outlives the
//! session, so callers can inspect what a run did after it closed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::locator::Locator;
use super::{Browser, Launcher};
use crate::common::{Error, Result};

/// Minimal PNG signature used as screenshot payload
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// An element on a mock page
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    pub text: String,
    pub placeholder: Option<String>,
    pub test_id: Option<String>,
    /// CSS selectors this element answers to, matched verbatim
    pub css: Vec<String>,
    /// URL of the page shown after a click
    pub on_click: Option<String>,
}

impl MockElement {
    pub fn button(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn input(placeholder: &str) -> Self {
        Self {
            placeholder: Some(placeholder.to_string()),
            ..Self::default()
        }
    }

    pub fn test_id(mut self, id: &str) -> Self {
        self.test_id = Some(id.to_string());
        self
    }

    pub fn css(mut self, selector: &str) -> Self {
        self.css.push(selector.to_string());
        self
    }

    pub fn navigates_to(mut self, url: &str) -> Self {
        self.on_click = Some(url.to_string());
        self
    }

    fn matches(&self, locator: &Locator) -> bool {
        match locator {
            Locator::Placeholder(s) => self.placeholder.as_deref().is_some_and(|p| p.contains(s.as_str())),
            Locator::Text(s) => normalize(&self.text) == normalize(s),
            Locator::TextContains(s) => normalize(&self.text).contains(&normalize(s)),
            Locator::TestId(s) => self.test_id.as_deref() == Some(s.as_str()),
            Locator::Css(s) => self.css.iter().any(|c| c == s),
        }
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A mock page
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub title: String,
    /// Free text rendered outside of any element
    pub text: String,
    pub elements: Vec<MockElement>,
    /// A busy page never reaches network idle
    pub busy: bool,
}

impl MockPage {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(text);
        self
    }

    pub fn element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn busy(mut self) -> Self {
        self.busy = true;
        self
    }
}

/// Injected failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFault {
    /// Clicking an element with this text returns an error
    ClickError(String),
    /// Clicking an element with this text panics
    ClickPanic(String),
    /// Every screenshot fails
    Screenshot,
}

/// A set of pages keyed by URL
#[derive(Debug, Clone, Default)]
pub struct MockSite {
    pages: HashMap<String, MockPage>,
    faults: Vec<MockFault>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn fault(mut self, fault: MockFault) -> Self {
        self.faults.push(fault);
        self
    }
}

/// Something a mock session did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Goto(String),
    Fill { locator: Locator, value: String },
    Click(Locator),
    Screenshot,
    Close,
}

/// Shared record of every mock session opened by one launcher
#[derive(Debug, Clone, Default)]
pub struct MockJournal {
    inner: Arc<Mutex<Vec<MockEvent>>>,
}

impl MockJournal {
    fn record(&self, event: MockEvent) {
        if let Ok(mut events) = self.inner.lock() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.inner.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn was_closed(&self) -> bool {
        self.events().contains(&MockEvent::Close)
    }

    /// Values typed into inputs, in order
    pub fn filled(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Fill { value, .. } => Some(value),
                _ => None,
            })
            .collect()
    }
}

/// Opens sessions on a [`MockSite`]
#[derive(Debug, Clone)]
pub struct MockLauncher {
    site: MockSite,
    journal: MockJournal,
    refuse: bool,
}

impl MockLauncher {
    pub fn new(site: MockSite) -> Self {
        Self {
            site,
            journal: MockJournal::default(),
            refuse: false,
        }
    }

    /// A launcher whose sessions never open
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(MockSite::new())
        }
    }

    pub fn journal(&self) -> MockJournal {
        self.journal.clone()
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>> {
        if self.refuse {
            return Err(Error::browser_launch("mock://", "connection refused"));
        }
        Ok(Box::new(MockBrowser {
            site: self.site.clone(),
            current: None,
            journal: self.journal.clone(),
            closed: false,
        }))
    }

    fn describe(&self) -> String {
        "mock browser".to_string()
    }
}

/// One mock session
#[derive(Debug)]
pub struct MockBrowser {
    site: MockSite,
    current: Option<String>,
    journal: MockJournal,
    closed: bool,
}

impl MockBrowser {
    fn page(&self) -> Result<&MockPage> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        let url = self
            .current
            .as_ref()
            .ok_or_else(|| Error::Browser("no page loaded".to_string()))?;
        self.site
            .pages
            .get(url)
            .ok_or_else(|| Error::Internal(format!("mock page vanished: {url}")))
    }

    fn first(&self, locator: &Locator) -> Result<Option<MockElement>> {
        Ok(self.page()?.elements.iter().find(|e| e.matches(locator)).cloned())
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn goto(&mut self, url: &str) -> Result<()> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        self.journal.record(MockEvent::Goto(url.to_string()));
        if !self.site.pages.contains_key(url) {
            return Err(Error::navigation(url, "connection refused"));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_idle(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(!self.page()?.busy)
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self.page()?.title.clone())
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize> {
        Ok(self.page()?.elements.iter().filter(|e| e.matches(locator)).count())
    }

    async fn fill_first(&mut self, locator: &Locator, value: &str) -> Result<bool> {
        if self.first(locator)?.is_none() {
            return Ok(false);
        }
        self.journal.record(MockEvent::Fill {
            locator: locator.clone(),
            value: value.to_string(),
        });
        Ok(true)
    }

    async fn click_first(&mut self, locator: &Locator) -> Result<bool> {
        let Some(element) = self.first(locator)? else {
            return Ok(false);
        };
        for fault in &self.site.faults {
            match fault {
                MockFault::ClickError(text) if *text == element.text => {
                    return Err(Error::Browser(format!("element '{text}' is not interactable")));
                }
                MockFault::ClickPanic(text) if *text == element.text => {
                    panic!("mock click on '{text}' blew up");
                }
                _ => {}
            }
        }
        self.journal.record(MockEvent::Click(locator.clone()));
        if let Some(target) = element.on_click {
            self.current = Some(target);
            self.page()?;
        }
        Ok(true)
    }

    async fn visible_text(&mut self) -> Result<String> {
        let page = self.page()?;
        let mut text = page.text.clone();
        for element in &page.elements {
            if !element.text.is_empty() {
                text.push('\n');
                text.push_str(&element.text);
            }
        }
        Ok(text)
    }

    async fn screenshot_png(&mut self) -> Result<Vec<u8>> {
        if self.site.faults.contains(&MockFault::Screenshot) {
            return Err(Error::Browser("screenshot failed".to_string()));
        }
        let page = self.page()?;
        self.journal.record(MockEvent::Screenshot);
        let mut png = PNG_MAGIC.to_vec();
        png.extend_from_slice(page.title.as_bytes());
        Ok(png)
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.journal.record(MockEvent::Close);
        }
        Ok(())
    }
}
