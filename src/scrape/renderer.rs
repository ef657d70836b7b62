//! The page renderer seam between the price extractor and a real browser.
//!
//! A [`PageRenderer`] hands out one [`RenderSession`] per attempt. Sessions
//! must be given back through [`RenderSession::dispose`]; the extractor does
//! that on every path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// One selector candidate for locating an element. In config files it is a
/// `{kind: css|xpath, pattern: ...}` map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "lowercase")]
pub enum Locator {
    /// Attribute/class based CSS selector.
    Css(String),
    /// Structural or text based XPath expression.
    XPath(String),
}

impl Locator {
    /// Candidates for the price element on Maya TASE pages, most specific
    /// first. The XPath entry is a broad fallback and can hit unrelated
    /// shekel amounts, so it stays last.
    pub fn default_price_chain() -> Vec<Locator> {
        vec![
            Locator::Css("[data-test='currPrice']".to_string()),
            Locator::Css(".lastGateValue".to_string()),
            Locator::Css("[class*='currentPrice']".to_string()),
            Locator::XPath(
                "//*[contains(@class,'price')]//*[contains(text(),'₪') or contains(text(),\"אג'\")]"
                    .to_string(),
            ),
        ]
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css:{selector}"),
            Locator::XPath(expr) => write!(f, "xpath:{expr}"),
        }
    }
}

/// Opaque reference to an element found in a session. Only meaningful to
/// the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementHandle(usize);

impl ElementHandle {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn id(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },
    #[error("browser protocol error: {0}")]
    Protocol(String),
    #[error("element handle {0} is no longer valid")]
    StaleElement(usize),
}

#[async_trait]
pub trait RenderSession: Send {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RendererError>;

    /// Polls for the locator until it matches or `timeout` elapses. A miss is
    /// `Ok(None)`, not an error.
    async fn wait_for_element(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, RendererError>;

    async fn text(&mut self, element: &ElementHandle) -> Result<String, RendererError>;

    async fn page_source(&mut self) -> Result<String, RendererError>;

    /// PNG bytes of the current viewport.
    async fn screenshot(&mut self) -> Result<Vec<u8>, RendererError>;

    async fn dispose(self: Box<Self>) -> Result<(), RendererError>;
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RendererError>;
}
