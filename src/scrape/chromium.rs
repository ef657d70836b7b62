//! Headless Chromium backed [`PageRenderer`], driven over CDP by chromiumoxide.

use super::renderer::{ElementHandle, Locator, PageRenderer, RenderSession, RendererError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Hides the most obvious automation tells before any page script runs.
const STEALTH_SCRIPT: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined, configurable: true });
    if (!window.chrome) { window.chrome = {}; }
    if (!window.chrome.runtime) { window.chrome.runtime = {}; }
    Object.defineProperty(navigator, 'languages', { get: () => ['he-IL', 'he', 'en-US', 'en'], configurable: true });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5], configurable: true });
})();
"#;

#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    user_agent: String,
}

impl ChromiumRenderer {
    pub fn new(user_agent: &str) -> Self {
        Self {
            executable: None,
            user_agent: user_agent.to_string(),
        }
    }

    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }

    fn browser_config(&self) -> Result<BrowserConfig, RendererError> {
        let mut builder = BrowserConfig::builder()
            .with_head()
            .disable_default_args()
            .args([
                "--headless=new".to_string(),
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-blink-features=AutomationControlled".to_string(),
                "--no-first-run".to_string(),
                "--no-default-browser-check".to_string(),
                "--lang=he-IL".to_string(),
                format!("--user-agent={}", self.user_agent),
            ])
            .window_size(1920, 1080);
        if let Some(executable) = &self.executable {
            builder = builder.chrome_executable(executable);
        }
        builder.build().map_err(RendererError::Launch)
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RendererError> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RendererError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler stopped");
                    break;
                }
            }
        });

        let page = match prepare_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                // Never handed out, so close here
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(e);
            }
        };
        debug!("Browser session opened");

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler,
            elements: Vec::new(),
        }))
    }
}

async fn prepare_page(browser: &Browser) -> Result<Page, RendererError> {
    let page = browser.new_page("about:blank").await.map_err(protocol)?;
    page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
        .await
        .map_err(protocol)?;
    Ok(page)
}

fn protocol(e: impl std::fmt::Display) -> RendererError {
    RendererError::Protocol(e.to_string())
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    elements: Vec<Element>,
}

impl ChromiumSession {
    async fn find(&self, locator: &Locator) -> Result<Option<Element>, RendererError> {
        let found = match locator {
            Locator::Css(selector) => self.page.find_elements(selector.as_str()).await,
            Locator::XPath(expr) => self.page.find_xpaths(expr.as_str()).await,
        };
        first_match(found)
    }
}

/// An error answered by the browser itself (no such node, empty search
/// range) means nothing matched yet. Anything else means the session is gone.
fn first_match<T>(found: Result<Vec<T>, CdpError>) -> Result<Option<T>, RendererError> {
    match found {
        Ok(nodes) => Ok(nodes.into_iter().next()),
        Err(CdpError::Chrome(_) | CdpError::NotFound) => Ok(None),
        Err(e) => Err(protocol(e)),
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RendererError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(RendererError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(RendererError::Timeout {
                operation: format!("loading {url}"),
                timeout,
            }),
        }
    }

    async fn wait_for_element(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, RendererError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let found = match tokio::time::timeout(remaining, self.find(locator)).await {
                Ok(found) => found?,
                Err(_) => None,
            };
            if let Some(element) = found {
                self.elements.push(element);
                return Ok(Some(ElementHandle::new(self.elements.len() - 1)));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
        }
    }

    async fn text(&mut self, element: &ElementHandle) -> Result<String, RendererError> {
        let element = self
            .elements
            .get(element.id())
            .ok_or(RendererError::StaleElement(element.id()))?;
        let text = element.inner_text().await.map_err(protocol)?;
        Ok(text.unwrap_or_default())
    }

    async fn page_source(&mut self) -> Result<String, RendererError> {
        self.page.content().await.map_err(protocol)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, RendererError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page.screenshot(params).await.map_err(protocol)
    }

    async fn dispose(self: Box<Self>) -> Result<(), RendererError> {
        let ChromiumSession {
            mut browser,
            handler,
            ..
        } = *self;

        let closed = browser.close().await.map(|_| ()).map_err(protocol);
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        if let Err(e) = handler.await {
            debug!(error = %e, "Browser handler task ended abnormally");
        }
        debug!("Browser session disposed");
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_config_builds() {
        let renderer = ChromiumRenderer::new("test-agent/1.0")
            .with_executable(Some(PathBuf::from("/usr/bin/chromium")));
        assert!(renderer.browser_config().is_ok());
    }

    #[test]
    fn test_browser_answered_errors_mean_no_match() {
        let empty: Result<Vec<u32>, CdpError> = Ok(Vec::new());
        assert_eq!(first_match(empty).unwrap(), None);
        assert_eq!(first_match(Ok(vec![7, 8])).unwrap(), Some(7));
        assert_eq!(first_match::<u32>(Err(CdpError::NotFound)).unwrap(), None);

        let no_node = chromiumoxide::types::Error {
            code: -32000,
            message: "Could not find node with given id".to_string(),
        };
        assert_eq!(first_match::<u32>(Err(CdpError::Chrome(no_node))).unwrap(), None);
    }

    #[test]
    fn test_dead_connection_is_a_protocol_error() {
        for err in [CdpError::NoResponse, CdpError::Timeout] {
            assert!(matches!(
                first_match::<u32>(Err(err)),
                Err(RendererError::Protocol(_))
            ));
        }
    }
}
