//! Best-effort dumps of failed scrape attempts for offline debugging.

use super::renderer::RenderSession;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Receives the session of a failed attempt before it is disposed.
///
/// Implementations must not fail the caller: whatever goes wrong is logged
/// and dropped.
#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    async fn capture(&self, symbol: &str, attempt: usize, session: &mut dyn RenderSession);
}

/// Discards everything.
pub struct NoDiagnostics;

#[async_trait]
impl DiagnosticsSink for NoDiagnostics {
    async fn capture(&self, _symbol: &str, _attempt: usize, _session: &mut dyn RenderSession) {}
}

/// Writes `<symbol>-attempt<N>.html` and `<symbol>-attempt<N>.png` into a
/// directory.
pub struct FileDiagnostics {
    dir: PathBuf,
}

impl FileDiagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str, attempt: usize, extension: &str) -> PathBuf {
        let name: String = symbol
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}-attempt{attempt}.{extension}"))
    }

    async fn write(&self, path: PathBuf, contents: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote diagnostics to {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl DiagnosticsSink for FileDiagnostics {
    async fn capture(&self, symbol: &str, attempt: usize, session: &mut dyn RenderSession) {
        match session.page_source().await {
            Ok(html) => {
                let path = self.path_for(symbol, attempt, "html");
                if let Err(e) = self.write(path, html.as_bytes()).await {
                    warn!(error = %e, "Could not save page source");
                }
            }
            Err(e) => warn!(error = %e, "Could not read page source"),
        }

        match session.screenshot().await {
            Ok(png) => {
                let path = self.path_for(symbol, attempt, "png");
                if let Err(e) = self.write(path, &png).await {
                    warn!(error = %e, "Could not save screenshot");
                }
            }
            Err(e) => warn!(error = %e, "Could not take screenshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::renderer::{ElementHandle, Locator, RendererError};
    use std::time::Duration;
    use tempfile::tempdir;

    struct StaticPage {
        screenshot_fails: bool,
    }

    #[async_trait]
    impl RenderSession for StaticPage {
        async fn navigate(&mut self, _url: &str, _timeout: Duration) -> Result<(), RendererError> {
            Ok(())
        }

        async fn wait_for_element(
            &mut self,
            _locator: &Locator,
            _timeout: Duration,
        ) -> Result<Option<ElementHandle>, RendererError> {
            Ok(None)
        }

        async fn text(&mut self, element: &ElementHandle) -> Result<String, RendererError> {
            Err(RendererError::StaleElement(element.id()))
        }

        async fn page_source(&mut self) -> Result<String, RendererError> {
            Ok("<html><body>blocked</body></html>".to_string())
        }

        async fn screenshot(&mut self) -> Result<Vec<u8>, RendererError> {
            if self.screenshot_fails {
                Err(RendererError::Protocol("target closed".to_string()))
            } else {
                Ok(vec![0x89, b'P', b'N', b'G'])
            }
        }

        async fn dispose(self: Box<Self>) -> Result<(), RendererError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_file_diagnostics_writes_markup_and_snapshot() {
        let dir = tempdir().unwrap();
        let sink = FileDiagnostics::new(dir.path().join("diag"));
        let mut page = StaticPage {
            screenshot_fails: false,
        };

        sink.capture("1159250", 2, &mut page).await;

        let html = std::fs::read_to_string(dir.path().join("diag/1159250-attempt2.html")).unwrap();
        assert!(html.contains("blocked"));
        let png = std::fs::read(dir.path().join("diag/1159250-attempt2.png")).unwrap();
        assert_eq!(png, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_file_diagnostics_survives_partial_failure() {
        let dir = tempdir().unwrap();
        let sink = FileDiagnostics::new(dir.path());
        let mut page = StaticPage {
            screenshot_fails: true,
        };

        sink.capture("IL/0011", 1, &mut page).await;

        assert!(dir.path().join("IL_0011-attempt1.html").exists());
        assert!(!dir.path().join("IL_0011-attempt1.png").exists());
    }
}
