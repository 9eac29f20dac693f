//! Automation engine abstraction
//!
//! Everything the harness needs from a browser, as one async trait. The
//! production engine drives agent-browser; tests plug in scripted engines.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{CaptureScope, Condition, Locator, Result};

/// One browser page driven programmatically
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Start the browser. Fails with `Launch` or `AgentBrowserNotFound`.
    async fn launch(&self) -> Result<()>;

    /// Load `url` and wait for the document to finish loading
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Number of elements currently matching `locator`
    async fn count(&self, locator: &Locator) -> Result<usize>;

    /// Block until `condition` holds, or fail with `Timeout` once `timeout` elapses
    async fn wait_for(&self, condition: &Condition, timeout: Duration) -> Result<()>;

    /// Click the single element matching `locator`
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Scroll the single element matching `locator` into the viewport
    async fn scroll_into_view(&self, locator: &Locator) -> Result<()>;

    /// Write a PNG of `scope` to `path`, replacing any existing file
    async fn screenshot(&self, scope: &CaptureScope, path: &Path) -> Result<()>;

    /// Shut the browser down
    async fn close(&self) -> Result<()>;
}

/// Builds a fresh engine for every scenario so sessions are never shared
pub trait EngineFactory: Send + Sync {
    fn create(&self, session_name: &str) -> Arc<dyn BrowserEngine>;
}

impl<F> EngineFactory for F
where
    F: Fn(&str) -> Arc<dyn BrowserEngine> + Send + Sync,
{
    fn create(&self, session_name: &str) -> Arc<dyn BrowserEngine> {
        self(session_name)
    }
}
