//! Browser session lifetime
//!
//! A [`BrowserSession`] is the only owner of its engine. It is opened once
//! per scenario and closed exactly once, on success and failure alike.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::browser::engine::BrowserEngine;
use crate::core::Result;

/// One launched browser page
pub struct BrowserSession {
    name: String,
    engine: Arc<dyn BrowserEngine>,
    closed: bool,
}

impl BrowserSession {
    /// Launch the engine. Launch failures surface immediately, without retry.
    pub async fn open(name: impl Into<String>, engine: Arc<dyn BrowserEngine>) -> Result<Self> {
        let name = name.into();
        if let Err(e) = engine.launch().await {
            // A half-started browser still has to be released.
            if let Err(close_err) = engine.close().await {
                debug!(session = %name, error = %close_err, "close after failed launch");
            }
            return Err(e);
        }
        debug!(session = %name, "browser session opened");
        Ok(Self {
            name,
            engine,
            closed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The engine driving this session's page
    pub fn engine(&self) -> &dyn BrowserEngine {
        self.engine.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the browser. Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!(session = %self.name, "closing browser session");
        self.engine.close().await
    }
}

impl fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSession")
            .field("name", &self.name)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Reached when the owning future is cancelled mid-step.
        warn!(session = %self.name, "browser session dropped while open, closing in background");
        let engine = Arc::clone(&self.engine);
        let name = std::mem::take(&mut self.name);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = engine.close().await {
                        warn!(session = %name, error = %e, "background close failed");
                    }
                });
            }
            Err(_) => warn!(session = %name, "no runtime available, browser left running"),
        }
    }
}
