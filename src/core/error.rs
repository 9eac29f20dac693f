//! Custom error types for pagecheck
//!
//! Provides a unified error handling system across all modules.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pagecheck operations
#[derive(Error, Debug)]
pub enum PageCheckError {
    /// The automation engine could not start
    #[error("Launch error: {0}")]
    Launch(String),

    /// agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    AgentBrowserNotFound,

    /// The page could not be opened
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A readiness condition did not hold in time
    #[error("Timed out after {elapsed_ms}ms waiting for {condition}")]
    Timeout { condition: String, elapsed_ms: u64 },

    /// A locator matched nothing
    #[error("No element matches {locator}")]
    ElementNotFound { locator: String },

    /// A locator matched more than the single element an action needs
    #[error("{count} elements match {locator}, expected exactly one")]
    AmbiguousElement { locator: String, count: usize },

    /// A screenshot could not be written
    #[error("Could not write screenshot to {}: {source}", path.display())]
    Capture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other engine failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// A scenario definition violates the step invariants
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Image decoding or encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for pagecheck operations
pub type Result<T> = std::result::Result<T, PageCheckError>;

impl PageCheckError {
    /// Create a launch error
    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }

    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid scenario error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidScenario(msg.into())
    }

    /// Create a navigation error
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a capture error
    pub fn capture(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Capture {
            path: path.into(),
            source,
        }
    }

    /// Whether the page is still in a state worth photographing after this error.
    ///
    /// Only failures about the page's content qualify; a failed launch,
    /// navigation or capture leaves nothing useful to look at.
    pub fn permits_diagnostic_capture(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ElementNotFound { .. } | Self::AmbiguousElement { .. }
        )
    }
}
