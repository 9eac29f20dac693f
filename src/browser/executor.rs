//! Browser executor - wraps agent-browser CLI
//!
//! Provides the [`BrowserEngine`] implementation used outside of tests. Each
//! executor owns one named agent-browser session, so two executors never
//! share a page.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::browser::engine::{BrowserEngine, EngineFactory};
use crate::browser::reply::{eval_value, ElementRect, WaitReport};
use crate::browser::script;
use crate::core::config::BrowserConfig;
use crate::core::{CaptureScope, Condition, Locator, PageCheckError, Result};

/// Executor for browser automation via agent-browser CLI
pub struct BrowserExecutor {
    /// agent-browser executable
    program: String,
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
    /// Upper bound for a single command
    action_timeout: Duration,
}

impl BrowserExecutor {
    /// Create a new browser executor
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            program: "agent-browser".to_string(),
            session_name: session_name.into(),
            headed: false,
            action_timeout: Duration::from_secs(30),
        }
    }

    /// Create an executor from browser configuration
    pub fn with_config(session_name: impl Into<String>, config: &BrowserConfig) -> Self {
        Self {
            program: config.program.clone(),
            session_name: session_name.into(),
            headed: config.headed,
            action_timeout: Duration::from_millis(config.action_timeout_ms),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Check if agent-browser is installed
    pub async fn is_available(program: &str) -> bool {
        Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run an agent-browser command, bounded by `limit`
    async fn run_command_within(&self, args: &[&str], limit: Duration) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["--session", &self.session_name]);

        if self.headed {
            cmd.arg("--headed");
        }

        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // A cancelled step must not leave the command running.
        cmd.kill_on_drop(true);

        debug!(session = %self.session_name, command = args.first().copied().unwrap_or(""), "agent-browser");

        let output = tokio::time::timeout(limit, cmd.output())
            .await
            .map_err(|_| {
                PageCheckError::browser(format!(
                    "agent-browser {} did not finish within {}ms",
                    args.first().copied().unwrap_or(""),
                    limit.as_millis()
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PageCheckError::AgentBrowserNotFound
                } else {
                    PageCheckError::browser(format!("Failed to run agent-browser: {}", e))
                }
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PageCheckError::browser(format!(
                "agent-browser command failed: {}",
                stderr.trim()
            )))
        }
    }

    async fn run_command(&self, args: &[&str]) -> Result<String> {
        self.run_command_within(args, self.action_timeout).await
    }

    /// Evaluate an in-page program and decode its JSON result
    async fn eval<T: serde::de::DeserializeOwned>(&self, js: &str, limit: Duration) -> Result<T> {
        let output = self
            .run_command_within(&["eval", js, "--json"], limit)
            .await?;
        eval_value(&output)
    }

    /// Resolve `locator` to exactly one element and stamp it for a native command
    async fn stamp_single(&self, locator: &Locator) -> Result<String> {
        let count: usize = self
            .eval(&script::stamp_target(locator), self.action_timeout)
            .await?;
        single(locator, count)?;
        Ok(script::target_selector())
    }

    async fn capture_element(&self, locator: &Locator, path: &Path) -> Result<()> {
        let rect: ElementRect = self
            .eval(&script::element_rect(locator), self.action_timeout)
            .await?;
        single(locator, rect.count)?;

        let full = tempfile::Builder::new()
            .prefix("pagecheck-")
            .suffix(".png")
            .tempfile()?;
        let full_path = path_str(full.path())?;
        self.run_command(&["screenshot", full_path, "--full"]).await?;

        let img = image::open(full.path())?;
        let (x, y, w, h) = rect.crop_box(img.width(), img.height()).ok_or_else(|| {
            PageCheckError::browser(format!("{} has no visible area to capture", locator))
        })?;
        img.crop_imm(x, y, w, h).save(path)?;
        Ok(())
    }
}

fn single(locator: &Locator, count: usize) -> Result<()> {
    match count {
        0 => Err(PageCheckError::ElementNotFound {
            locator: locator.to_string(),
        }),
        1 => Ok(()),
        n => Err(PageCheckError::AmbiguousElement {
            locator: locator.to_string(),
            count: n,
        }),
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| PageCheckError::browser(format!("non UTF-8 path: {}", path.display())))
}

#[async_trait]
impl BrowserEngine for BrowserExecutor {
    async fn launch(&self) -> Result<()> {
        if !Self::is_available(&self.program).await {
            return Err(PageCheckError::AgentBrowserNotFound);
        }
        // agent-browser starts its browser lazily; a blank page proves it can.
        self.run_command(&["open", "about:blank"])
            .await
            .map(|_| ())
            .map_err(|e| match e {
                PageCheckError::Browser(msg) => PageCheckError::launch(msg),
                other => other,
            })
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.run_command(&["open", url])
            .await
            .map_err(|e| PageCheckError::navigation(url, e))?;
        self.run_command(&["wait", "--load", "load"])
            .await
            .map_err(|e| PageCheckError::navigation(url, e))?;
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        self.eval(&script::count(locator), self.action_timeout).await
    }

    async fn wait_for(&self, condition: &Condition, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        // The program polls for `timeout`; leave room for the round trip.
        let limit = timeout + self.action_timeout;
        let report: WaitReport = self.eval(&script::wait(condition, timeout), limit).await?;
        if report.ok {
            Ok(())
        } else {
            Err(PageCheckError::Timeout {
                condition: condition.to_string(),
                elapsed_ms: report.elapsed.max(started.elapsed().as_millis() as u64),
            })
        }
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let selector = self.stamp_single(locator).await?;
        self.run_command(&["click", &selector]).await?;
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        let count: usize = self
            .eval(&script::scroll_into_view(locator), self.action_timeout)
            .await?;
        single(locator, count)
    }

    async fn screenshot(&self, scope: &CaptureScope, path: &Path) -> Result<()> {
        match scope {
            CaptureScope::FullPage => {
                self.run_command(&["screenshot", path_str(path)?, "--full"])
                    .await?;
            }
            CaptureScope::Viewport => {
                self.run_command(&["screenshot", path_str(path)?]).await?;
            }
            CaptureScope::Element { locator } => self.capture_element(locator, path).await?,
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.run_command(&["close"]).await?;
        Ok(())
    }
}

/// Creates one agent-browser executor per scenario session
#[derive(Debug, Clone)]
pub struct AgentBrowserFactory {
    config: BrowserConfig,
}

impl AgentBrowserFactory {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

impl EngineFactory for AgentBrowserFactory {
    fn create(&self, session_name: &str) -> Arc<dyn BrowserEngine> {
        Arc::new(BrowserExecutor::with_config(session_name, &self.config))
    }
}
