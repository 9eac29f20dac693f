//! Scripted in-memory engine shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pagecheck::browser::BrowserEngine;
use pagecheck::core::{CaptureScope, Condition, Locator, PageCheckError, Result};

/// What the fake page reports for one locator
#[derive(Debug, Clone, Copy, Default)]
pub struct Element {
    pub count: usize,
    pub visible: bool,
    pub in_viewport: bool,
}

impl Element {
    pub fn shown() -> Self {
        Self {
            count: 1,
            visible: true,
            in_viewport: true,
        }
    }

    pub fn below_fold() -> Self {
        Self {
            count: 1,
            visible: true,
            in_viewport: false,
        }
    }

    pub fn many(count: usize) -> Self {
        Self {
            count,
            visible: true,
            in_viewport: true,
        }
    }
}

#[derive(Default)]
struct Page {
    elements: HashMap<String, Element>,
    /// Acting on the key locator replaces these elements
    effects: HashMap<String, Vec<(String, Element)>>,
}

/// A page scripted per test; records every engine call in order
#[derive(Default)]
pub struct ScriptedEngine {
    page: Mutex<Page>,
    calls: Arc<Mutex<Vec<String>>>,
    pub fail_launch: bool,
    pub fail_navigate: bool,
    pub fail_screenshot: bool,
    /// Time every screenshot takes before writing
    pub screenshot_delay: Option<Duration>,
    /// Engine-side overhead added to every wait
    pub wait_latency: Option<Duration>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share the call log with another owner (e.g. a factory)
    pub fn with_log(calls: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            calls,
            ..Self::default()
        }
    }

    pub fn element(self, locator: Locator, element: Element) -> Self {
        self.page
            .lock()
            .unwrap()
            .elements
            .insert(locator.to_string(), element);
        self
    }

    pub fn effect(self, on: Locator, target: Locator, element: Element) -> Self {
        self.page
            .lock()
            .unwrap()
            .effects
            .entry(on.to_string())
            .or_default()
            .push((target.to_string(), element));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, locator: &Locator) -> Element {
        self.page
            .lock()
            .unwrap()
            .elements
            .get(&locator.to_string())
            .copied()
            .unwrap_or_default()
    }

    fn apply_effects(&self, locator: &Locator) {
        let mut page = self.page.lock().unwrap();
        if let Some(effects) = page.effects.get(&locator.to_string()).cloned() {
            for (target, element) in effects {
                page.elements.insert(target, element);
            }
        }
    }

    fn single(&self, locator: &Locator) -> Result<()> {
        match self.lookup(locator).count {
            0 => Err(PageCheckError::ElementNotFound {
                locator: locator.to_string(),
            }),
            1 => Ok(()),
            count => Err(PageCheckError::AmbiguousElement {
                locator: locator.to_string(),
                count,
            }),
        }
    }
}

#[async_trait]
impl BrowserEngine for ScriptedEngine {
    async fn launch(&self) -> Result<()> {
        self.record("launch".to_string());
        if self.fail_launch {
            return Err(PageCheckError::launch("chromium exited with status 1"));
        }
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(format!("navigate {}", url));
        if self.fail_navigate {
            return Err(PageCheckError::navigation(url, "net::ERR_CONNECTION_REFUSED"));
        }
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        self.record(format!("count {}", locator));
        Ok(self.lookup(locator).count)
    }

    async fn wait_for(&self, condition: &Condition, timeout: Duration) -> Result<()> {
        self.record(format!("wait {}", condition));
        if let Some(latency) = self.wait_latency {
            tokio::time::sleep(latency).await;
        }
        let element = self.lookup(condition.locator());
        let holds = match condition {
            Condition::Visible(_) => element.count > 0 && element.visible,
            Condition::Hidden(_) => element.count == 0 || !element.visible,
            Condition::InViewport(_) => element.count > 0 && element.visible && element.in_viewport,
        };
        if holds {
            return Ok(());
        }
        tokio::time::sleep(timeout).await;
        Err(PageCheckError::Timeout {
            condition: condition.to_string(),
            elapsed_ms: timeout.as_millis() as u64,
        })
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        self.record(format!("click {}", locator));
        self.single(locator)?;
        self.apply_effects(locator);
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        self.record(format!("scroll {}", locator));
        self.single(locator)?;
        self.apply_effects(locator);
        Ok(())
    }

    async fn screenshot(&self, scope: &CaptureScope, path: &Path) -> Result<()> {
        self.record(format!("screenshot {}", scope));
        if let Some(delay) = self.screenshot_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_screenshot {
            return Err(PageCheckError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only file system",
            )));
        }
        std::fs::write(path, format!("png:{}", scope))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record("close".to_string());
        Ok(())
    }
}
