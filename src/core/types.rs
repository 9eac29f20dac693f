//! Shared types used across pagecheck modules
//!
//! Contains locators, readiness conditions, scenario steps and outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::error::{PageCheckError, Result};

/// How an element is found on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector (e.g. `#map`, `header`)
    Css { selector: String },
    /// ARIA role, optionally filtered by accessible name
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        exact: bool,
    },
    /// Innermost element whose text contains the given string
    Text {
        text: String,
        #[serde(default)]
        exact: bool,
    },
    /// CSS selector filtered by contained text (`h1:has-text(...)`)
    CssText { selector: String, text: String },
}

impl Locator {
    /// Locate by CSS selector
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    /// Locate by role alone
    pub fn role(role: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: None,
            exact: false,
        }
    }

    /// Locate by role and accessible name (substring, case-insensitive)
    pub fn role_named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        }
    }

    /// Locate by visible text (substring, case-insensitive)
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: false,
        }
    }

    /// Locate by CSS selector containing the given text
    pub fn css_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssText {
            selector: selector.into(),
            text: text.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        let empty = match self {
            Locator::Css { selector } => selector.trim().is_empty(),
            Locator::Role { role, .. } => role.trim().is_empty(),
            Locator::Text { text, .. } => text.trim().is_empty(),
            Locator::CssText { selector, text } => {
                selector.trim().is_empty() || text.trim().is_empty()
            }
        };
        if empty {
            return Err(PageCheckError::invalid(format!("empty locator: {}", self)));
        }
        Ok(())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { selector } => write!(f, "css={}", selector),
            Locator::Role { role, name, exact } => {
                write!(f, "role={}", role)?;
                if let Some(name) = name {
                    let eq = if *exact { "==" } else { "~=" };
                    write!(f, "[name{}\"{}\"]", eq, name)?;
                }
                Ok(())
            }
            Locator::Text { text, exact } => {
                if *exact {
                    write!(f, "text==\"{}\"", text)
                } else {
                    write!(f, "text~=\"{}\"", text)
                }
            }
            Locator::CssText { selector, text } => {
                write!(f, "{}:has-text(\"{}\")", selector, text)
            }
        }
    }
}

/// A predicate over page state used as a suspension gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// At least one matching element is visible
    Visible(Locator),
    /// No matching element is visible (zero matches counts)
    Hidden(Locator),
    /// A visible matching element intersects the viewport
    InViewport(Locator),
}

impl Condition {
    pub fn locator(&self) -> &Locator {
        match self {
            Condition::Visible(l) | Condition::Hidden(l) | Condition::InViewport(l) => l,
        }
    }

    /// Short name of the state being waited for
    pub fn state(&self) -> &'static str {
        match self {
            Condition::Visible(_) => "visible",
            Condition::Hidden(_) => "hidden",
            Condition::InViewport(_) => "in_viewport",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to be {}", self.locator(), self.state())
    }
}

/// What a screenshot covers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum CaptureScope {
    /// The whole scrollable page
    #[default]
    FullPage,
    /// Only what is currently in the viewport
    Viewport,
    /// The bounding box of a single element
    Element { locator: Locator },
}

impl fmt::Display for CaptureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureScope::FullPage => write!(f, "full page"),
            CaptureScope::Viewport => write!(f, "viewport"),
            CaptureScope::Element { locator } => write!(f, "element {}", locator),
        }
    }
}

/// One action in a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Open the scenario's target URL
    Navigate,
    WaitVisible { locator: Locator, timeout_ms: u64 },
    WaitHidden { locator: Locator, timeout_ms: u64 },
    WaitInViewport { locator: Locator, timeout_ms: u64 },
    Click { locator: Locator },
    ScrollIntoView { locator: Locator },
    Screenshot {
        #[serde(flatten)]
        scope: CaptureScope,
    },
}

impl Step {
    /// The readiness condition and timeout for wait steps
    pub fn wait_condition(&self) -> Option<(Condition, u64)> {
        match self {
            Step::WaitVisible { locator, timeout_ms } => {
                Some((Condition::Visible(locator.clone()), *timeout_ms))
            }
            Step::WaitHidden { locator, timeout_ms } => {
                Some((Condition::Hidden(locator.clone()), *timeout_ms))
            }
            Step::WaitInViewport { locator, timeout_ms } => {
                Some((Condition::InViewport(locator.clone()), *timeout_ms))
            }
            _ => None,
        }
    }

    /// The state the scenario is in while this step runs
    pub fn state(&self) -> ScenarioState {
        match self {
            Step::Navigate => ScenarioState::Navigating,
            Step::WaitVisible { .. } | Step::WaitHidden { .. } | Step::WaitInViewport { .. } => {
                ScenarioState::Waiting
            }
            Step::Click { .. } | Step::ScrollIntoView { .. } => ScenarioState::Interacting,
            Step::Screenshot { .. } => ScenarioState::Capturing,
        }
    }

    fn locators(&self) -> Vec<&Locator> {
        match self {
            Step::Navigate => vec![],
            Step::WaitVisible { locator, .. }
            | Step::WaitHidden { locator, .. }
            | Step::WaitInViewport { locator, .. }
            | Step::Click { locator }
            | Step::ScrollIntoView { locator } => vec![locator],
            Step::Screenshot { scope } => match scope {
                CaptureScope::Element { locator } => vec![locator],
                _ => vec![],
            },
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Navigate => write!(f, "navigate"),
            Step::WaitVisible { locator, timeout_ms } => {
                write!(f, "wait_visible {} ({}ms)", locator, timeout_ms)
            }
            Step::WaitHidden { locator, timeout_ms } => {
                write!(f, "wait_hidden {} ({}ms)", locator, timeout_ms)
            }
            Step::WaitInViewport { locator, timeout_ms } => {
                write!(f, "wait_in_viewport {} ({}ms)", locator, timeout_ms)
            }
            Step::Click { locator } => write!(f, "click {}", locator),
            Step::ScrollIntoView { locator } => write!(f, "scroll_into_view {}", locator),
            Step::Screenshot { scope } => write!(f, "screenshot {}", scope),
        }
    }
}

/// A named end-to-end UI check.
///
/// Only constructed through [`Scenario::new`], which enforces the step
/// invariants; the fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    target_url: Url,
    steps: Vec<Step>,
    output_path: PathBuf,
}

impl Scenario {
    /// Build a validated scenario
    pub fn new(
        name: impl Into<String>,
        target_url: &str,
        steps: Vec<Step>,
        output_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PageCheckError::invalid("scenario name is empty"));
        }

        let target_url = Url::parse(target_url).map_err(|e| {
            PageCheckError::invalid(format!("{}: bad target url '{}': {}", name, target_url, e))
        })?;
        if !matches!(target_url.scheme(), "http" | "https") {
            return Err(PageCheckError::invalid(format!(
                "{}: target url must be http(s), got '{}'",
                name, target_url
            )));
        }

        validate_steps(&name, &steps)?;

        Ok(Self {
            name,
            target_url,
            steps,
            output_path: output_path.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_url(&self) -> &Url {
        &self.target_url
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Whether the scenario ends in a screenshot
    pub fn captures(&self) -> bool {
        matches!(self.steps.last(), Some(Step::Screenshot { .. }))
    }

    /// Path of the best-effort screenshot taken when the scenario fails
    pub fn diagnostic_path(&self) -> PathBuf {
        let stem = self
            .output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone());
        self.output_path
            .with_file_name(format!("{}-failure.png", stem))
    }
}

fn validate_steps(name: &str, steps: &[Step]) -> Result<()> {
    match steps.first() {
        Some(Step::Navigate) => {}
        _ => {
            return Err(PageCheckError::invalid(format!(
                "{}: first step must be navigate",
                name
            )))
        }
    }

    let last = steps.len() - 1;
    for (i, step) in steps.iter().enumerate() {
        match step {
            Step::Navigate if i > 0 => {
                return Err(PageCheckError::invalid(format!(
                    "{}: step {} is a second navigate",
                    name,
                    i + 1
                )))
            }
            Step::Screenshot { .. } if i != last => {
                return Err(PageCheckError::invalid(format!(
                    "{}: screenshot must be the last step, found at step {}",
                    name,
                    i + 1
                )))
            }
            _ => {}
        }

        if let Some((condition, 0)) = step.wait_condition() {
            return Err(PageCheckError::invalid(format!(
                "{}: step {} waits for {} with a zero timeout",
                name,
                i + 1,
                condition
            )));
        }

        for locator in step.locators() {
            locator.validate()?;
        }
    }

    Ok(())
}

/// States of the scenario interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    Pending,
    Navigating,
    Waiting,
    Interacting,
    Capturing,
    Succeeded,
    Failed,
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScenarioState::Pending => "pending",
            ScenarioState::Navigating => "navigating",
            ScenarioState::Waiting => "waiting",
            ScenarioState::Interacting => "interacting",
            ScenarioState::Capturing => "capturing",
            ScenarioState::Succeeded => "succeeded",
            ScenarioState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Result of running one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub scenario_name: String,
    pub success: bool,
    /// Terminal state reached
    pub final_state: ScenarioState,
    /// Every state the scenario passed through, in order
    pub trace: Vec<ScenarioState>,
    /// Display form of the step that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,
    /// Best-effort capture written after a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_path: Option<PathBuf>,
    pub duration_ms: u64,
}

impl Outcome {
    /// One-line human summary
    pub fn summary(&self) -> String {
        if self.success {
            match &self.screenshot_path {
                Some(p) => format!(
                    "PASS {} ({}ms) -> {}",
                    self.scenario_name,
                    self.duration_ms,
                    p.display()
                ),
                None => format!("PASS {} ({}ms)", self.scenario_name, self.duration_ms),
            }
        } else {
            format!(
                "FAIL {} at [{}]: {}",
                self.scenario_name,
                self.failed_step.as_deref().unwrap_or("teardown"),
                self.error_message.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
