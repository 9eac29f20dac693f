//! Scenario interpreter
//!
//! Runs a validated [`Scenario`] as the state machine
//! `Pending → Navigating → Waiting → (Interacting → Waiting)* → Capturing →
//! {Succeeded, Failed}`. Steps run strictly in order; the first error moves
//! the scenario to `Failed` and nothing after it runs. The session is closed
//! exactly once whatever happens.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::browser::{BrowserEngine, BrowserSession};
use crate::core::config::Config;
use crate::core::{
    CaptureScope, Outcome, PageCheckError, Result, Scenario, ScenarioState, Step,
};
use crate::harness::{capture, interaction, probe, waiter};

/// Knobs shared by every scenario of a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Hard upper bound on the step sequence
    pub deadline: Duration,
    /// Take a best-effort full-page capture after page-state failures
    pub diagnostics: bool,
    /// Probe the target over HTTP before navigating; `None` skips the probe
    pub probe_timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(120),
            diagnostics: true,
            probe_timeout: Some(Duration::from_secs(3)),
        }
    }
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            deadline: Duration::from_millis(config.run.scenario_deadline_ms),
            diagnostics: config.run.diagnostic_screenshots,
            probe_timeout: Some(Duration::from_millis(config.target.probe_timeout_ms)),
        }
    }
}

/// Mutable bookkeeping of one run
struct Progress {
    trace: Vec<ScenarioState>,
    current_step: Option<String>,
    screenshot: Option<PathBuf>,
}

impl Progress {
    fn enter(&mut self, state: ScenarioState) {
        if self.trace.last() != Some(&state) {
            debug!(%state, "state transition");
            self.trace.push(state);
        }
    }
}

/// Run `scenario` on a fresh session over `engine`
pub async fn run_scenario(
    scenario: &Scenario,
    session_name: &str,
    engine: Arc<dyn BrowserEngine>,
    options: &RunOptions,
) -> Outcome {
    let started = Instant::now();
    info!(scenario = scenario.name(), url = %scenario.target_url(), "scenario started");

    let mut progress = Progress {
        trace: vec![ScenarioState::Pending],
        current_step: None,
        screenshot: None,
    };

    for stale in [scenario.output_path().to_path_buf(), scenario.diagnostic_path()] {
        if let Err(e) = capture::remove_stale(&stale) {
            warn!(scenario = scenario.name(), error = %e, "could not remove stale artifact");
        }
    }

    let mut session = match BrowserSession::open(session_name, engine).await {
        Ok(session) => session,
        Err(e) => {
            progress.current_step = Some("launch".to_string());
            return finish(scenario, progress, Err(e), None, started);
        }
    };

    let mut deadline_hit = false;
    let result = match tokio::time::timeout(
        options.deadline,
        execute_steps(scenario, &session, options, &mut progress),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            deadline_hit = true;
            Err(PageCheckError::Timeout {
                condition: format!("scenario '{}' to finish", scenario.name()),
                elapsed_ms: started.elapsed().as_millis() as u64,
            })
        }
    };

    // The diagnostic capture shares the scenario deadline.
    let diagnostic = match &result {
        Err(e) if options.diagnostics && !deadline_hit && e.permits_diagnostic_capture() => {
            let remaining = options.deadline.saturating_sub(started.elapsed());
            match tokio::time::timeout(remaining, diagnostic_capture(scenario, &session)).await {
                Ok(path) => path,
                Err(_) => {
                    warn!(scenario = scenario.name(), "diagnostic screenshot cut off by deadline");
                    None
                }
            }
        }
        _ => None,
    };

    if let Err(e) = session.close().await {
        warn!(scenario = scenario.name(), error = %e, "browser teardown failed");
    }

    finish(scenario, progress, result, diagnostic, started)
}

async fn execute_steps(
    scenario: &Scenario,
    session: &BrowserSession,
    options: &RunOptions,
    progress: &mut Progress,
) -> Result<()> {
    for (index, step) in scenario.steps().iter().enumerate() {
        progress.enter(step.state());
        progress.current_step = Some(step.to_string());
        debug!(scenario = scenario.name(), step = index + 1, %step, "executing step");

        match step {
            Step::Navigate => {
                let url = scenario.target_url();
                if let Some(timeout) = options.probe_timeout {
                    probe::probe(url, timeout).await?;
                }
                session.engine().navigate(url.as_str()).await?;
            }
            Step::WaitVisible { .. } | Step::WaitHidden { .. } | Step::WaitInViewport { .. } => {
                if let Some((condition, timeout_ms)) = step.wait_condition() {
                    waiter::wait_for(session, &condition, Duration::from_millis(timeout_ms))
                        .await?;
                }
            }
            Step::Click { locator } => interaction::click(session, locator).await?,
            Step::ScrollIntoView { locator } => {
                interaction::scroll_into_view(session, locator).await?
            }
            Step::Screenshot { scope } => {
                capture::screenshot(session, scope, scenario.output_path()).await?;
                progress.screenshot = Some(scenario.output_path().to_path_buf());
            }
        }
    }
    progress.current_step = None;
    Ok(())
}

async fn diagnostic_capture(scenario: &Scenario, session: &BrowserSession) -> Option<PathBuf> {
    let path = scenario.diagnostic_path();
    match capture::screenshot(session, &CaptureScope::FullPage, &path).await {
        Ok(()) => {
            info!(scenario = scenario.name(), path = %path.display(), "diagnostic screenshot saved");
            Some(path)
        }
        Err(e) => {
            warn!(scenario = scenario.name(), error = %e, "diagnostic screenshot failed");
            None
        }
    }
}

fn finish(
    scenario: &Scenario,
    mut progress: Progress,
    result: Result<()>,
    diagnostic_path: Option<PathBuf>,
    started: Instant,
) -> Outcome {
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(()) => {
            progress.trace.push(ScenarioState::Succeeded);
            info!(scenario = scenario.name(), duration_ms, "scenario succeeded");
            Outcome {
                scenario_name: scenario.name().to_string(),
                success: true,
                final_state: ScenarioState::Succeeded,
                trace: progress.trace,
                failed_step: None,
                error_message: None,
                screenshot_path: progress.screenshot,
                diagnostic_path: None,
                duration_ms,
            }
        }
        Err(e) => {
            progress.trace.push(ScenarioState::Failed);
            warn!(
                scenario = scenario.name(),
                step = progress.current_step.as_deref().unwrap_or("-"),
                error = %e,
                "scenario failed"
            );
            Outcome {
                scenario_name: scenario.name().to_string(),
                success: false,
                final_state: ScenarioState::Failed,
                trace: progress.trace,
                failed_step: progress.current_step,
                error_message: Some(e.to_string()),
                screenshot_path: None,
                diagnostic_path,
                duration_ms,
            }
        }
    }
}
