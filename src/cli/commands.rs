//! CLI commands
//!
//! Handlers behind the `pagecheck` subcommands and the standalone check
//! binaries.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::browser::AgentBrowserFactory;
use crate::core::{Config, Outcome, Result, Scenario};
use crate::harness::catalog;
use crate::harness::{RunOptions, RunReport, Runner};

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Resolve the scenarios a command should act on
pub fn select_scenarios(
    config: &Config,
    file: Option<&Path>,
    names: &[String],
) -> Result<Vec<Scenario>> {
    let all = match file {
        Some(path) => catalog::load_file(path, &config.target.url, &config.run.output_dir)?,
        None => catalog::builtins(&config.target.url, &config.run.output_dir)?,
    };

    if names.is_empty() {
        return Ok(all);
    }

    names
        .iter()
        .map(|name| {
            all.iter()
                .find(|s| s.name() == name.as_str())
                .cloned()
                .ok_or_else(|| {
                    crate::core::PageCheckError::invalid(format!(
                        "unknown scenario '{}'. Available: {}",
                        name,
                        all.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
                    ))
                })
        })
        .collect()
}

/// Build a runner over agent-browser from configuration
pub fn runner_from_config(config: &Config) -> Runner {
    Runner::new(
        Arc::new(AgentBrowserFactory::new(config.browser.clone())),
        RunOptions::from_config(config),
    )
    .with_concurrency(config.run.concurrency)
    .with_session_prefix(config.browser.session_prefix.clone())
}

/// `pagecheck run`
pub async fn run(
    config: &Config,
    scenarios: &[Scenario],
    format: OutputFormat,
    open: bool,
) -> Result<u8> {
    let report = runner_from_config(config).run_all(scenarios).await;
    print_report(&report, format)?;

    if open {
        for path in report
            .outcomes
            .iter()
            .filter_map(|o| o.screenshot_path.as_ref().or(o.diagnostic_path.as_ref()))
        {
            if let Err(e) = webbrowser::open(&path.to_string_lossy()) {
                warn!(path = %path.display(), error = %e, "could not open screenshot");
            }
        }
    }

    Ok(report.exit_code())
}

/// Print outcomes: summaries on stdout, failure details on stderr
pub fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            for outcome in &report.outcomes {
                print_outcome(outcome);
            }
            if report.outcomes.len() > 1 {
                println!(
                    "\n{} passed, {} failed",
                    report.passed(),
                    report.failed()
                );
            }
        }
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    if outcome.success {
        println!("{}", outcome.summary());
    } else {
        eprintln!("{}", outcome.summary());
        if let Some(path) = &outcome.diagnostic_path {
            eprintln!("  diagnostic screenshot: {}", path.display());
        }
    }
}

/// `pagecheck list`
pub fn list(scenarios: &[Scenario]) -> String {
    let mut out = String::new();
    for scenario in scenarios {
        out.push_str(&format!(
            "{}  {}  -> {}\n",
            scenario.name(),
            scenario.target_url(),
            scenario.output_path().display()
        ));
        for (i, step) in scenario.steps().iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, step));
        }
    }
    out
}
