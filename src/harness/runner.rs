//! Batch runner
//!
//! Runs scenarios one after another, or several at once when configured,
//! each on a session of its own. Outcomes come back in definition order.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::info;

use crate::browser::EngineFactory;
use crate::core::{Outcome, Scenario};
use crate::harness::scenario::{run_scenario, RunOptions};

/// Outcomes of one batch
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    /// Process exit code: 0 only when every scenario succeeded
    pub fn exit_code(&self) -> u8 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }
}

/// Runs scenarios against engines produced by a factory
pub struct Runner {
    factory: Arc<dyn EngineFactory>,
    options: RunOptions,
    concurrency: usize,
    session_prefix: String,
}

impl Runner {
    pub fn new(factory: Arc<dyn EngineFactory>, options: RunOptions) -> Self {
        Self {
            factory,
            options,
            concurrency: 1,
            session_prefix: "pagecheck".to_string(),
        }
    }

    /// Allow up to `n` scenarios in flight
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_session_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.session_prefix = prefix.into();
        self
    }

    /// Unique agent-browser session name for one scenario run
    pub fn session_name(&self, scenario: &Scenario) -> String {
        format!(
            "{}-{}-{:08x}",
            self.session_prefix,
            slug(scenario.name()),
            rand::random::<u32>()
        )
    }

    /// Run one scenario on its own session
    pub async fn run_one(&self, scenario: &Scenario) -> Outcome {
        let session_name = self.session_name(scenario);
        let engine = self.factory.create(&session_name);
        run_scenario(scenario, &session_name, engine, &self.options).await
    }

    /// Run every scenario; never stops early on failure
    pub async fn run_all(&self, scenarios: &[Scenario]) -> RunReport {
        info!(
            count = scenarios.len(),
            concurrency = self.concurrency,
            "running scenarios"
        );

        let outcomes: Vec<Outcome> = stream::iter(scenarios)
            .map(|scenario| self.run_one(scenario))
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = RunReport { outcomes };
        info!(
            passed = report.passed(),
            failed = report.failed(),
            "run finished"
        );
        report
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
