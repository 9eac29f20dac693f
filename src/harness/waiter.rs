//! Readiness waits
//!
//! The single suspension gate of a scenario. The engine evaluates the
//! condition natively; the waiter adds a hard bound on top, the window plus
//! [`ROUND_TRIP_SLACK`], so a stuck engine cannot hold the scenario.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::browser::BrowserSession;
use crate::core::{Condition, PageCheckError, Result};

/// Allowance on top of the wait window for the engine round trip
pub const ROUND_TRIP_SLACK: Duration = Duration::from_secs(2);

/// Block until `condition` holds or `timeout` elapses
pub async fn wait_for(
    session: &BrowserSession,
    condition: &Condition,
    timeout: Duration,
) -> Result<()> {
    if timeout.is_zero() {
        return Err(PageCheckError::invalid(format!(
            "wait for {} needs a positive timeout",
            condition
        )));
    }

    let started = Instant::now();
    debug!(%condition, timeout_ms = timeout.as_millis() as u64, "waiting");

    let bound = timeout + ROUND_TRIP_SLACK;
    let result = match tokio::time::timeout(bound, session.engine().wait_for(condition, timeout))
        .await
    {
        Ok(result) => result,
        Err(_) => Err(PageCheckError::Timeout {
            condition: condition.to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }),
    };

    match &result {
        Ok(()) => debug!(
            %condition,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "condition met"
        ),
        Err(e) => debug!(%condition, error = %e, "wait failed"),
    }
    result
}
