//! Reachability probe issued before navigation
//!
//! An unreachable dev server should fail the navigate step at once rather
//! than surface later as a readiness timeout.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::core::{PageCheckError, Result};

/// GET `url`; any HTTP response counts as reachable
pub async fn probe(url: &Url, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PageCheckError::navigation(url.as_str(), e))?;

    match client.get(url.as_str()).send().await {
        Ok(response) => {
            debug!(%url, status = %response.status(), "target reachable");
            Ok(())
        }
        Err(e) => Err(PageCheckError::navigation(url.as_str(), e)),
    }
}
