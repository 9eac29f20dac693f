//! User-like actions
//!
//! Both actions need exactly one target. The match count is checked before
//! acting, so a missing or duplicated element fails with a precise error
//! instead of whatever the engine would do with it.

use tracing::debug;

use crate::browser::BrowserSession;
use crate::core::{Locator, PageCheckError, Result};

/// Click the single element matching `locator`
pub async fn click(session: &BrowserSession, locator: &Locator) -> Result<()> {
    require_single(session, locator).await?;
    debug!(%locator, "click");
    session.engine().click(locator).await
}

/// Scroll the single element matching `locator` into view
pub async fn scroll_into_view(session: &BrowserSession, locator: &Locator) -> Result<()> {
    require_single(session, locator).await?;
    debug!(%locator, "scroll into view");
    session.engine().scroll_into_view(locator).await
}

pub(crate) async fn require_single(session: &BrowserSession, locator: &Locator) -> Result<()> {
    match session.engine().count(locator).await? {
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
