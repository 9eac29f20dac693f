//! Screenshot capture
//!
//! Writes are last-write-wins: an existing file at the output path is
//! replaced without warning, so reruns stay idempotent.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::browser::BrowserSession;
use crate::core::{CaptureScope, PageCheckError, Result};
use crate::harness::interaction::require_single;

/// Capture `scope` to `path`
pub async fn screenshot(session: &BrowserSession, scope: &CaptureScope, path: &Path) -> Result<()> {
    prepare_output(path)?;

    if let CaptureScope::Element { locator } = scope {
        require_single(session, locator).await?;
    }

    debug!(%scope, path = %path.display(), "screenshot");
    session
        .engine()
        .screenshot(scope, path)
        .await
        .map_err(|e| match e {
            PageCheckError::Io(source) => PageCheckError::capture(path, source),
            other => other,
        })?;

    if !path.is_file() {
        return Err(PageCheckError::capture(
            path,
            io::Error::new(io::ErrorKind::NotFound, "engine reported success but wrote no file"),
        ));
    }
    Ok(())
}

/// Make sure the parent directory exists and is a directory
fn prepare_output(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PageCheckError::capture(path, e))?;
    }
    if path.is_dir() {
        return Err(PageCheckError::capture(
            path,
            io::Error::new(io::ErrorKind::Other, "output path is a directory"),
        ));
    }
    Ok(())
}

/// Delete `path` if present
pub(crate) fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PageCheckError::capture(path, e)),
    }
}
