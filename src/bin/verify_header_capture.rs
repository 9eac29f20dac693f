//! Standalone check: the `<header>` element alone is captured.
//!
//! Takes no arguments; exits 0 on success and non-zero on failure. A page
//! without a header fails instead of falling back to a full-page capture.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    pagecheck::cli::run_standalone("header-capture").await
}
