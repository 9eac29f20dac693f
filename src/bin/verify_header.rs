//! Standalone check: the site header title is visible and captures the full page.
//!
//! Takes no arguments; exits 0 on success and non-zero on failure.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    pagecheck::cli::run_standalone("header-title").await
}
