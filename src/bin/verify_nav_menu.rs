//! Standalone check: the navigation bar is visible once loading finishes.
//!
//! Takes no arguments; exits 0 on success and non-zero on failure.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    pagecheck::cli::run_standalone("nav-menu").await
}
