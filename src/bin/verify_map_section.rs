//! Standalone check: the Mapa link brings the map section into view.
//!
//! Takes no arguments; exits 0 on success and non-zero on failure.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    pagecheck::cli::run_standalone("map-section").await
}
