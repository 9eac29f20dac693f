//! pagecheck - UI-readiness verification harness
//!
//! Drives a headless browser against a locally served page and confirms that
//! key parts of the UI render and behave: a title shows up, a loading
//! indicator goes away, a link scrolls a section into view. Each check is a
//! [`Scenario`]: an ordered list of typed steps interpreted by one generic
//! runner.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Browser**: Engine trait, agent-browser executor and session lifetime
//! - **Harness**: Readiness waits, interactions, captures, the scenario
//!   state machine, the batch runner and the built-in catalog
//! - **CLI**: Logging setup and command handlers
//!
//! # Usage
//!
//! ```rust,no_run
//! use pagecheck::harness::catalog;
//! use pagecheck::Config;
//!
//! #[tokio::main]
//! async fn main() -> pagecheck::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!     let scenario = catalog::header_title(&config.target.url, "verification/verification.png")?;
//!     let report = pagecheck::cli::commands::runner_from_config(&config)
//!         .run_all(&[scenario])
//!         .await;
//!     println!("{} passed", report.passed());
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod cli;
pub mod core;
pub mod harness;

// Re-export commonly used items
pub use crate::core::{Config, Outcome, PageCheckError, Result, Scenario, Step};
pub use harness::{RunReport, Runner};
