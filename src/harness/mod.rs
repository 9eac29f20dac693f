//! Verification harness
//!
//! Readiness waits, interactions and captures composed into scenarios, plus
//! the batch runner and the built-in scenario catalog.

pub mod capture;
pub mod catalog;
pub mod interaction;
pub mod probe;
pub mod runner;
pub mod scenario;
pub mod waiter;

pub use runner::{RunReport, Runner};
pub use scenario::{run_scenario, RunOptions};
