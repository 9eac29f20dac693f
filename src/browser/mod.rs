//! Browser automation module
//!
//! The engine trait, its agent-browser implementation and the session that
//! owns an engine for the length of one scenario.

mod engine;
mod executor;
mod reply;
mod script;
mod session;

pub use engine::{BrowserEngine, EngineFactory};
pub use executor::{AgentBrowserFactory, BrowserExecutor};
pub use reply::{ElementRect, WaitReport};
pub use session::BrowserSession;
