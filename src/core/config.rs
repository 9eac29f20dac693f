//! Configuration management for pagecheck
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/pagecheck/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{PageCheckError, Result};

/// Default page under test
pub const DEFAULT_TARGET_URL: &str = "http://localhost:5173/";

/// Main configuration for pagecheck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page under test
    #[serde(default)]
    pub target: TargetConfig,
    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Scenario run configuration
    #[serde(default)]
    pub run: RunConfig,
}

/// Page under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Base URL (env: TARGET_URL)
    pub url: String,
    /// Timeout of the reachability probe issued before navigating, in ms
    pub probe_timeout_ms: u64,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// agent-browser executable
    pub program: String,
    /// Prefix of the per-scenario agent-browser session names
    pub session_prefix: String,
    /// Whether to run in headed mode (visible browser)
    pub headed: bool,
    /// Timeout for single engine commands (open, click, screenshot) in ms
    pub action_timeout_ms: u64,
}

/// Scenario run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory receiving screenshots
    pub output_dir: PathBuf,
    /// Hard upper bound on one scenario, teardown excluded
    pub scenario_deadline_ms: u64,
    /// How many scenarios may run at once, each on its own session
    pub concurrency: usize,
    /// Take a best-effort screenshot when a scenario fails on page state
    pub diagnostic_screenshots: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: env::var("TARGET_URL").unwrap_or_else(|_| DEFAULT_TARGET_URL.to_string()),
            probe_timeout_ms: 3000,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            program: env::var("PAGECHECK_AGENT_BROWSER")
                .unwrap_or_else(|_| "agent-browser".to_string()),
            session_prefix: env::var("PAGECHECK_SESSION_PREFIX")
                .unwrap_or_else(|_| "pagecheck".to_string()),
            headed: env::var("PAGECHECK_HEADED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            action_timeout_ms: 30000,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: env::var("PAGECHECK_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("verification")),
            scenario_deadline_ms: 120_000,
            concurrency: env::var("PAGECHECK_CONCURRENCY")
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or(1),
            diagnostic_screenshots: env::var("PAGECHECK_DIAGNOSTICS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pagecheck")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    ///
    /// Not validated: callers apply CLI overrides first, then call
    /// [`Config::validate`].
    pub fn load() -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::load_from(&Self::config_file())
    }

    /// Load `path` if it exists, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| PageCheckError::config(format!("Failed to read config: {}", e)))?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PageCheckError::config(format!("Failed to parse config: {}", e)))
    }

    /// Re-apply explicitly set environment variables over file values
    fn apply_env(&mut self) {
        if let Ok(url) = env::var("TARGET_URL") {
            self.target.url = url;
        }
        if let Ok(program) = env::var("PAGECHECK_AGENT_BROWSER") {
            self.browser.program = program;
        }
        if let Ok(prefix) = env::var("PAGECHECK_SESSION_PREFIX") {
            self.browser.session_prefix = prefix;
        }
        if let Ok(headed) = env::var("PAGECHECK_HEADED") {
            self.browser.headed = headed == "true" || headed == "1";
        }
        if let Ok(dir) = env::var("PAGECHECK_OUTPUT_DIR") {
            self.run.output_dir = PathBuf::from(dir);
        }
        if let Some(n) = env::var("PAGECHECK_CONCURRENCY")
            .ok()
            .and_then(|c| c.parse().ok())
        {
            self.run.concurrency = n;
        }
        if let Ok(diagnostics) = env::var("PAGECHECK_DIAGNOSTICS") {
            self.run.diagnostic_screenshots = diagnostics == "true" || diagnostics == "1";
        }
    }

    /// Reject values the runner cannot work with
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.target.url).map_err(|e| {
            PageCheckError::config(format!("Invalid target url '{}': {}", self.target.url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PageCheckError::config(format!(
                "Target url must be http(s): {}",
                self.target.url
            )));
        }
        if self.run.concurrency == 0 {
            return Err(PageCheckError::config("run.concurrency must be at least 1"));
        }
        if self.run.scenario_deadline_ms == 0 || self.browser.action_timeout_ms == 0 {
            return Err(PageCheckError::config("timeouts must be positive"));
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| PageCheckError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PageCheckError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| PageCheckError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Check if a config file exists
    pub fn config_exists() -> bool {
        Self::config_file().exists()
    }

    /// Render the configuration as TOML for display
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
