//! Built-in checks for the festival site and loading of scenario files
//!
//! Scenario files are TOML:
//!
//! ```toml
//! [[scenario]]
//! name = "blog"
//! path = "/blog"            # joined onto the target url; or `url = "..."`
//! output = "shots/blog.png" # default: <output_dir>/<name>.png
//!
//! [[scenario.steps]]
//! action = "navigate"
//!
//! [[scenario.steps]]
//! action = "wait_visible"
//! locator = { by = "role", role = "heading", name = "Blog" }
//! timeout_ms = 10000
//!
//! [[scenario.steps]]
//! action = "screenshot"
//! scope = "full_page"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::core::{CaptureScope, Locator, PageCheckError, Result, Scenario, Step};

/// Main title rendered by the site header
pub const HEADER_TITLE: &str = "DE BELINGO CON ÁNGEL";
/// Heading shown while events are loading
pub const LOADING_HEADING: &str = "Cargando Verbenas de Tenerife...";
/// Caption of the map section
pub const MAP_CAPTION: &str = "UBICACIÓN APROXIMADA DE LAS VERBENAS";

/// Names of the built-in scenarios, in run order
pub const BUILTIN_NAMES: [&str; 4] = ["header-title", "header-capture", "nav-menu", "map-section"];

fn loading_hidden() -> Step {
    Step::WaitHidden {
        locator: Locator::role_named("heading", LOADING_HEADING),
        timeout_ms: 30_000,
    }
}

/// Header title becomes visible; full-page capture
pub fn header_title(target: &str, output: impl Into<PathBuf>) -> Result<Scenario> {
    Scenario::new(
        "header-title",
        target,
        vec![
            Step::Navigate,
            Step::WaitVisible {
                locator: Locator::role_named("heading", HEADER_TITLE),
                timeout_ms: 15_000,
            },
            Step::Screenshot {
                scope: CaptureScope::FullPage,
            },
        ],
        output,
    )
}

/// Capture of the `<header>` element alone. A missing header fails the
/// scenario; there is no fallback to a full-page capture.
pub fn header_capture(target: &str, output: impl Into<PathBuf>) -> Result<Scenario> {
    Scenario::new(
        "header-capture",
        target,
        vec![
            Step::Navigate,
            Step::WaitVisible {
                locator: Locator::css("header"),
                timeout_ms: 30_000,
            },
            Step::Screenshot {
                scope: CaptureScope::Element {
                    locator: Locator::css("header"),
                },
            },
        ],
        output,
    )
}

/// Loading heading disappears, then the navigation bar is visible
pub fn nav_menu(target: &str, output: impl Into<PathBuf>) -> Result<Scenario> {
    Scenario::new(
        "nav-menu",
        target,
        vec![
            Step::Navigate,
            loading_hidden(),
            Step::WaitVisible {
                locator: Locator::role("navigation"),
                timeout_ms: 5_000,
            },
            Step::Screenshot {
                scope: CaptureScope::Viewport,
            },
        ],
        output,
    )
}

/// "Mapa" link leads to the map section, whose caption ends up on screen
pub fn map_section(target: &str, output: impl Into<PathBuf>) -> Result<Scenario> {
    Scenario::new(
        "map-section",
        target,
        vec![
            Step::Navigate,
            loading_hidden(),
            Step::Click {
                locator: Locator::Role {
                    role: "link".to_string(),
                    name: Some("Mapa".to_string()),
                    exact: true,
                },
            },
            Step::ScrollIntoView {
                locator: Locator::css("#map"),
            },
            Step::WaitInViewport {
                locator: Locator::text(MAP_CAPTION),
                timeout_ms: 5_000,
            },
            Step::Screenshot {
                scope: CaptureScope::Viewport,
            },
        ],
        output,
    )
}

/// Build one built-in scenario by name
pub fn builtin(name: &str, target: &str, output: impl Into<PathBuf>) -> Result<Scenario> {
    match name {
        "header-title" => header_title(target, output),
        "header-capture" => header_capture(target, output),
        "nav-menu" => nav_menu(target, output),
        "map-section" => map_section(target, output),
        other => Err(PageCheckError::invalid(format!(
            "unknown scenario '{}'. Available: {}",
            other,
            BUILTIN_NAMES.join(", ")
        ))),
    }
}

/// Every built-in scenario, each writing `<output_dir>/<name>.png`
pub fn builtins(target: &str, output_dir: &Path) -> Result<Vec<Scenario>> {
    BUILTIN_NAMES
        .iter()
        .map(|name| builtin(name, target, default_output(output_dir, name)))
        .collect()
}

fn default_output(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{}.png", name))
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    scenario: Vec<ScenarioDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioDef {
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    output: Option<PathBuf>,
    steps: Vec<Step>,
}

/// Parse scenario definitions from TOML text
pub fn parse_scenarios(content: &str, target: &str, output_dir: &Path) -> Result<Vec<Scenario>> {
    let file: ScenarioFile = toml::from_str(content)
        .map_err(|e| PageCheckError::invalid(format!("Failed to parse scenarios: {}", e)))?;

    if file.scenario.is_empty() {
        return Err(PageCheckError::invalid("no [[scenario]] tables found"));
    }

    let base = Url::parse(target)
        .map_err(|e| PageCheckError::config(format!("Invalid target url '{}': {}", target, e)))?;

    let mut scenarios = Vec::with_capacity(file.scenario.len());
    for def in file.scenario {
        let url = match (&def.url, &def.path) {
            (Some(_), Some(_)) => {
                return Err(PageCheckError::invalid(format!(
                    "{}: set either url or path, not both",
                    def.name
                )))
            }
            (Some(url), None) => url.clone(),
            (None, Some(path)) => base
                .join(path)
                .map_err(|e| PageCheckError::invalid(format!("{}: bad path: {}", def.name, e)))?
                .to_string(),
            (None, None) => base.to_string(),
        };
        let output = def
            .output
            .unwrap_or_else(|| default_output(output_dir, &def.name));
        let scenario = Scenario::new(def.name, &url, def.steps, output)?;

        if scenarios
            .iter()
            .any(|s: &Scenario| s.name() == scenario.name())
        {
            return Err(PageCheckError::invalid(format!(
                "duplicate scenario name '{}'",
                scenario.name()
            )));
        }
        scenarios.push(scenario);
    }
    Ok(scenarios)
}

/// Load scenario definitions from a TOML file
pub fn load_file(path: &Path, target: &str, output_dir: &Path) -> Result<Vec<Scenario>> {
    let content = fs::read_to_string(path).map_err(|e| {
        PageCheckError::config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_scenarios(&content, target, output_dir)
}
