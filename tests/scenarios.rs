//! Scenario state machine tests against a scripted engine
//!
//! Covers the built-in festival checks, every failure path and the teardown
//! guarantee.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{Element, ScriptedEngine};
use pagecheck::browser::BrowserEngine;
use pagecheck::core::{CaptureScope, Locator, ScenarioState, Step};
use pagecheck::harness::catalog::{self, HEADER_TITLE, LOADING_HEADING, MAP_CAPTION};
use pagecheck::harness::{run_scenario, RunOptions, Runner};
use pagecheck::{Outcome, Scenario};

const TARGET: &str = "http://localhost:5173/";

fn options() -> RunOptions {
    RunOptions {
        deadline: Duration::from_secs(120),
        diagnostics: true,
        probe_timeout: None,
    }
}

fn loading() -> Locator {
    Locator::role_named("heading", LOADING_HEADING)
}

fn mapa_link() -> Locator {
    Locator::Role {
        role: "link".to_string(),
        name: Some("Mapa".to_string()),
        exact: true,
    }
}

/// A page that has finished loading and renders every checked element
fn loaded_site() -> ScriptedEngine {
    ScriptedEngine::new()
        .element(Locator::role_named("heading", HEADER_TITLE), Element::shown())
        .element(Locator::css("header"), Element::shown())
        .element(Locator::role("navigation"), Element::shown())
        .element(mapa_link(), Element::shown())
        .element(Locator::css("#map"), Element::below_fold())
        .element(Locator::text(MAP_CAPTION), Element::below_fold())
        .effect(
            Locator::css("#map"),
            Locator::text(MAP_CAPTION),
            Element::shown(),
        )
}

async fn run(scenario: &Scenario, engine: &Arc<ScriptedEngine>) -> Outcome {
    run_scenario(scenario, "test-session", engine.clone(), &options()).await
}

#[tokio::test]
async fn test_header_title_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("verification.png");
    let scenario = catalog::header_title(TARGET, &output).unwrap();
    let engine = Arc::new(loaded_site());

    let outcome = run(&scenario, &engine).await;

    assert!(outcome.success, "{:?}", outcome.error_message);
    assert_eq!(outcome.final_state, ScenarioState::Succeeded);
    assert_eq!(
        outcome.trace,
        vec![
            ScenarioState::Pending,
            ScenarioState::Navigating,
            ScenarioState::Waiting,
            ScenarioState::Capturing,
            ScenarioState::Succeeded,
        ]
    );
    assert_eq!(outcome.screenshot_path.as_deref(), Some(output.as_path()));
    assert_eq!(fs::read_to_string(&output).unwrap(), "png:full page");
    assert_eq!(engine.count_calls("close"), 1);
    assert_eq!(engine.calls()[1], format!("navigate {}", TARGET));
}

#[tokio::test]
async fn test_nav_menu_waits_hidden_then_visible() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = catalog::nav_menu(TARGET, dir.path().join("nav.png")).unwrap();
    let engine = Arc::new(loaded_site());

    let outcome = run(&scenario, &engine).await;

    assert!(outcome.success, "{:?}", outcome.error_message);
    let waits: Vec<String> = engine
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("wait"))
        .collect();
    assert_eq!(
        waits,
        vec![
            format!("wait {} to be hidden", loading()),
            "wait role=navigation to be visible".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_loading_never_disappears() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("nav.png");
    let scenario = catalog::nav_menu(TARGET, &output).unwrap();
    let engine = Arc::new(loaded_site().element(loading(), Element::shown()));

    let outcome = run(&scenario, &engine).await;

    assert!(!outcome.success);
    assert_eq!(outcome.final_state, ScenarioState::Failed);
    let step = outcome.failed_step.as_deref().unwrap();
    assert!(step.starts_with("wait_hidden"), "{}", step);
    let message = outcome.error_message.as_deref().unwrap();
    assert!(message.contains("Cargando Verbenas de Tenerife..."), "{}", message);
    assert!(message.contains("30000ms"), "{}", message);

    // The navigation check never ran and nothing was captured at the output
    assert_eq!(engine.count_calls("wait role=navigation"), 0);
    assert!(!output.exists());
    assert!(outcome.screenshot_path.is_none());

    // A diagnostic capture was taken before teardown
    let diagnostic = outcome.diagnostic_path.as_deref().unwrap();
    assert_eq!(diagnostic, dir.path().join("nav-failure.png").as_path());
    assert!(diagnostic.exists());
    let calls = engine.calls();
    assert_eq!(calls.last().map(String::as_str), Some("close"));
    assert_eq!(engine.count_calls("close"), 1);
}

#[tokio::test]
async fn test_map_section_clicks_only_after_loading_hidden() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = catalog::map_section(TARGET, dir.path().join("map.png")).unwrap();
    let engine = Arc::new(loaded_site());

    let outcome = run(&scenario, &engine).await;

    assert!(outcome.success, "{:?}", outcome.error_message);
    assert_eq!(
        outcome.trace,
        vec![
            ScenarioState::Pending,
            ScenarioState::Navigating,
            ScenarioState::Waiting,
            ScenarioState::Interacting,
            ScenarioState::Waiting,
            ScenarioState::Capturing,
            ScenarioState::Succeeded,
        ]
    );

    let calls = engine.calls();
    let position = |prefix: &str| calls.iter().position(|c| c.starts_with(prefix)).unwrap();
    assert!(position("wait role=heading") < position("click"));
    assert!(position("click") < position("scroll"));
    assert!(position("scroll") < position("wait text~="));
}

#[tokio::test]
async fn test_map_section_without_link_fails() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = catalog::map_section(TARGET, dir.path().join("map.png")).unwrap();
    let engine = Arc::new(loaded_site().element(mapa_link(), Element::default()));

    let outcome = run(&scenario, &engine).await;

    assert_eq!(outcome.final_state, ScenarioState::Failed);
    assert!(outcome
        .failed_step
        .as_deref()
        .unwrap()
        .starts_with("click role=link"));
    assert!(outcome
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("No element matches role=link[name==\"Mapa\"]"));
    assert_eq!(engine.count_calls("click"), 0);
    assert_eq!(engine.count_calls("scroll"), 0);
    assert_eq!(engine.count_calls("close"), 1);
}

#[tokio::test]
async fn test_duplicate_link_is_ambiguous() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = catalog::map_section(TARGET, dir.path().join("map.png")).unwrap();
    let engine = Arc::new(loaded_site().element(mapa_link(), Element::many(2)));

    let outcome = run(&scenario, &engine).await;

    assert!(!outcome.success);
    assert!(outcome
        .error_message
        .as_deref()
        .unwrap()
        .contains("2 elements match"));
    assert_eq!(engine.count_calls("close"), 1);
}

#[tokio::test]
async fn test_unreachable_target_fails_at_navigation() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = catalog::map_section(TARGET, dir.path().join("map.png")).unwrap();
    let mut engine = loaded_site();
    engine.fail_navigate = true;
    let engine = Arc::new(engine);

    let outcome = run(&scenario, &engine).await;

    assert_eq!(
        outcome.trace,
        vec![
            ScenarioState::Pending,
            ScenarioState::Navigating,
            ScenarioState::Failed,
        ]
    );
    assert_eq!(outcome.failed_step.as_deref(), Some("navigate"));
    assert_eq!(engine.count_calls("wait"), 0);
    // Navigation failures leave nothing worth a diagnostic capture
    assert!(outcome.diagnostic_path.is_none());
    assert_eq!(engine.count_calls("screenshot"), 0);
    assert_eq!(engine.count_calls("close"), 1);
}

#[tokio::test]
async fn test_probe_stops_navigation_to_dead_server() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = catalog::header_title("http://127.0.0.1:1/", dir.path().join("h.png")).unwrap();
    let engine = Arc::new(loaded_site());
    let options = RunOptions {
        probe_timeout: Some(Duration::from_secs(2)),
        ..options()
    };

    let outcome = run_scenario(&scenario, "probe", engine.clone(), &options).await;

    assert!(!outcome.success);
    assert!(outcome
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Navigation to http://127.0.0.1:1/ failed"));
    assert_eq!(engine.count_calls("navigate"), 0);
    assert_eq!(engine.count_calls("close"), 1);
}

#[tokio::test]
async fn test_launch_failure_still_tears_down() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = catalog::header_title(TARGET, dir.path().join("h.png")).unwrap();
    let mut engine = loaded_site();
    engine.fail_launch = true;
    let engine = Arc::new(engine);

    let outcome = run(&scenario, &engine).await;

    assert_eq!(
        outcome.trace,
        vec![ScenarioState::Pending, ScenarioState::Failed]
    );
    assert_eq!(outcome.failed_step.as_deref(), Some("launch"));
    assert!(outcome
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Launch error"));
    assert_eq!(engine.calls(), vec!["launch", "close"]);
}

#[tokio::test]
async fn test_unwritable_output_fails_capture() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("verification");
    fs::write(&blocker, b"not a directory").unwrap();
    let scenario = catalog::header_title(TARGET, blocker.join("verification.png")).unwrap();
    let engine = Arc::new(loaded_site());

    let outcome = run(&scenario, &engine).await;

    assert_eq!(outcome.final_state, ScenarioState::Failed);
    assert!(outcome
        .failed_step
        .as_deref()
        .unwrap()
        .starts_with("screenshot"));
    assert!(outcome
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Could not write screenshot"));
    assert_eq!(engine.count_calls("close"), 1);
}

#[tokio::test]
async fn test_engine_write_failure_is_a_capture_error() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = catalog::header_title(TARGET, dir.path().join("h.png")).unwrap();
    let mut engine = loaded_site();
    engine.fail_screenshot = true;
    let engine = Arc::new(engine);

    let outcome = run(&scenario, &engine).await;

    let message = outcome.error_message.unwrap();
    assert!(message.contains("read-only file system"), "{}", message);
    assert!(outcome.diagnostic_path.is_none());
    assert_eq!(engine.count_calls("close"), 1);
}

#[tokio::test]
async fn test_missing_element_is_not_replaced_by_full_page() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("header.png");
    let scenario = Scenario::new(
        "header-only",
        TARGET,
        vec![
            Step::Navigate,
            Step::Screenshot {
                scope: CaptureScope::Element {
                    locator: Locator::css("header"),
                },
            },
        ],
        &output,
    )
    .unwrap();
    let engine = Arc::new(ScriptedEngine::new());

    let outcome = run(&scenario, &engine).await;

    assert!(!outcome.success);
    assert!(outcome
        .error_message
        .as_deref()
        .unwrap()
        .contains("No element matches css=header"));
    assert!(!output.exists());
    // Only the diagnostic capture reached the engine
    assert_eq!(engine.count_calls("screenshot"), 1);
}

#[tokio::test]
async fn test_header_capture_is_element_scoped() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("header.png");
    let scenario = catalog::header_capture(TARGET, &output).unwrap();
    let engine = Arc::new(loaded_site());

    let outcome = run(&scenario, &engine).await;

    assert!(outcome.success, "{:?}", outcome.error_message);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "png:element css=header"
    );
}

#[tokio::test]
async fn test_rerun_overwrites_and_clears_stale_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("verification.png");
    let scenario = catalog::header_title(TARGET, &output).unwrap();
    fs::write(scenario.diagnostic_path(), b"old failure").unwrap();
    fs::write(&output, b"old capture").unwrap();

    let first = run(&scenario, &Arc::new(loaded_site())).await;
    let second = run(&scenario, &Arc::new(loaded_site())).await;

    assert!(first.success && second.success);
    assert_eq!(first.final_state, second.final_state);
    assert_eq!(fs::read_to_string(&output).unwrap(), "png:full page");
    assert!(!scenario.diagnostic_path().exists());
    let files: Vec<PathBuf> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files, vec![output.clone()]);
}

#[tokio::test]
async fn test_failed_rerun_removes_previous_capture() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("verification.png");
    let scenario = catalog::header_title(TARGET, &output).unwrap();

    let ok = run(&scenario, &Arc::new(loaded_site())).await;
    assert!(ok.success);

    let mut broken = loaded_site();
    broken.fail_navigate = true;
    let failed = run(&scenario, &Arc::new(broken)).await;

    assert!(!failed.success);
    assert!(!output.exists());
}

#[tokio::test(start_paused = true)]
async fn test_scenario_deadline_cancels_inflight_wait() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = Scenario::new(
        "slow",
        TARGET,
        vec![
            Step::Navigate,
            Step::WaitVisible {
                locator: Locator::css("#never"),
                timeout_ms: 600_000,
            },
        ],
        dir.path().join("slow.png"),
    )
    .unwrap();
    let engine = Arc::new(ScriptedEngine::new());
    let options = RunOptions {
        deadline: Duration::from_secs(5),
        diagnostics: false,
        ..options()
    };

    let outcome = run_scenario(&scenario, "slow", engine.clone(), &options).await;

    assert_eq!(outcome.final_state, ScenarioState::Failed);
    let message = outcome.error_message.as_deref().unwrap();
    assert!(message.contains("scenario 'slow' to finish"), "{}", message);
    assert!(outcome
        .failed_step
        .as_deref()
        .unwrap()
        .starts_with("wait_visible css=#never"));
    assert_eq!(engine.count_calls("close"), 1);
    assert_eq!(engine.count_calls("screenshot"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_skips_diagnostic_capture() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = Scenario::new(
        "slow",
        TARGET,
        vec![
            Step::Navigate,
            Step::WaitVisible {
                locator: Locator::css("#never"),
                timeout_ms: 600_000,
            },
        ],
        dir.path().join("slow.png"),
    )
    .unwrap();
    let mut engine = ScriptedEngine::new();
    engine.screenshot_delay = Some(Duration::from_secs(60));
    let engine = Arc::new(engine);
    let options = RunOptions {
        deadline: Duration::from_secs(5),
        ..options()
    };

    let outcome = run_scenario(&scenario, "slow", engine.clone(), &options).await;

    assert_eq!(outcome.final_state, ScenarioState::Failed);
    assert!(outcome.duration_ms < 6_000, "ran {}ms", outcome.duration_ms);
    assert!(outcome.diagnostic_path.is_none());
    assert_eq!(engine.count_calls("screenshot"), 0);
    assert_eq!(engine.calls().last().map(String::as_str), Some("close"));
}

#[tokio::test(start_paused = true)]
async fn test_diagnostic_capture_bounded_by_remaining_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = Scenario::new(
        "slow",
        TARGET,
        vec![
            Step::Navigate,
            Step::WaitVisible {
                locator: Locator::css("#never"),
                timeout_ms: 3_000,
            },
        ],
        dir.path().join("slow.png"),
    )
    .unwrap();
    let mut engine = ScriptedEngine::new();
    engine.screenshot_delay = Some(Duration::from_secs(60));
    let engine = Arc::new(engine);
    let options = RunOptions {
        deadline: Duration::from_secs(5),
        ..options()
    };

    let outcome = run_scenario(&scenario, "slow", engine.clone(), &options).await;

    assert_eq!(outcome.final_state, ScenarioState::Failed);
    assert!(outcome
        .failed_step
        .as_deref()
        .unwrap()
        .starts_with("wait_visible css=#never"));
    assert!(outcome.duration_ms < 6_000, "ran {}ms", outcome.duration_ms);
    assert!(outcome.diagnostic_path.is_none());
    assert!(!scenario.diagnostic_path().exists());
    assert_eq!(engine.count_calls("screenshot"), 1);
    assert_eq!(engine.count_calls("close"), 1);
}

#[tokio::test]
async fn test_runner_isolates_sessions_and_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = Arc::new(Mutex::new(Vec::<String>::new()));
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    let factory = {
        let sessions = sessions.clone();
        let log = log.clone();
        move |name: &str| -> Arc<dyn BrowserEngine> {
            sessions.lock().unwrap().push(name.to_string());
            let engine = ScriptedEngine::with_log(log.clone())
                .element(Locator::role_named("heading", HEADER_TITLE), Element::shown())
                .element(Locator::role("navigation"), Element::shown())
                .element(Locator::css("header"), Element::shown());
            Arc::new(engine)
        }
    };

    let scenarios = vec![
        catalog::header_title(TARGET, dir.path().join("a.png")).unwrap(),
        catalog::map_section(TARGET, dir.path().join("b.png")).unwrap(),
        catalog::nav_menu(TARGET, dir.path().join("c.png")).unwrap(),
    ];

    let runner = Runner::new(Arc::new(factory), options())
        .with_concurrency(2)
        .with_session_prefix("ci");
    let report = runner.run_all(&scenarios).await;

    let names: Vec<&str> = report
        .outcomes
        .iter()
        .map(|o| o.scenario_name.as_str())
        .collect();
    assert_eq!(names, vec!["header-title", "map-section", "nav-menu"]);
    assert!(report.outcomes[0].success);
    assert!(!report.outcomes[1].success);
    assert!(report.outcomes[2].success);
    assert_eq!(report.passed(), 2);
    assert_eq!(report.exit_code(), 1);

    let sessions = sessions.lock().unwrap();
    assert_eq!(sessions.len(), 3);
    assert!(sessions.iter().all(|s| s.starts_with("ci-")));
    let mut unique = sessions.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 3);

    // One launch and one close per scenario
    let log = log.lock().unwrap();
    assert_eq!(log.iter().filter(|c| *c == "launch").count(), 3);
    assert_eq!(log.iter().filter(|c| *c == "close").count(), 3);
}

#[test]
fn test_every_wait_is_bounded() {
    let scenarios = catalog::builtins(TARGET, Path::new("verification")).unwrap();
    for scenario in &scenarios {
        for step in scenario.steps() {
            if let Some((_, timeout_ms)) = step.wait_condition() {
                assert!(timeout_ms > 0 && timeout_ms <= 30_000);
            }
        }
    }
}
