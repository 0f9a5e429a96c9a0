//! Scenario runner — executes scenarios against the application and
//! produces per-scenario pass/fail results

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::app::AppProbe;
use crate::error::{E2eError, E2eResult};
use crate::flows::{self, Credentials};
use crate::scenario::{Scenario, Step};
use crate::session::{Session, SessionConfig, StepResult};

/// Placeholder substituted with a per-run token, so scenarios that create
/// backend state (registration) stay unique across runs.
pub const UNIQUE_TOKEN: &str = "{{unique}}";

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub failed_step: Option<usize>,
    pub error: Option<String>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

/// Main scenario runner
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    /// Create a runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Block until the application under test answers HTTP
    pub async fn wait_for_app(&self) -> E2eResult<()> {
        let probe = AppProbe::new(&self.config.session.base_url)?;
        probe.wait_until_ready(self.config.app_ready_timeout).await
    }

    /// Run all scenarios in the specs directory
    pub async fn run_all(&self) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(&self.config.specs_dir)?;
        self.run_scenarios(&scenarios).await
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(&self.config.specs_dir)?;
        let filtered: Vec<Scenario> = scenarios
            .into_iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect();
        self.run_scenarios(&filtered).await
    }

    /// Run a specific scenario by name
    pub async fn run_scenario(&self, name: &str) -> E2eResult<ScenarioResult> {
        let scenarios = Scenario::load_all(&self.config.specs_dir)?;
        let scenario = scenarios
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()))?;

        self.wait_for_app().await?;
        self.run_one(&scenario).await
    }

    /// Run a list of scenarios, one session at a time
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> E2eResult<SuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        self.wait_for_app().await?;

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            match self.run_one(scenario).await {
                Ok(result) => {
                    if result.passed {
                        passed += 1;
                        info!("✓ {} ({} ms)", result.name, result.duration_ms);
                    } else {
                        failed += 1;
                        error!(
                            "✗ {} - {}",
                            result.name,
                            result.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    results.push(result);
                }
                Err(e) => {
                    failed += 1;
                    error!("✗ {} - {}", scenario.name, e);
                    results.push(ScenarioResult {
                        name: scenario.name.clone(),
                        passed: false,
                        duration_ms: 0,
                        steps: vec![],
                        failed_step: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteResult {
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run a single scenario in a fresh session
    pub async fn run_one(&self, scenario: &Scenario) -> E2eResult<ScenarioResult> {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        scenario.validate()?;

        let mut session_config = self.config.session.clone();
        session_config.viewport_width = scenario.viewport.width;
        session_config.viewport_height = scenario.viewport.height;
        let session = Session::new(session_config)?;

        let steps = self.effective_steps(scenario);
        let step_results = session.run(scenario.clean_session, &steps).await?;

        let failed_step = step_results.iter().position(|r| !r.success);
        let error = failed_step.map(|i| {
            format!(
                "{}: {}",
                step_results[i].step_name,
                step_results[i].error.as_deref().unwrap_or("unknown failure")
            )
        });

        Ok(ScenarioResult {
            name: scenario.name.clone(),
            passed: failed_step.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps: step_results,
            failed_step,
            error,
        })
    }

    /// Materialize the executed step sequence: login precondition first,
    /// then the declared steps, with unique tokens substituted once per run
    fn effective_steps(&self, scenario: &Scenario) -> Vec<Step> {
        let mut steps = Vec::new();

        if scenario.login {
            steps.extend(flows::login_steps(&self.config.credentials));
        }
        steps.extend(scenario.steps.iter().cloned());

        let token = unique_token();
        substitute_unique(&mut steps, &token);

        steps
    }

    /// Write suite results to a JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("scenario-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Six-digit run token, matching the uniqueness the registration flow needs
fn unique_token() -> String {
    format!("{:06}", rand::random::<u32>() % 1_000_000)
}

fn substitute_unique(steps: &mut [Step], token: &str) {
    for step in steps.iter_mut() {
        match step {
            Step::Navigate { path } => replace_token(path, token),
            Step::Fill { value, .. } => replace_token(value, token),
            Step::Click { target, .. }
            | Step::AssertVisible { target, .. }
            | Step::AssertAbsent { target, .. } => {
                if let Some(text) = target.text.as_mut() {
                    replace_token(text, token);
                }
            }
            Step::AssertAttribute { target, value, .. } => {
                if let Some(text) = target.text.as_mut() {
                    replace_token(text, token);
                }
                replace_token(value, token);
            }
            Step::AssertUrl { equals, contains, .. } => {
                if let Some(path) = equals.as_mut() {
                    replace_token(path, token);
                }
                if let Some(fragment) = contains.as_mut() {
                    replace_token(fragment, token);
                }
            }
        }
    }
}

fn replace_token(value: &mut String, token: &str) {
    if value.contains(UNIQUE_TOKEN) {
        *value = value.replace(UNIQUE_TOKEN, token);
    }
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub session: SessionConfig,
    pub credentials: Credentials,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
    pub app_ready_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            credentials: Credentials::default(),
            specs_dir: PathBuf::from("specs"),
            output_dir: PathBuf::from("test-results"),
            app_ready_timeout: Duration::from_secs(30),
        }
    }
}
