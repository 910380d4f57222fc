//! Test runner: provisions one live instance per group and runs its scenarios

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::{Driver, HarnessConfig};
use crate::error::{E2eError, E2eResult};
use crate::page::PageFactory;
use crate::playwright::PlaywrightFactory;
use crate::session::Session;
use crate::simulated::SimulatedFactory;
use crate::spec::{Scenario, ScenarioGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    /// Not run: the group's instance was unusable
    Skipped,
    /// Failed, as its `expect_failure` said it would
    ExpectedFailure,
    /// Marked `expect_failure` but passed
    UnexpectedPass,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASSED",
            Outcome::Failed => "FAILED",
            Outcome::Skipped => "SKIPPED",
            Outcome::ExpectedFailure => "XFAIL",
            Outcome::UnexpectedPass => "XPASS",
        }
    }

    /// Whether this outcome leaves the exit status clean
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Passed | Outcome::ExpectedFailure | Outcome::UnexpectedPass
        )
    }
}

/// Result of executing a scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub group: String,
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub steps_run: usize,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub soft_failures: Vec<String>,
    /// `expect_failure` reason, or why the scenario was skipped
    pub reason: Option<String>,
}

impl ScenarioResult {
    fn skipped(group: &str, scenario: &Scenario, reason: &str) -> Self {
        Self {
            group: group.to_string(),
            name: scenario.name.clone(),
            outcome: Outcome::Skipped,
            duration_ms: 0,
            steps_run: 0,
            steps: Vec::new(),
            error: None,
            soft_failures: Vec::new(),
            reason: Some(reason.to_string()),
        }
    }
}

/// Result of running all groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub xfailed: usize,
    pub xpassed: usize,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn from_results(results: Vec<ScenarioResult>, duration_ms: u64) -> Self {
        let count = |outcome: Outcome| results.iter().filter(|r| r.outcome == outcome).count();
        Self {
            total: results.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            skipped: count(Outcome::Skipped),
            xfailed: count(Outcome::ExpectedFailure),
            xpassed: count(Outcome::UnexpectedPass),
            duration_ms,
            finished_at: Utc::now(),
            results,
        }
    }

    /// Every scenario passed or was an expected failure
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: HarnessConfig,
    factory: Arc<dyn PageFactory>,
}

impl TestRunner {
    pub fn new(config: HarnessConfig, factory: Arc<dyn PageFactory>) -> Self {
        Self { config, factory }
    }

    /// Create a runner whose page factory follows `config.driver`
    pub fn from_config(config: HarnessConfig) -> Self {
        let factory: Arc<dyn PageFactory> = match config.driver {
            Driver::Playwright => Arc::new(PlaywrightFactory::new(config.playwright.clone())),
            Driver::Simulated => Arc::new(SimulatedFactory::new(config.simulated.clone())),
        };
        Self::new(config, factory)
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Built-in suite (if enabled) followed by groups from `scenarios_dir`
    pub fn load_groups(&self) -> E2eResult<Vec<ScenarioGroup>> {
        let mut groups = Vec::new();
        if self.config.include_builtin {
            groups.push(ScenarioGroup::builtin()?);
        }
        if let Some(dir) = &self.config.scenarios_dir {
            groups.extend(ScenarioGroup::load_all(dir)?);
        }
        if groups.is_empty() {
            return Err(E2eError::ScenarioParse("no scenario groups to run".to_string()));
        }
        Ok(groups)
    }

    /// Run every configured group
    pub async fn run_all(&self) -> E2eResult<SuiteResult> {
        let groups = self.load_groups()?;
        Ok(self.run_groups(&groups).await)
    }

    /// Run groups one after another, each on its own instance
    pub async fn run_groups(&self, groups: &[ScenarioGroup]) -> SuiteResult {
        let start = Instant::now();
        let total: usize = groups.iter().map(|g| g.scenarios.len()).sum();
        info!(
            "Running {} scenario(s) in {} group(s) with the {} driver...",
            total,
            groups.len(),
            self.factory.name()
        );

        let mut results = Vec::with_capacity(total);
        for group in groups {
            results.extend(self.run_group(group).await);
        }

        let suite = SuiteResult::from_results(results, start.elapsed().as_millis() as u64);

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} skipped, {} xfailed, {} xpassed ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.xfailed, suite.xpassed, suite.duration_ms
        );
        suite
    }

    /// Run one group's scenarios in order against a single live instance
    pub async fn run_group(&self, group: &ScenarioGroup) -> Vec<ScenarioResult> {
        let url = group
            .url
            .clone()
            .unwrap_or_else(|| self.config.base_url.clone());
        debug!("Provisioning {} page for group '{}'", self.factory.name(), group.name);

        let mut page = match self.factory.provision().await {
            Ok(page) => page,
            Err(e) => {
                let reason = format!("no {} page: {}", self.factory.name(), e);
                error!("✗ {} - {}", group.name, reason);
                return group
                    .scenarios
                    .iter()
                    .map(|s| ScenarioResult::skipped(&group.name, s, &reason))
                    .collect();
            }
        };

        let mut results = Vec::with_capacity(group.scenarios.len());
        {
            let mut session = Session::new(page.as_mut(), url, self.config.settle.clone());
            let mut unusable: Option<String> = None;

            for scenario in &group.scenarios {
                if let Some(reason) = &unusable {
                    let result = ScenarioResult::skipped(&group.name, scenario, reason);
                    warn!("- {}::{} SKIPPED ({})", group.name, scenario.name, reason);
                    results.push(result);
                    continue;
                }

                let (result, fatal) = self.run_scenario(&mut session, &group.name, scenario).await;
                if let Some(e) = fatal {
                    unusable = Some(format!("instance unusable after '{}': {}", scenario.name, e));
                }
                results.push(result);
            }
        }

        if let Err(e) = page.close().await {
            warn!("Failed to close page for group '{}': {}", group.name, e);
        }
        results
    }

    /// Returns the result and, when the instance became unusable, the error
    async fn run_scenario(
        &self,
        session: &mut Session<'_>,
        group: &str,
        scenario: &Scenario,
    ) -> (ScenarioResult, Option<String>) {
        let start = Instant::now();
        let limit = Duration::from_millis(self.config.scenario_timeout_ms);
        debug!("Running scenario: {}::{}", group, scenario.name);

        let mut steps = Vec::new();
        let mut failure = session.begin_scenario().await.err();

        if failure.is_none() {
            for step in &scenario.steps {
                if start.elapsed() > limit {
                    failure = Some(E2eError::ScenarioTimeout {
                        name: scenario.name.clone(),
                        elapsed_ms: start.elapsed().as_millis() as u64,
                    });
                    break;
                }

                let step_start = Instant::now();
                let outcome = session.execute(step).await;
                steps.push(StepResult {
                    step_name: step.name(),
                    success: outcome.is_ok(),
                    duration_ms: step_start.elapsed().as_millis() as u64,
                    error: outcome.as_ref().err().map(|e| e.to_string()),
                });

                if let Err(e) = outcome {
                    failure = Some(e);
                    break;
                }
            }
        }

        if failure.is_none() {
            session.finish_scenario();
        }

        let soft_failures = session.take_soft_failures();
        let fatal = failure
            .as_ref()
            .filter(|e| e.is_fatal())
            .map(|e| e.to_string());
        let error = failure.map(|e| e.to_string()).or_else(|| {
            (!soft_failures.is_empty())
                .then(|| format!("{} step(s) failed softly", soft_failures.len()))
        });

        let outcome = match (scenario.expect_failure.is_some(), error.is_some()) {
            (false, false) => Outcome::Passed,
            (false, true) => Outcome::Failed,
            (true, true) => Outcome::ExpectedFailure,
            (true, false) => Outcome::UnexpectedPass,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Outcome::Passed => info!("✓ {}::{} ({} ms)", group, scenario.name, duration_ms),
            Outcome::Failed => error!(
                "✗ {}::{} - {}",
                group,
                scenario.name,
                error.as_deref().unwrap_or("unknown error")
            ),
            Outcome::ExpectedFailure => info!(
                "x {}::{} XFAIL ({})",
                group,
                scenario.name,
                scenario.expect_failure.as_deref().unwrap_or_default()
            ),
            Outcome::UnexpectedPass => warn!("! {}::{} XPASS", group, scenario.name),
            Outcome::Skipped => {}
        }

        let result = ScenarioResult {
            group: group.to_string(),
            name: scenario.name.clone(),
            outcome,
            duration_ms,
            steps_run: steps.len(),
            steps,
            error,
            soft_failures,
            reason: scenario.expect_failure.clone(),
        };
        (result, fatal)
    }

    /// Write results to `test-results.json`, replacing any previous run
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
