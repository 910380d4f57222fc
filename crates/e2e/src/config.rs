//! Harness configuration

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::playwright::PlaywrightConfig;
use crate::settle::SettleConfig;
use crate::simulated::SimulatedConfig;

pub const DEFAULT_BASE_URL: &str = "https://todomvc.com/examples/emberjs/todomvc/dist/";

pub const ENV_BASE_URL: &str = "TICKMARK_BASE_URL";
pub const ENV_DRIVER: &str = "TICKMARK_DRIVER";

/// Which [`crate::page::Page`] implementation backs the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Playwright,
    Simulated,
}

impl FromStr for Driver {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playwright" => Ok(Driver::Playwright),
            "simulated" => Ok(Driver::Simulated),
            other => Err(E2eError::Config(format!("unknown driver '{}'", other))),
        }
    }
}

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Entry URL of the application under test
    pub base_url: String,

    pub driver: Driver,

    /// Extra scenario groups (`*.yaml` / `*.yml`)
    pub scenarios_dir: Option<PathBuf>,

    /// Run the embedded TodoMVC suite
    pub include_builtin: bool,

    /// Where `test-results.json` is written
    pub output_dir: PathBuf,

    /// Checked between steps; a scenario past it is aborted
    pub scenario_timeout_ms: u64,

    pub settle: SettleConfig,

    pub playwright: PlaywrightConfig,

    pub simulated: SimulatedConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            driver: Driver::default(),
            scenarios_dir: None,
            include_builtin: true,
            output_dir: PathBuf::from("test-results"),
            scenario_timeout_ms: 60_000,
            settle: SettleConfig::default(),
            playwright: PlaywrightConfig::default(),
            simulated: SimulatedConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, defaults when it does not exist
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| E2eError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `TICKMARK_BASE_URL` / `TICKMARK_DRIVER` overrides
    pub fn apply_env(&mut self) -> E2eResult<()> {
        self.apply_overrides(
            std::env::var(ENV_BASE_URL).ok(),
            std::env::var(ENV_DRIVER).ok(),
        )
    }

    fn apply_overrides(&mut self, base_url: Option<String>, driver: Option<String>) -> E2eResult<()> {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(driver) = driver {
            self.driver = driver.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(E2eError::Config("base_url is empty".to_string()));
        }
        if self.settle.timeout_ms == 0 {
            return Err(E2eError::Config("settle.timeout_ms must be positive".to_string()));
        }
        if self.settle.poll_interval_ms > self.settle.timeout_ms {
            return Err(E2eError::Config(format!(
                "settle.poll_interval_ms ({}) exceeds settle.timeout_ms ({})",
                self.settle.poll_interval_ms, self.settle.timeout_ms
            )));
        }
        if !self.include_builtin && self.scenarios_dir.is_none() {
            return Err(E2eError::Config(
                "nothing to run: include_builtin is off and no scenarios_dir is set".to_string(),
            ));
        }
        if let Some(dir) = &self.scenarios_dir {
            if !dir.is_dir() {
                return Err(E2eError::Config(format!(
                    "scenarios_dir {} is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
