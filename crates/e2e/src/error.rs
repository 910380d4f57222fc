//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Model error: {0}")]
    Model(#[from] tickmark_common::Error),

    #[error("Settle timeout after {elapsed_ms} ms waiting for {probe}: expected {expected}, observed {observed}")]
    SettleTimeout {
        probe: String,
        expected: String,
        observed: String,
        elapsed_ms: u64,
    },

    #[error("Assertion failed: {command} on '{selector}': expected {expected}, observed {observed}")]
    AssertionFailed {
        command: String,
        selector: String,
        expected: String,
        observed: String,
    },

    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Scenario '{name}' aborted at a command boundary after {elapsed_ms} ms")]
    ScenarioTimeout { name: String, elapsed_ms: u64 },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("No element matches '{0}'")]
    ElementNotFound(String),

    #[error("Element '{selector}' is not actionable: {reason}")]
    NotActionable { selector: String, reason: String },

    #[error("Unsupported selector: {0}")]
    UnsupportedSelector(String),

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright driver error: {0}")]
    Driver(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Intentional failure: {0}")]
    IntentionalFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl E2eError {
    /// Errors that leave the live instance unusable for the rest of its group
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            E2eError::Navigation(_)
                | E2eError::Driver(_)
                | E2eError::PlaywrightNotFound
                | E2eError::Io(_)
        )
    }

    pub fn is_settle_timeout(&self) -> bool {
        matches!(self, E2eError::SettleTimeout { .. })
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
