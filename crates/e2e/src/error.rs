//! Error types for the scenario suite

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Application not reachable at {url} after {attempts} attempts")]
    AppUnreachable { url: String, attempts: usize },

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Element not found: {locator} (waited {timeout_ms} ms)")]
    ElementNotFound { locator: String, timeout_ms: u64 },

    #[error("State mismatch: {subject}: expected \"{expected}\", observed \"{observed}\"")]
    StateMismatch {
        subject: String,
        expected: String,
        observed: String,
    },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
