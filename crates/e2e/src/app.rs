//! Readiness probe for the application under test
//!
//! The application (front end, back end, auth service, data store) is an
//! external collaborator; it is never spawned from here. Before a suite
//! starts, the probe polls the base URL until the front end answers, so
//! scenario failures mean broken behavior rather than a cold server.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Polls the application base URL until it responds
pub struct AppProbe {
    base_url: String,
    client: reqwest::Client,
}

impl AppProbe {
    pub fn new(base_url: &str) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wait for the application to answer HTTP on its base URL
    pub async fn wait_until_ready(&self, timeout_duration: Duration) -> E2eResult<()> {
        let url = format!("{}/", self.base_url);
        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match self.client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("Application is reachable at {}", self.base_url);
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Readiness probe returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for application at {}...", self.base_url);
                    }
                    // Connection refused is expected while the app is starting
                    if !e.is_connect() {
                        warn!("Readiness probe error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(250)).await;
        }

        Err(E2eError::AppUnreachable {
            url: self.base_url.clone(),
            attempts,
        })
    }
}
