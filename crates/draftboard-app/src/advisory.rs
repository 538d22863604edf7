// HTTP client for the pick advisory service.
//
// Posts an `AdvisoryRequest` snapshot and decodes the opinion. The result is
// for display only and never touches the draft state.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use draftboard_core::advisory::{AdvisoryOpinion, AdvisoryRequest, AdvisoryResponse};

use crate::config::AdvisoryConfig;

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisory service not configured")]
    Disabled,

    #[error("player is not available")]
    PlayerUnavailable,

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("advisory request failed: {0}")]
    Http(reqwest::Error),

    #[error("advisory service returned status {0}")]
    Status(reqwest::StatusCode),
}

// ---------------------------------------------------------------------------
// Advisor
// ---------------------------------------------------------------------------

/// Low-level client for one advisory endpoint.
pub struct Advisor {
    http: reqwest::Client,
    url: String,
}

impl Advisor {
    pub fn new(url: String, timeout: Duration) -> Result<Self, AdvisoryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AdvisoryError::Client)?;
        Ok(Self { http, url })
    }

    pub async fn ask(&self, request: &AdvisoryRequest<'_>) -> Result<AdvisoryOpinion, AdvisoryError> {
        debug!("asking advisory service about {}", request.player.player_id);
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(AdvisoryError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisoryError::Status(status));
        }

        let body: AdvisoryResponse = response.json().await.map_err(AdvisoryError::Http)?;
        Ok(body.opinion)
    }
}

// ---------------------------------------------------------------------------
// AdvisoryClient wrapper
// ---------------------------------------------------------------------------

/// Either a configured advisor or disabled.
pub enum AdvisoryClient {
    Active(Advisor),
    Disabled,
}

impl AdvisoryClient {
    /// `Active` when an endpoint is configured and the HTTP client builds,
    /// otherwise `Disabled`.
    pub fn from_config(config: &AdvisoryConfig) -> Self {
        match &config.url {
            Some(url) if !url.is_empty() => {
                match Advisor::new(url.clone(), Duration::from_secs(config.timeout_secs)) {
                    Ok(advisor) => AdvisoryClient::Active(advisor),
                    Err(e) => {
                        warn!("advisory client disabled: {}", e);
                        AdvisoryClient::Disabled
                    }
                }
            }
            _ => AdvisoryClient::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, AdvisoryClient::Active(_))
    }

    pub async fn ask(&self, request: &AdvisoryRequest<'_>) -> Result<AdvisoryOpinion, AdvisoryError> {
        match self {
            AdvisoryClient::Active(advisor) => advisor.ask(request).await,
            AdvisoryClient::Disabled => Err(AdvisoryError::Disabled),
        }
    }
}
