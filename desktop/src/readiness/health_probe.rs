//! Single health checks against the backend.

use crate::readiness::{CancelToken, ReadinessError, ReadinessResult};

use std::panic::Location;
use std::time::Duration;

use async_trait::async_trait;
use error_location::ErrorLocation;
use reqwest::header::CACHE_CONTROL;

/// One health request. Implementations must give up promptly once `cancel`
/// fires, releasing whatever the request holds.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self, cancel: &CancelToken) -> ReadinessResult<()>;
}

/// `GET /health` over loopback. Only the status code is load-bearing.
pub struct HttpHealthProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpHealthProbe {
    /// # Arguments
    /// * `url` - Full health URL, e.g. `http://127.0.0.1:13560/health`
    /// * `request_timeout` - Upper bound for one request, so a hung
    ///   connection still counts as a failed attempt
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> ReadinessResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(1)
            .build()
            .map_err(|source| ReadinessError::ClientBuild {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self, cancel: &CancelToken) -> ReadinessResult<()> {
        let request = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-store")
            .send();

        // Dropping the request future aborts the connection
        let response = tokio::select! {
            response = request => response?,
            _ = cancel.cancelled() => return Err(ReadinessError::aborted()),
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ReadinessError::status(status.as_u16()))
        }
    }
}
