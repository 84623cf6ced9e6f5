use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{Coordinates, PipelineError, provider::truncate_body};

use super::PositionSource;

pub const IP_API_URL: &str = "http://ip-api.com/json";

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpApiPositionSource {
    url: String,
    http: Client,
}

impl IpApiPositionSource {
    pub fn with_client(http: Client, url: &str) -> Self {
        Self { url: url.to_string(), http }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[async_trait]
impl PositionSource for IpApiPositionSource {
    async fn current_position(&self) -> Result<Coordinates, PipelineError> {
        debug!(url = %self.url, "looking up current position");

        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PipelineError::upstream("Failed to send position lookup request", e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| PipelineError::upstream("Failed to read position lookup body", e))?;

        if !status.is_success() {
            return Err(PipelineError::Upstream(format!(
                "Position lookup failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: IpApiResponse = serde_json::from_str(&body)
            .map_err(|e| PipelineError::upstream("Failed to parse position lookup JSON", e))?;

        match (parsed.status.as_str(), parsed.lat, parsed.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            ("success", _, _) => Err(PipelineError::Upstream(
                "Position lookup succeeded without coordinates".to_string(),
            )),
            _ => Err(PipelineError::Unsupported(format!(
                "Current position is not available ({}). Enter a city instead.",
                parsed.message.as_deref().unwrap_or("unknown reason")
            ))),
        }
    }
}

/// A position pinned in the configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, PipelineError> {
        Ok(self.0)
    }
}

/// Location access switched off by the user.
#[derive(Debug, Clone, Copy)]
pub struct DeniedPosition;

#[async_trait]
impl PositionSource for DeniedPosition {
    async fn current_position(&self) -> Result<Coordinates, PipelineError> {
        Err(PipelineError::PermissionDenied(
            "Location permission denied. Enter a city instead.".to_string(),
        ))
    }
}
