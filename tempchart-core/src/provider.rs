use crate::{
    Config, Coordinates, DateRange, PipelineError, TemperatureSeries,
    config::GeolocationConfig,
    provider::{
        geoapify::GeoapifyGeocoder,
        meteostat::MeteostatFetcher,
        position::{DeniedPosition, FixedPosition, IpApiPositionSource},
    },
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod geoapify;
pub mod meteostat;
pub mod position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Geoapify,
    Meteostat,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Geoapify => "geoapify",
            ProviderId::Meteostat => "meteostat",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Geoapify, ProviderId::Meteostat]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "geoapify" => Ok(ProviderId::Geoapify),
            "meteostat" => Ok(ProviderId::Meteostat),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: geoapify, meteostat."
            )),
        }
    }
}

/// Forward geocoding: place name to candidate coordinates, best match first.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn search(&self, place: &str) -> Result<Vec<Coordinates>, PipelineError>;
}

/// The host's notion of "where am I".
#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, PipelineError>;
}

/// Daily average temperatures for a point and a date range.
#[async_trait]
pub trait SeriesFetcher: Send + Sync + Debug {
    async fn fetch_series(
        &self,
        coords: Coordinates,
        range: DateRange,
    ) -> Result<TemperatureSeries, PipelineError>;
}

/// Shared HTTP client with the configured request timeout.
pub fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("tempchart/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

pub fn geocoder_from_config(config: &Config, http: Client) -> anyhow::Result<Box<dyn Geocoder>> {
    let id = ProviderId::Geoapify;
    let api_key = config.require_api_key(id)?;
    let base_url = config.provider_base_url(id).unwrap_or(geoapify::DEFAULT_BASE_URL);

    Ok(Box::new(GeoapifyGeocoder::with_client(http, api_key.to_owned(), base_url)))
}

pub fn fetcher_from_config(config: &Config, http: Client) -> anyhow::Result<Box<dyn SeriesFetcher>> {
    let id = ProviderId::Meteostat;
    let api_key = config.require_api_key(id)?;
    let base_url = config.provider_base_url(id).unwrap_or(meteostat::DEFAULT_BASE_URL);

    Ok(Box::new(MeteostatFetcher::with_client(http, api_key.to_owned(), base_url)))
}

pub fn position_source_from_config(config: &Config, http: Client) -> Box<dyn PositionSource> {
    match config.geolocation {
        GeolocationConfig::Ip => Box::new(IpApiPositionSource::with_client(
            http,
            position::IP_API_URL,
        )),
        GeolocationConfig::Fixed { latitude, longitude } => {
            Box::new(FixedPosition(Coordinates::new(latitude, longitude)))
        }
        GeolocationConfig::Off => Box::new(DeniedPosition),
    }
}

/// Upstream bodies can be whole HTML error pages; keep messages readable.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
