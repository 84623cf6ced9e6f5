use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{Coordinates, DateRange, PipelineError, TemperatureSeries, provider::truncate_body};

use super::SeriesFetcher;

pub const DEFAULT_BASE_URL: &str = "https://meteostat.p.rapidapi.com";
pub const RAPIDAPI_HOST: &str = "meteostat.p.rapidapi.com";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Meteostat point data served through RapidAPI.
#[derive(Debug, Clone)]
pub struct MeteostatFetcher {
    api_key: String,
    base_url: String,
    http: Client,
}

impl MeteostatFetcher {
    pub fn with_client(http: Client, api_key: String, base_url: &str) -> Self {
        Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http }
    }
}

#[derive(Debug, Deserialize)]
struct MsDailyResponse {
    data: Option<Vec<MsDailyRecord>>,
}

#[derive(Debug, Deserialize)]
struct MsDailyRecord {
    date: Option<String>,
    #[serde(default)]
    tavg: Option<f64>,
}

impl MsDailyRecord {
    fn into_point(self) -> Result<(NaiveDate, Option<f64>), PipelineError> {
        let raw = self.date.ok_or_else(|| {
            PipelineError::Upstream("Meteostat daily record is missing its date".to_string())
        })?;

        // Daily rows are plain dates, but tolerate a trailing time component.
        let day = raw.get(..10).unwrap_or(&raw);
        let date = NaiveDate::parse_from_str(day, DATE_FORMAT).map_err(|e| {
            PipelineError::Upstream(format!("Meteostat returned an invalid date '{raw}': {e}"))
        })?;

        Ok((date, self.tavg))
    }
}

#[async_trait]
impl SeriesFetcher for MeteostatFetcher {
    async fn fetch_series(
        &self,
        coords: Coordinates,
        range: DateRange,
    ) -> Result<TemperatureSeries, PipelineError> {
        let url = format!("{}/point/daily", self.base_url);
        debug!(%coords, %range, "fetching daily series");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("start", range.start().format(DATE_FORMAT).to_string()),
                ("end", range.end().format(DATE_FORMAT).to_string()),
            ])
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .send()
            .await
            .map_err(|e| PipelineError::upstream("Failed to send request to Meteostat", e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| PipelineError::upstream("Failed to read Meteostat response body", e))?;

        if !status.is_success() {
            return Err(PipelineError::Upstream(format!(
                "Meteostat daily request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: MsDailyResponse = serde_json::from_str(&body)
            .map_err(|e| PipelineError::upstream("Failed to parse Meteostat JSON", e))?;

        let records = parsed.data.ok_or_else(|| {
            PipelineError::Upstream("Meteostat response contained no data field".to_string())
        })?;

        let points = records
            .into_iter()
            .map(MsDailyRecord::into_point)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(points = points.len(), "daily series fetched");
        Ok(TemperatureSeries::from_points(points))
    }
}
