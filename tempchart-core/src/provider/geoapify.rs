use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{Coordinates, PipelineError, provider::truncate_body};

use super::Geocoder;

pub const DEFAULT_BASE_URL: &str = "https://api.geoapify.com";

#[derive(Debug, Clone)]
pub struct GeoapifyGeocoder {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GeoapifyGeocoder {
    pub fn with_client(http: Client, api_key: String, base_url: &str) -> Self {
        Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http }
    }
}

#[derive(Debug, Deserialize)]
struct GeoFeatureCollection {
    features: Vec<GeoFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoFeature {
    geometry: Option<GeoGeometry>,
}

/// GeoJSON point: `[longitude, latitude]`.
#[derive(Debug, Deserialize)]
struct GeoGeometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

impl GeoFeature {
    fn to_coordinates(&self) -> Result<Coordinates, PipelineError> {
        match self.geometry.as_ref().map(|g| g.coordinates.as_slice()) {
            Some([lon, lat, ..]) => Ok(Coordinates::new(*lat, *lon)),
            _ => Err(PipelineError::Upstream(
                "Geoapify feature is missing a [longitude, latitude] pair".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Geocoder for GeoapifyGeocoder {
    async fn search(&self, place: &str) -> Result<Vec<Coordinates>, PipelineError> {
        let url = format!("{}/v1/geocode/search", self.base_url);
        debug!(place, "geocoding lookup");

        let res = self
            .http
            .get(&url)
            .query(&[("text", place), ("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| PipelineError::upstream("Failed to send request to Geoapify", e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| PipelineError::upstream("Failed to read Geoapify response body", e))?;

        if !status.is_success() {
            return Err(PipelineError::Upstream(format!(
                "Geoapify geocoding request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: GeoFeatureCollection = serde_json::from_str(&body)
            .map_err(|e| PipelineError::upstream("Failed to parse Geoapify JSON", e))?;

        debug!(place, matches = parsed.features.len(), "geocoding finished");

        // Only the best match decides the outcome; broken runners-up are skipped.
        let mut features = parsed.features.iter();
        let Some(best) = features.next() else {
            return Ok(Vec::new());
        };
        let mut matches = vec![best.to_coordinates()?];
        matches.extend(features.filter_map(|f| f.to_coordinates().ok()));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feature(lon: f64, lat: f64) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "properties": { "formatted": "somewhere" },
            "geometry": { "type": "Point", "coordinates": [lon, lat] }
        })
    }

    #[tokio::test]
    async fn search_maps_lon_lat_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/geocode/search"))
            .and(query_param("text", "Lagos"))
            .and(query_param("apiKey", "GEO_KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "FeatureCollection",
                "features": [feature(3.39, 6.45), feature(-1.0, 50.0)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let geocoder = GeoapifyGeocoder::with_client(Client::new(), "GEO_KEY".into(), &server.uri());
        let matches = geocoder.search("Lagos").await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0], Coordinates::new(6.45, 3.39));
    }

    #[tokio::test]
    async fn empty_collection_is_no_matches() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/geocode/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "FeatureCollection",
                "features": []
            })))
            .mount(&server)
            .await;

        let geocoder = GeoapifyGeocoder::with_client(Client::new(), "KEY".into(), &server.uri());
        assert!(geocoder.search("Nowhere123").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_status_is_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/geocode/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid apiKey"))
            .mount(&server)
            .await;

        let geocoder = GeoapifyGeocoder::with_client(Client::new(), "BAD".into(), &server.uri());
        let err = geocoder.search("Lagos").await.unwrap_err();

        assert!(matches!(err, PipelineError::Upstream(_)));
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Invalid apiKey"));
    }

    #[tokio::test]
    async fn missing_features_field_is_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/geocode/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let geocoder = GeoapifyGeocoder::with_client(Client::new(), "KEY".into(), &server.uri());
        let err = geocoder.search("Lagos").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse Geoapify JSON"));
    }

    #[tokio::test]
    async fn broken_later_feature_does_not_hide_first_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/geocode/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "features": [
                    feature(3.39, 6.45),
                    { "geometry": { "coordinates": [] } },
                    { "properties": {} }
                ]
            })))
            .mount(&server)
            .await;

        let geocoder = GeoapifyGeocoder::with_client(Client::new(), "KEY".into(), &server.uri());
        let matches = geocoder.search("Lagos").await.unwrap();

        assert_eq!(matches, vec![Coordinates::new(6.45, 3.39)]);
    }

    #[tokio::test]
    async fn short_coordinate_pair_is_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/geocode/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "features": [{ "geometry": { "coordinates": [3.39] } }]
            })))
            .mount(&server)
            .await;

        let geocoder = GeoapifyGeocoder::with_client(Client::new(), "KEY".into(), &server.uri());
        let err = geocoder.search("Lagos").await.unwrap_err();
        assert!(matches!(err, PipelineError::Upstream(_)));
    }
}
