use tracing::debug;

use crate::{
    Coordinates, PipelineError,
    provider::{Geocoder, PositionSource},
};

/// Turns a place name, or the current position, into coordinates.
#[derive(Debug)]
pub struct Resolver {
    geocoder: Box<dyn Geocoder>,
    position: Box<dyn PositionSource>,
}

impl Resolver {
    pub fn new(geocoder: Box<dyn Geocoder>, position: Box<dyn PositionSource>) -> Self {
        Self { geocoder, position }
    }

    /// Geocode `place`. The first match wins; there is no disambiguation.
    pub async fn resolve(&self, place: &str) -> Result<Coordinates, PipelineError> {
        let place = place.trim();
        if place.is_empty() {
            return Err(PipelineError::InvalidInput("Please enter a city".to_string()));
        }

        let matches = self.geocoder.search(place).await?;
        let first = matches
            .first()
            .copied()
            .ok_or_else(|| PipelineError::NotFound(format!("City not found: {place}")))?;

        debug!(place, coords = %first, candidates = matches.len(), "place resolved");
        Ok(first)
    }

    pub async fn resolve_current_position(&self) -> Result<Coordinates, PipelineError> {
        let coords = self.position.current_position().await?;
        debug!(%coords, "current position resolved");
        Ok(coords)
    }

    /// Blank `city` means "where I am"; anything else is geocoded.
    pub async fn resolve_input(&self, city: &str) -> Result<Coordinates, PipelineError> {
        if city.trim().is_empty() {
            self.resolve_current_position().await
        } else {
            self.resolve(city).await
        }
    }
}
