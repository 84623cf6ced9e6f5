//! Stub providers shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tempchart_core::{
    Coordinates, DateRange, FixedClock, Geocoder, Pipeline, PipelineError, PositionSource,
    Resolver, SeriesCache, SeriesFetcher, TemperatureSeries,
};

/// Counts calls so tests can assert a provider was (or was not) hit.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct StubGeocoder {
    pub places: HashMap<String, Coordinates>,
    pub calls: CallCounter,
}

impl StubGeocoder {
    pub fn with(places: &[(&str, Coordinates)]) -> Self {
        Self {
            places: places.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            calls: CallCounter::default(),
        }
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn search(&self, place: &str) -> Result<Vec<Coordinates>, PipelineError> {
        self.calls.hit();
        Ok(self.places.get(place).copied().into_iter().collect())
    }
}

#[derive(Debug)]
pub struct StubPosition {
    pub outcome: Result<Coordinates, PipelineError>,
    pub calls: CallCounter,
}

#[async_trait]
impl PositionSource for StubPosition {
    async fn current_position(&self) -> Result<Coordinates, PipelineError> {
        self.calls.hit();
        self.outcome.clone()
    }
}

/// Returns consecutive daily records starting at the range start.
#[derive(Debug)]
pub struct StubWeather {
    pub temps: Vec<Option<f64>>,
    pub calls: CallCounter,
}

#[async_trait]
impl SeriesFetcher for StubWeather {
    async fn fetch_series(
        &self,
        _coords: Coordinates,
        range: DateRange,
    ) -> Result<TemperatureSeries, PipelineError> {
        self.calls.hit();
        Ok(TemperatureSeries::from_points(
            self.temps
                .iter()
                .enumerate()
                .map(|(i, t)| (range.start() + chrono::Days::new(i as u64), *t)),
        ))
    }
}

pub struct Harness {
    pub pipeline: Pipeline,
    pub clock: Arc<FixedClock>,
    pub geocoder_calls: CallCounter,
    pub position_calls: CallCounter,
    pub weather_calls: CallCounter,
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
}

pub fn harness(
    places: &[(&str, Coordinates)],
    position: Result<Coordinates, PipelineError>,
    temps: Vec<Option<f64>>,
) -> Harness {
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap()));

    let geocoder = StubGeocoder::with(places);
    let geocoder_calls = geocoder.calls.clone();
    let position = StubPosition { outcome: position, calls: CallCounter::default() };
    let position_calls = position.calls.clone();
    let weather = StubWeather { temps, calls: CallCounter::default() };
    let weather_calls = weather.calls.clone();

    let pipeline = Pipeline::new(
        Resolver::new(Box::new(geocoder), Box::new(position)),
        SeriesCache::in_memory(clock.clone(), chrono::Duration::hours(24)),
        Box::new(weather),
        clock.clone(),
    );

    Harness { pipeline, clock, geocoder_calls, position_calls, weather_calls }
}

pub fn lagos() -> Coordinates {
    Coordinates::new(6.45, 3.39)
}

pub fn lagos_temps() -> Vec<Option<f64>> {
    [26.1, 26.4, 26.8, 27.0, 26.5, 26.2, 25.9].into_iter().map(Some).collect()
}
