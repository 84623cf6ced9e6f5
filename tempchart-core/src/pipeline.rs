use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    CacheKey, ChartEvent, ChartState, Clock, Config, NavigationState, PipelineError, RangeSpec,
    RequestToken, Resolution, Resolver, SeriesCache, SeriesOrigin, SystemClock,
    provider::{self, SeriesFetcher},
    reduce, resolve_effective_range,
};

/// Resolver -> cache -> fetcher, one run per trigger.
#[derive(Debug)]
pub struct Pipeline {
    resolver: Resolver,
    cache: SeriesCache,
    fetcher: Box<dyn SeriesFetcher>,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    pub fn new(
        resolver: Resolver,
        cache: SeriesCache,
        fetcher: Box<dyn SeriesFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { resolver, cache, fetcher, clock }
    }

    /// HTTP providers and the on-disk cache, as configured.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = provider::http_client(config.request_timeout())?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let resolver = Resolver::new(
            provider::geocoder_from_config(config, http.clone())?,
            provider::position_source_from_config(config, http.clone()),
        );
        let fetcher = provider::fetcher_from_config(config, http)?;
        let cache = SeriesCache::from_config(config, clock.clone())?;

        Ok(Self::new(resolver, cache, fetcher, clock))
    }

    pub async fn run(&self, city: &str, range: &RangeSpec) -> Result<Resolution, PipelineError> {
        let coordinates = self.resolver.resolve_input(city).await?;
        let effective = resolve_effective_range(range, self.clock.today())?;
        let key = CacheKey::new(coordinates, range);

        if let Some(series) = self.cache.get(&key) {
            return Ok(Resolution {
                coordinates,
                range: effective,
                series,
                origin: SeriesOrigin::Cache,
            });
        }

        let series = self.fetcher.fetch_series(coordinates, effective).await?;
        info!(%key, points = series.len(), "series fetched");
        self.cache.put(&key, series.clone());

        Ok(Resolution { coordinates, range: effective, series, origin: SeriesOrigin::Network })
    }
}

/// Owns the chart state and drives the pipeline on every trigger.
#[derive(Debug)]
pub struct ChartPage {
    pipeline: Pipeline,
    state: ChartState,
}

impl ChartPage {
    pub fn new(pipeline: Pipeline, city: impl Into<String>, range: RangeSpec) -> Self {
        Self { pipeline, state: ChartState::new(city, range) }
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn dispatch(&mut self, event: ChartEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    /// Start a run and return its token.
    pub fn begin(&mut self) -> RequestToken {
        self.dispatch(ChartEvent::Triggered);
        self.state.latest_token()
    }

    pub fn complete(&mut self, token: RequestToken, outcome: Result<Resolution, PipelineError>) {
        self.dispatch(ChartEvent::Completed { token, outcome });
    }

    pub async fn mount(&mut self) -> &ChartState {
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> &ChartState {
        let token = self.begin();
        debug!(?token, city = %self.state.city, range = %self.state.range, "pipeline triggered");

        let outcome = self.pipeline.run(&self.state.city, &self.state.range).await;
        self.complete(token, outcome);
        &self.state
    }

    pub async fn set_city(&mut self, city: impl Into<String>) -> &ChartState {
        self.dispatch(ChartEvent::CityChanged(city.into()));
        self.refresh().await
    }

    pub async fn set_range(&mut self, range: RangeSpec) -> &ChartState {
        self.dispatch(ChartEvent::RangeChanged(range));
        self.refresh().await
    }

    /// Payload for the history view; `None` unless the last run succeeded.
    pub fn view_history(&self) -> Option<NavigationState> {
        self.state.navigation()
    }
}
