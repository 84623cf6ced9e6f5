//! Core library for the `tempchart` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Geocoding, position and weather providers
//! - The resolve -> cache -> fetch pipeline and its chart state machine
//!
//! It is used by `tempchart-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod resolver;
pub mod state;

pub use cache::{CacheEntry, CacheKey, JsonFileStore, MemoryStore, SeriesCache, SeriesStore};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, GeolocationConfig, ProviderConfig};
pub use error::PipelineError;
pub use history::{HistoryRow, HistoryView, NavigationState};
pub use model::{Coordinates, DateRange, RangeSpec, TemperatureSeries, resolve_effective_range};
pub use pipeline::{ChartPage, Pipeline};
pub use provider::{Geocoder, PositionSource, ProviderId, SeriesFetcher};
pub use resolver::Resolver;
pub use state::{ChartEvent, ChartState, Phase, RequestToken, Resolution, SeriesOrigin, reduce};
