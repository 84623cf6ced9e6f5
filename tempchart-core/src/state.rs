//! Chart view state machine.
//!
//! `Idle -> Loading -> {Success, Error}`, re-entering `Loading` on every
//! trigger. State only changes through [`reduce`]. Each trigger gets a
//! fresh [`RequestToken`]; a completion carrying any other token than the
//! latest one is dropped, so a slow earlier request can never overwrite a
//! newer result.

use tracing::debug;

use crate::{
    Coordinates, DateRange, NavigationState, PipelineError, RangeSpec, TemperatureSeries,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(u64);

impl RequestToken {
    fn next(self) -> Self {
        RequestToken(self.0 + 1)
    }
}

/// Where a successful series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOrigin {
    Cache,
    Network,
}

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub coordinates: Coordinates,
    pub range: DateRange,
    pub series: TemperatureSeries,
    pub origin: SeriesOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartState {
    pub city: String,
    pub range: RangeSpec,
    pub is_loading: bool,
    pub error: Option<String>,
    pub resolution: Option<Resolution>,
    latest_token: RequestToken,
}

impl ChartState {
    pub fn new(city: impl Into<String>, range: RangeSpec) -> Self {
        Self { city: city.into(), range, ..Self::default() }
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else if self.resolution.is_some() {
            Phase::Success
        } else {
            Phase::Idle
        }
    }

    pub fn latest_token(&self) -> RequestToken {
        self.latest_token
    }

    pub fn series(&self) -> Option<&TemperatureSeries> {
        self.resolution.as_ref().map(|r| &r.series)
    }

    /// Navigation payload for the history view; only present on success.
    pub fn navigation(&self) -> Option<NavigationState> {
        match self.phase() {
            Phase::Success => self.series().map(NavigationState::from),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    CityChanged(String),
    RangeChanged(RangeSpec),
    /// A new pipeline run starts; issues the next token.
    Triggered,
    Completed {
        token: RequestToken,
        outcome: Result<Resolution, PipelineError>,
    },
}

pub fn reduce(mut state: ChartState, event: ChartEvent) -> ChartState {
    match event {
        ChartEvent::CityChanged(city) => {
            state.city = city;
        }
        ChartEvent::RangeChanged(range) => {
            state.range = range;
        }
        ChartEvent::Triggered => {
            state.latest_token = state.latest_token.next();
            state.is_loading = true;
            state.error = None;
        }
        ChartEvent::Completed { token, outcome } => {
            if token != state.latest_token {
                debug!(?token, latest = ?state.latest_token, "discarding stale completion");
                return state;
            }

            state.is_loading = false;
            match outcome {
                Ok(resolution) => {
                    state.error = None;
                    state.resolution = Some(resolution);
                }
                Err(err) => {
                    state.error = Some(err.to_string());
                    state.resolution = None;
                }
            }
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn resolution(value: f64) -> Resolution {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Resolution {
            coordinates: Coordinates::new(6.45, 3.39),
            range: DateRange::new(day, day).unwrap(),
            series: TemperatureSeries::from_points([(day, Some(value))]),
            origin: SeriesOrigin::Network,
        }
    }

    fn trigger(state: ChartState) -> (ChartState, RequestToken) {
        let state = reduce(state, ChartEvent::Triggered);
        let token = state.latest_token();
        (state, token)
    }

    #[test]
    fn new_state_is_idle() {
        let state = ChartState::new("Lagos", RangeSpec::LastDays(7));
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.navigation().is_none());
    }

    #[test]
    fn trigger_enters_loading_and_clears_error() {
        let state = ChartState { error: Some("old".into()), ..ChartState::default() };

        let (state, token) = trigger(state);

        assert_eq!(state.phase(), Phase::Loading);
        assert!(state.error.is_none());
        assert!(token > RequestToken::default());
    }

    #[test]
    fn completion_success() {
        let (state, token) = trigger(ChartState::default());

        let state = reduce(state, ChartEvent::Completed { token, outcome: Ok(resolution(25.0)) });

        assert_eq!(state.phase(), Phase::Success);
        assert!(!state.is_loading);
        assert_eq!(state.navigation().unwrap().values(), &[Some(25.0)]);
    }

    #[test]
    fn completion_error_clears_series() {
        let (state, token) = trigger(ChartState::default());
        let state = reduce(state, ChartEvent::Completed { token, outcome: Ok(resolution(1.0)) });

        let (state, token) = trigger(state);
        let state = reduce(
            state,
            ChartEvent::Completed {
                token,
                outcome: Err(PipelineError::NotFound("City not found: Nowhere123".into())),
            },
        );

        assert_eq!(state.phase(), Phase::Error);
        assert_eq!(state.error.as_deref(), Some("City not found: Nowhere123"));
        assert!(state.series().is_none());
        assert!(state.navigation().is_none());
    }

    #[test]
    fn stale_completion_is_discarded() {
        let (state, first) = trigger(ChartState::default());
        let (state, second) = trigger(state);

        let state =
            reduce(state, ChartEvent::Completed { token: second, outcome: Ok(resolution(2.0)) });
        let state =
            reduce(state, ChartEvent::Completed { token: first, outcome: Ok(resolution(1.0)) });

        assert_eq!(state.phase(), Phase::Success);
        assert_eq!(state.series().unwrap().values(), &[Some(2.0)]);
    }

    #[test]
    fn stale_completion_does_not_end_loading() {
        let (state, first) = trigger(ChartState::default());
        let (state, _second) = trigger(state);

        let state = reduce(
            state,
            ChartEvent::Completed {
                token: first,
                outcome: Err(PipelineError::Upstream("boom".into())),
            },
        );

        assert_eq!(state.phase(), Phase::Loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn input_changes_do_not_trigger() {
        let state = reduce(ChartState::default(), ChartEvent::CityChanged("Oslo".into()));
        let state = reduce(state, ChartEvent::RangeChanged(RangeSpec::LastDays(30)));

        assert_eq!(state.city, "Oslo");
        assert_eq!(state.range, RangeSpec::LastDays(30));
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.latest_token(), RequestToken::default());
    }
}
