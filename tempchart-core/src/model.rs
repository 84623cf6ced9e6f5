use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::PipelineError;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Inclusive calendar date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PipelineError> {
        if start > end {
            return Err(PipelineError::InvalidInput(format!(
                "Please select a valid date range: start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// What the user asked for: a trailing day count or explicit bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeSpec {
    LastDays(u32),
    Explicit { start: NaiveDate, end: NaiveDate },
}

impl RangeSpec {
    /// Day counts offered by the interactive selector.
    pub const DAY_COUNT_CHOICES: [u32; 3] = [7, 14, 30];

    pub const DEFAULT_DAY_COUNT: u32 = 7;
}

impl Default for RangeSpec {
    fn default() -> Self {
        RangeSpec::LastDays(Self::DEFAULT_DAY_COUNT)
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeSpec::LastDays(n) => write!(f, "last {n} days"),
            RangeSpec::Explicit { start, end } => write!(f, "{start} to {end}"),
        }
    }
}

/// Turn a [`RangeSpec`] into concrete dates.
///
/// `LastDays(n)` spans from `today - n days` up to and including `today`.
pub fn resolve_effective_range(
    spec: &RangeSpec,
    today: NaiveDate,
) -> Result<DateRange, PipelineError> {
    match *spec {
        RangeSpec::LastDays(0) => Err(PipelineError::InvalidInput(
            "Please select a valid date range: day count must be at least 1".to_string(),
        )),
        RangeSpec::LastDays(n) => {
            let start = today.checked_sub_days(Days::new(u64::from(n))).ok_or_else(|| {
                PipelineError::InvalidInput(format!(
                    "Please select a valid date range: {n} days before {today} is out of range"
                ))
            })?;
            DateRange::new(start, today)
        }
        RangeSpec::Explicit { start, end } => DateRange::new(start, end),
    }
}

/// Index-aligned daily average temperatures in °C.
///
/// `labels[i]` is the date of `values[i]`; a `None` value marks a day the
/// provider reported without an average.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct TemperatureSeries {
    labels: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct RawSeries {
    labels: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl TryFrom<RawSeries> for TemperatureSeries {
    type Error = PipelineError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        TemperatureSeries::new(raw.labels, raw.values)
    }
}

impl TemperatureSeries {
    pub fn new(labels: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Result<Self, PipelineError> {
        if labels.len() != values.len() {
            return Err(PipelineError::InvalidInput(format!(
                "Series has {} labels but {} values",
                labels.len(),
                values.len()
            )));
        }
        Ok(Self { labels, values })
    }

    pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, Option<f64>)>) -> Self {
        let (labels, values) = points.into_iter().unzip();
        Self { labels, values }
    }

    pub fn labels(&self) -> &[NaiveDate] {
        &self.labels
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
