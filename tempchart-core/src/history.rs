use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::TemperatureSeries;

/// What the chart view hands to the history view.
///
/// Only built from a [`TemperatureSeries`], so labels and values always
/// pair up one to one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationState {
    series: TemperatureSeries,
}

impl NavigationState {
    pub fn labels(&self) -> &[NaiveDate] {
        self.series.labels()
    }

    pub fn values(&self) -> &[Option<f64>] {
        self.series.values()
    }
}

impl From<&TemperatureSeries> for NavigationState {
    fn from(series: &TemperatureSeries) -> Self {
        Self { series: series.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub temperature_c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryView {
    Empty,
    Rows(Vec<HistoryRow>),
}

impl HistoryView {
    /// Absent navigation state is the same as an empty one.
    pub fn from_navigation(state: Option<&NavigationState>) -> Self {
        let Some(state) = state else {
            return HistoryView::Empty;
        };

        if state.series.is_empty() {
            return HistoryView::Empty;
        }

        let rows = state
            .labels()
            .iter()
            .zip(state.values())
            .map(|(date, value)| HistoryRow { date: *date, temperature_c: *value })
            .collect();

        HistoryView::Rows(rows)
    }
}
