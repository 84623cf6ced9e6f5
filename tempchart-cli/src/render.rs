use ratatui::{
    buffer::Buffer,
    layout::Rect,
    symbols::Marker,
    text::Span,
    widgets::{Axis, Chart, Dataset, GraphType, Widget},
};
use tempchart_core::{ChartState, HistoryView, Phase, SeriesOrigin, TemperatureSeries};

pub const LOADING: &str = "Loading...";

const CHART_WIDTH: u16 = 64;
const CHART_HEIGHT: u16 = 12;

/// The chart page: loading indicator, error message, or title plus chart.
pub fn chart_view(state: &ChartState) -> String {
    let resolution = match (state.phase(), &state.resolution) {
        (Phase::Loading, _) => return LOADING.to_string(),
        (Phase::Error, _) => {
            return format!("Error: {}", state.error.as_deref().unwrap_or("unknown error"));
        }
        (Phase::Success, Some(resolution)) => resolution,
        _ => return "No data available. Please enter a city.".to_string(),
    };

    let place = match state.city.trim() {
        "" => format!("your location ({})", resolution.coordinates),
        city => city.to_string(),
    };

    let mut out = format!("Temperature Data for {place} ({})", resolution.range);
    if resolution.origin == SeriesOrigin::Cache {
        out.push_str(" [cached]");
    }
    out.push('\n');
    out.push_str(&line_chart(&resolution.series));
    out
}

/// Braille line chart of the series, x = day index, y = °C.
///
/// Days without a reading are left out of the dataset.
pub fn line_chart(series: &TemperatureSeries) -> String {
    let points: Vec<(f64, f64)> = series
        .values()
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|t| (i as f64, t)))
        .collect();
    if points.is_empty() {
        return "No temperature readings in this range.".to_string();
    }

    let min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let (low, high) = if max - min < f64::EPSILON { (min - 1.0, max + 1.0) } else { (min, max) };
    let last_x = series.len().saturating_sub(1).max(1) as f64;

    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .x_axis(Axis::default().bounds([0.0, last_x]))
        .y_axis(Axis::default().bounds([low, high]).labels(vec![
            Span::raw(format!("{low:.1}°C")),
            Span::raw(format!("{high:.1}°C")),
        ]));

    let area = Rect::new(0, 0, CHART_WIDTH, CHART_HEIGHT);
    let mut buf = Buffer::empty(area);
    chart.render(area, &mut buf);

    let mut out = buffer_lines(&buf, area.width);
    if let (Some(first), Some(last)) = (series.labels().first(), series.labels().last()) {
        out.push_str(&format!("{first} .. {last}"));
    }
    out
}

fn buffer_lines(buf: &Buffer, width: u16) -> String {
    buf.content()
        .chunks(usize::from(width))
        .map(|row| {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            format!("{}\n", line.trim_end())
        })
        .collect()
}

/// The history page: one row per day, or an explicit empty message.
pub fn history_view(view: &HistoryView) -> String {
    let mut out = String::from("Past Temperature Data\n");
    match view {
        HistoryView::Empty => out.push_str("No data available"),
        HistoryView::Rows(rows) => {
            let lines: Vec<String> = rows
                .iter()
                .map(|row| {
                    let temp = row
                        .temperature_c
                        .map(|t| format!("{t:.1}°C"))
                        .unwrap_or_else(|| "n/a".to_string());
                    format!("Date: {} - Temperature: {temp}", row.date)
                })
                .collect();
            out.push_str(&lines.join("\n"));
        }
    }
    out
}
