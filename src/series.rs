//! Turns filtered rows into a renderable band chart.
//!
//! The chart has two series: a closed polygon spanning the 10th–90th
//! percentile envelope and the median line on top of it. Values a row does
//! not carry for the selected window are kept as NaN so the four arrays stay
//! aligned; they serialize as `null`, which the renderer draws as a gap.

use serde::Serialize;
use serde_json::{json, Value};

use crate::model::{window_spec, Column, EventRow};

pub const X_AXIS_TITLE: &str = "Minutes to the Event";
pub const Y_AXIS_TITLE: &str = "Cumulative Returns (%, annualized)";
pub const BAND_NAME: &str = "10%-90% Range";
pub const MEDIAN_NAME: &str = "Median";
/// Line break understood by the chart renderer's title markup.
pub const LINE_BREAK: &str = "<br>";

/// Parallel plotting arrays, one entry per row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesData {
    pub dist: Vec<i64>,
    pub median: Vec<f64>,
    pub perc10: Vec<f64>,
    pub perc90: Vec<f64>,
}

impl SeriesData {
    pub fn len(&self) -> usize {
        self.dist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dist.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Series {
    Band {
        name: String,
        x: Vec<i64>,
        y: Vec<f64>,
        fill_color: String,
    },
    Line {
        name: String,
        x: Vec<i64>,
        y: Vec<f64>,
        color: String,
    },
}

impl Series {
    pub fn points(&self) -> usize {
        match self {
            Series::Band { x, .. } | Series::Line { x, .. } => x.len(),
        }
    }

    fn to_plotly(&self) -> Value {
        match self {
            Series::Band { name, x, y, fill_color } => json!({
                "x": x,
                "y": y,
                "fill": "toself",
                "fillcolor": fill_color,
                "line": { "color": "transparent" },
                "name": name,
            }),
            Series::Line { name, x, y, color } => json!({
                "x": x,
                "y": y,
                "mode": "lines",
                "name": name,
                "line": { "color": color },
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub series: Vec<Series>,
}

impl ChartSpec {
    /// Plotly-style `{data, layout}` document.
    pub fn to_plotly(&self) -> Value {
        json!({
            "data": self.series.iter().map(Series::to_plotly).collect::<Vec<_>>(),
            "layout": {
                "title": self.title,
                "xaxis": { "title": self.x_axis_title },
                "yaxis": { "title": self.y_axis_title },
            },
        })
    }
}

/// Chart plus the event time label shown beside it.
#[derive(Debug, Clone, Serialize)]
pub struct BuiltChart {
    pub spec: ChartSpec,
    pub time_label: String,
    pub data: SeriesData,
}

/// Reads dist and the window's return columns from each row, in order.
pub fn extract_series(rows: &[EventRow], window: u32) -> SeriesData {
    let spec = window_spec(window);
    let read = |row: &EventRow, column: Option<Column>| {
        column.and_then(|c| row.value(c)).unwrap_or(f64::NAN)
    };

    let mut out = SeriesData::default();
    for row in rows {
        out.dist.push(row.dist);
        out.median.push(read(row, spec.map(|w| w.median)));
        out.perc10.push(read(row, spec.map(|w| w.perc_10)));
        out.perc90.push(read(row, spec.map(|w| w.perc_90)));
    }
    out
}

/// Closed envelope: x runs forward then back, y runs up the 90th then down
/// the 10th percentile.
pub fn band_series(data: &SeriesData) -> Series {
    let x = data
        .dist
        .iter()
        .chain(data.dist.iter().rev())
        .copied()
        .collect();
    let y = data
        .perc90
        .iter()
        .chain(data.perc10.iter().rev())
        .copied()
        .collect();
    Series::Band {
        name: BAND_NAME.to_string(),
        x,
        y,
        fill_color: "lightgrey".to_string(),
    }
}

pub fn median_series(data: &SeriesData) -> Series {
    Series::Line {
        name: MEDIAN_NAME.to_string(),
        x: data.dist.clone(),
        y: data.median.clone(),
        color: "blue".to_string(),
    }
}

/// Greedy word wrap. Breaks only between words; a word longer than
/// `max_chars` sits alone on its line.
pub fn wrap_title(title: &str, max_chars: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in title.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join(LINE_BREAK)
}

/// `H:MM` from minutes since midnight; the hour is not padded.
pub fn format_event_time(tic: u16) -> String {
    let hour = tic / 60;
    let minute = tic - hour * 60;
    format!("{}:{:02}", hour, minute)
}

pub fn time_label(date: &str, tic: u16) -> String {
    format!("Date: {}, Time: {}", date, format_event_time(tic))
}

pub fn build_chart(
    rows: &[EventRow],
    window: u32,
    title: &str,
    date: &str,
    tic: u16,
    wrap_at: usize,
) -> BuiltChart {
    let data = extract_series(rows, window);
    let series = if data.is_empty() {
        Vec::new()
    } else {
        vec![band_series(&data), median_series(&data)]
    };
    BuiltChart {
        spec: ChartSpec {
            title: wrap_title(title, wrap_at),
            x_axis_title: X_AXIS_TITLE.to_string(),
            y_axis_title: Y_AXIS_TITLE.to_string(),
            series,
        },
        time_label: time_label(date, tic),
        data,
    }
}
