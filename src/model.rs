use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Event identifier as it appears in resource names.
///
/// The index may encode ids as JSON strings or integers; both normalise to
/// the same text so `7` and `"7"` address the same `event7.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => EventId(s),
            Raw::Signed(n) => EventId(n.to_string()),
            Raw::Unsigned(n) => EventId(n.to_string()),
        })
    }
}

/// Catalog metadata for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub event_id: EventId,
    pub title: String,
    pub date: String,
    /// Minutes since midnight, 0..=1439.
    pub tic: u16,
}

/// One row of a per-event dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    #[serde(default, rename = "eventid", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    /// Minute offset from the event time.
    pub dist: i64,
    #[serde(rename = "PrimarySector")]
    pub primary_sector: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cret30_median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cret30_perc_10: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cret30_perc_90: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cret45_median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cret45_perc_10: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cret45_perc_90: Option<f64>,
}

impl EventRow {
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Cret30Median => self.cret30_median,
            Column::Cret30Perc10 => self.cret30_perc_10,
            Column::Cret30Perc90 => self.cret30_perc_90,
            Column::Cret45Median => self.cret45_median,
            Column::Cret45Perc10 => self.cret45_perc_10,
            Column::Cret45Perc90 => self.cret45_perc_90,
        }
    }
}

/// Cumulative-return columns carried by an [`EventRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Cret30Median,
    Cret30Perc10,
    Cret30Perc90,
    Cret45Median,
    Cret45Perc10,
    Cret45Perc90,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Cret30Median => "cret30_median",
            Column::Cret30Perc10 => "cret30_perc_10",
            Column::Cret30Perc90 => "cret30_perc_90",
            Column::Cret45Median => "cret45_median",
            Column::Cret45Perc10 => "cret45_perc_10",
            Column::Cret45Perc90 => "cret45_perc_90",
        }
    }
}

/// Per-window distance bound and return columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub minutes: u32,
    /// Inclusive `[min, max]` bound on `dist`.
    pub dist_bound: (i64, i64),
    pub median: Column,
    pub perc_10: Column,
    pub perc_90: Column,
}

pub const WINDOWS: [WindowSpec; 2] = [
    WindowSpec {
        minutes: 30,
        dist_bound: (-10, 20),
        median: Column::Cret30Median,
        perc_10: Column::Cret30Perc10,
        perc_90: Column::Cret30Perc90,
    },
    WindowSpec {
        minutes: 45,
        dist_bound: (-15, 30),
        median: Column::Cret45Median,
        perc_10: Column::Cret45Perc10,
        perc_90: Column::Cret45Perc90,
    },
];

/// Looks up a supported window. Other windows have no bound and no columns.
pub fn window_spec(minutes: u32) -> Option<&'static WindowSpec> {
    WINDOWS.iter().find(|w| w.minutes == minutes)
}

/// Current user selection. `None` on sector/state means "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub event_id: Option<EventId>,
    pub window: u32,
    pub sector: Option<String>,
    pub state: Option<String>,
}

impl SelectionState {
    pub fn new(window: u32) -> Self {
        Self {
            event_id: None,
            window,
            sector: None,
            state: None,
        }
    }
}
