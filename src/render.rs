use serde::Serialize;
use serde_json::json;
use std::sync::{Mutex, PoisonError};

use crate::model::EventId;
use crate::options::EventOptions;
use crate::series::BuiltChart;

/// Output side of the dashboard: the selectors and the chart area.
pub trait ChartRenderer: Send + Sync {
    fn show_events(&self, ids: &[EventId]);
    fn show_options(&self, event_id: &EventId, options: &EventOptions);
    fn render_chart(&self, chart: &BuiltChart);
    /// Replaces the chart with the "No data" placeholder.
    fn show_no_data(&self);
}

/// Prints one JSON document per view update on stdout.
#[derive(Debug, Default)]
pub struct StdoutRenderer;

impl ChartRenderer for StdoutRenderer {
    fn show_events(&self, ids: &[EventId]) {
        println!("{}", json!({ "view": "events", "options": ids }));
    }

    fn show_options(&self, event_id: &EventId, options: &EventOptions) {
        println!(
            "{}",
            json!({
                "view": "options",
                "event_id": event_id,
                "PrimarySector": options.sectors,
                "state": options.states,
            })
        );
    }

    fn render_chart(&self, chart: &BuiltChart) {
        println!(
            "{}",
            json!({
                "view": "chart",
                "figure": chart.spec.to_plotly(),
                "eventTime": chart.time_label,
            })
        );
    }

    fn show_no_data(&self) {
        println!("{}", json!({ "view": "chart", "placeholder": "No data" }));
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Frame {
    Events { ids: Vec<EventId> },
    Options { event_id: EventId, options: EventOptions },
    Chart { chart: BuiltChart },
    NoData,
}

/// Keeps every view update in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    frames: Mutex<Vec<Frame>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last_chart(&self) -> Option<BuiltChart> {
        self.frames().into_iter().rev().find_map(|f| match f {
            Frame::Chart { chart } => Some(chart),
            _ => None,
        })
    }

    /// Last frame that touched the chart area.
    pub fn chart_area(&self) -> Option<Frame> {
        self.frames()
            .into_iter()
            .rev()
            .find(|f| matches!(f, Frame::Chart { .. } | Frame::NoData))
    }

    pub fn last_options(&self) -> Option<(EventId, EventOptions)> {
        self.frames().into_iter().rev().find_map(|f| match f {
            Frame::Options { event_id, options } => Some((event_id, options)),
            _ => None,
        })
    }

    fn push(&self, frame: Frame) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame);
    }
}

impl ChartRenderer for RecordingRenderer {
    fn show_events(&self, ids: &[EventId]) {
        self.push(Frame::Events { ids: ids.to_vec() });
    }

    fn show_options(&self, event_id: &EventId, options: &EventOptions) {
        self.push(Frame::Options {
            event_id: event_id.clone(),
            options: options.clone(),
        });
    }

    fn render_chart(&self, chart: &BuiltChart) {
        self.push(Frame::Chart { chart: chart.clone() });
    }

    fn show_no_data(&self) {
        self.push(Frame::NoData);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::build_chart;
    use crate::testing::row;

    #[test]
    fn test_recording_keeps_order() {
        let r = RecordingRenderer::new();
        r.show_events(&[EventId::from("1")]);
        r.show_no_data();
        r.render_chart(&build_chart(&[row(0, "S", "CA")], 45, "t", "d", 0, 100));
        assert_eq!(r.frames().len(), 3);
        assert!(matches!(r.chart_area(), Some(Frame::Chart { .. })));
        assert_eq!(r.last_chart().unwrap().data.len(), 1);
    }

    #[test]
    fn test_frame_serializes_with_view_tag() {
        let v = serde_json::to_value(Frame::NoData).unwrap();
        assert_eq!(v["view"], "no_data");
    }
}
