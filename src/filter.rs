use serde_json::json;

use crate::logging::{log, obj, Domain, Level};
use crate::model::{window_spec, EventRow};

/// Inclusive `dist` bound for a window, if it has one.
pub fn dist_bound(window: u32) -> Option<(i64, i64)> {
    window_spec(window).map(|w| w.dist_bound)
}

/// Applies the sector/state equality filters and the window's distance bound.
///
/// `None` leaves a dimension unfiltered. Order is preserved and the input is
/// left untouched; an empty result means "no data", not failure.
pub fn reduce(
    rows: &[EventRow],
    sector: Option<&str>,
    state: Option<&str>,
    window: u32,
) -> Vec<EventRow> {
    let bound = dist_bound(window);
    let out: Vec<EventRow> = rows
        .iter()
        .filter(|r| sector.map_or(true, |s| r.primary_sector == s))
        .filter(|r| state.map_or(true, |s| r.state == s))
        .filter(|r| bound.map_or(true, |(lo, hi)| (lo..=hi).contains(&r.dist)))
        .cloned()
        .collect();

    log(
        Level::Debug,
        Domain::Filter,
        "reduced",
        obj(&[
            ("input", json!(rows.len())),
            ("output", json!(out.len())),
            ("sector", json!(sector)),
            ("state", json!(state)),
            ("window", json!(window)),
        ]),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::row;

    fn sample() -> Vec<EventRow> {
        vec![
            row(-20, "S", "CA"),
            row(-15, "S", "CA"),
            row(-12, "T", "CA"),
            row(-10, "S", "TX"),
            row(0, "T", "TX"),
            row(20, "S", "NY"),
            row(30, "S", "CA"),
            row(31, "S", "CA"),
        ]
    }

    fn dists(rows: &[EventRow]) -> Vec<i64> {
        rows.iter().map(|r| r.dist).collect()
    }

    #[test]
    fn test_sector_and_window_45() {
        let out = reduce(&sample(), Some("S"), None, 45);
        assert_eq!(dists(&out), vec![-15, -10, 20, 30]);
        assert!(out.iter().all(|r| r.primary_sector == "S"));
    }

    #[test]
    fn test_window_30_bound() {
        let out = reduce(&sample(), None, None, 30);
        assert_eq!(dists(&out), vec![-10, 0, 20]);
    }

    #[test]
    fn test_unknown_window_keeps_everything() {
        let rows = sample();
        assert_eq!(reduce(&rows, None, None, 999), rows);
    }

    #[test]
    fn test_filters_are_anded() {
        let out = reduce(&sample(), Some("S"), Some("CA"), 999);
        assert_eq!(dists(&out), vec![-20, -15, 30, 31]);
        let out = reduce(&sample(), Some("T"), Some("NY"), 999);
        assert!(out.is_empty());
    }

    #[test]
    fn test_source_rows_untouched() {
        let rows = sample();
        let before = rows.clone();
        let _ = reduce(&rows, Some("S"), Some("TX"), 45);
        assert_eq!(rows, before);
    }

    #[test]
    fn test_dist_bound_lookup() {
        assert_eq!(dist_bound(45), Some((-15, 30)));
        assert_eq!(dist_bound(30), Some((-10, 20)));
        assert_eq!(dist_bound(60), None);
    }
}
