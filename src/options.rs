use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;

use crate::cache::EventDataCache;
use crate::error::DataError;
use crate::logging::{log, obj, v_list, v_str, Domain, Level};
use crate::model::{EventId, EventRow};

/// Secondary dropdown values for one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventOptions {
    pub sectors: Vec<String>,
    pub states: Vec<String>,
}

/// Resolves the sector and state option lists for `id`.
///
/// Always reads the event's full row set through the cache, fetching it on
/// first use, so the lists never depend on an active filter.
pub async fn resolve_options(
    cache: &EventDataCache,
    id: &EventId,
) -> Result<EventOptions, DataError> {
    let rows = cache.get(id).await?;
    let options = distinct_options(&rows);
    log(
        Level::Info,
        Domain::Options,
        "resolved",
        obj(&[
            ("event_id", v_str(id.as_str())),
            ("rows", json!(rows.len())),
            ("sectors", v_list(&options.sectors)),
            ("states", v_list(&options.states)),
        ]),
    );
    Ok(options)
}

/// Distinct sectors and states in first-seen order.
pub fn distinct_options(rows: &[EventRow]) -> EventOptions {
    let mut seen_sectors = HashSet::new();
    let mut seen_states = HashSet::new();
    let mut options = EventOptions::default();
    for row in rows {
        if seen_sectors.insert(row.primary_sector.as_str()) {
            options.sectors.push(row.primary_sector.clone());
        }
        if seen_states.insert(row.state.as_str()) {
            options.states.push(row.state.clone());
        }
    }
    options
}
