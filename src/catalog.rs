use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::error::DataError;
use crate::logging::{log, obj, v_list, Domain, Level};
use crate::model::{EventId, EventSummary};
use crate::source::{DataSource, CATALOG_RESOURCE};

pub const MINUTES_PER_DAY: i64 = 1440;

/// One record of `event_ids.json`. The index repeats an event once per
/// underlying data row, so records are not unique by id.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCatalogRecord {
    pub eventid: EventId,
    pub title: String,
    pub date: String,
    pub tic: i64,
}

/// Deduplicated event index with id-keyed metadata lookups.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    ids: Vec<EventId>,
    titles: HashMap<EventId, String>,
    dates: HashMap<EventId, String>,
    tics: HashMap<EventId, u16>,
}

impl EventCatalog {
    pub async fn load(source: &dyn DataSource) -> Result<Self, DataError> {
        let records = source.fetch_catalog().await?;
        let raw_count = records.len();
        let catalog = Self::from_records(records)?;
        log(
            Level::Info,
            Domain::Catalog,
            "loaded",
            obj(&[
                ("records", json!(raw_count)),
                ("events", json!(catalog.len())),
                ("event_ids", v_list(&catalog.ids.iter().map(EventId::as_str).collect::<Vec<_>>())),
            ]),
        );
        Ok(catalog)
    }

    /// Keeps the first occurrence of each id, in first-seen order.
    pub fn from_records(records: Vec<RawCatalogRecord>) -> Result<Self, DataError> {
        let mut catalog = Self::default();
        for (idx, rec) in records.into_iter().enumerate() {
            if !(0..MINUTES_PER_DAY).contains(&rec.tic) {
                return Err(DataError::parse(
                    CATALOG_RESOURCE,
                    format!("record {}: tic {} outside 0..{}", idx, rec.tic, MINUTES_PER_DAY),
                ));
            }
            if catalog.titles.contains_key(&rec.eventid) {
                continue;
            }
            catalog.ids.push(rec.eventid.clone());
            catalog.titles.insert(rec.eventid.clone(), rec.title);
            catalog.dates.insert(rec.eventid.clone(), rec.date);
            catalog.tics.insert(rec.eventid, rec.tic as u16);
        }
        Ok(catalog)
    }

    pub fn ids(&self) -> &[EventId] {
        &self.ids
    }

    pub fn first(&self) -> Option<&EventId> {
        self.ids.first()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.titles.contains_key(id)
    }

    pub fn title(&self, id: &EventId) -> Option<&str> {
        self.titles.get(id).map(String::as_str)
    }

    pub fn date(&self, id: &EventId) -> Option<&str> {
        self.dates.get(id).map(String::as_str)
    }

    pub fn tic(&self, id: &EventId) -> Option<u16> {
        self.tics.get(id).copied()
    }

    pub fn summary(&self, id: &EventId) -> Option<EventSummary> {
        Some(EventSummary {
            event_id: id.clone(),
            title: self.title(id)?.to_string(),
            date: self.date(id)?.to_string(),
            tic: self.tic(id)?,
        })
    }
}
