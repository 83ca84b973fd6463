//! In-memory data source for unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::catalog::RawCatalogRecord;
use crate::error::DataError;
use crate::model::{EventId, EventRow};
use crate::source::{event_resource, DataSource, CATALOG_RESOURCE};

pub fn row(dist: i64, sector: &str, state: &str) -> EventRow {
    EventRow {
        event_id: None,
        dist,
        primary_sector: sector.to_string(),
        state: state.to_string(),
        cret30_median: Some(dist as f64 * 0.1),
        cret30_perc_10: Some(dist as f64 * 0.1 - 1.0),
        cret30_perc_90: Some(dist as f64 * 0.1 + 1.0),
        cret45_median: Some(dist as f64),
        cret45_perc_10: Some(dist as f64 - 2.0),
        cret45_perc_90: Some(dist as f64 + 2.0),
    }
}

#[derive(Default)]
pub struct MemorySource {
    catalog: Vec<RawCatalogRecord>,
    events: HashMap<EventId, Vec<EventRow>>,
    delays: HashMap<EventId, Duration>,
    failing: Mutex<HashSet<EventId>>,
    catalog_fails: bool,
    fetches: Mutex<HashMap<EventId, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers rows and a catalog entry titled `Event {id}` at tic 570.
    pub fn with_event(mut self, id: &str, rows: Vec<EventRow>) -> Self {
        let id = EventId::from(id);
        self.catalog.push(RawCatalogRecord {
            eventid: id.clone(),
            title: format!("Event {}", id),
            date: "2021-06-16".to_string(),
            tic: 570,
        });
        self.events.insert(id, rows);
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(EventId::from(id), delay);
        self
    }

    pub fn with_failing_catalog(mut self) -> Self {
        self.catalog_fails = true;
        self
    }

    pub fn fail(&self, id: &EventId, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(id.clone());
        } else {
            set.remove(id);
        }
    }

    pub fn fetch_count(&self, id: &EventId) -> usize {
        self.fetches.lock().unwrap().get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_catalog(&self) -> Result<Vec<RawCatalogRecord>, DataError> {
        tokio::task::yield_now().await;
        if self.catalog_fails {
            return Err(DataError::network(CATALOG_RESOURCE, "HTTP 503 Service Unavailable"));
        }
        Ok(self.catalog.clone())
    }

    async fn fetch_event(&self, id: &EventId) -> Result<Vec<EventRow>, DataError> {
        *self.fetches.lock().unwrap().entry(id.clone()).or_insert(0) += 1;
        match self.delays.get(id) {
            Some(delay) => tokio::time::sleep(*delay).await,
            None => tokio::task::yield_now().await,
        }
        if self.failing.lock().unwrap().contains(id) {
            return Err(DataError::network(event_resource(id), "connection refused"));
        }
        self.events
            .get(id)
            .cloned()
            .ok_or_else(|| DataError::network(event_resource(id), "HTTP 404 Not Found"))
    }
}
