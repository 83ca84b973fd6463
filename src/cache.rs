use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::DataError;
use crate::logging::{log, log_data_error, obj, v_str, Domain, Level};
use crate::model::{EventId, EventRow};
use crate::source::DataSource;

/// Session-lifetime memo of per-event row sets.
///
/// Entries are written once and never evicted. Failed fetches leave no entry,
/// so the next `get` for that id fetches again. Two `get` calls racing on the
/// same missing id each fetch; the first to finish populates the entry.
pub struct EventDataCache {
    source: Arc<dyn DataSource>,
    rows: Mutex<HashMap<EventId, Arc<Vec<EventRow>>>>,
}

impl EventDataCache {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, id: &EventId) -> Result<Arc<Vec<EventRow>>, DataError> {
        if let Some(rows) = self.cached(id) {
            log(
                Level::Trace,
                Domain::Cache,
                "hit",
                obj(&[("event_id", v_str(id.as_str())), ("rows", json!(rows.len()))]),
            );
            return Ok(rows);
        }

        let fetched = match self.source.fetch_event(id).await {
            Ok(rows) => Arc::new(rows),
            Err(err) => {
                log_data_error(Domain::Cache, "fetch_failed", Some(id.as_str()), &err);
                return Err(err);
            }
        };

        // Lock is not held across the fetch above.
        let mut cache = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = cache.entry(id.clone()).or_insert(fetched).clone();
        log(
            Level::Info,
            Domain::Cache,
            "stored",
            obj(&[
                ("event_id", v_str(id.as_str())),
                ("rows", json!(stored.len())),
                ("entries", json!(cache.len())),
            ]),
        );
        Ok(stored)
    }

    fn cached(&self, id: &EventId) -> Option<Arc<Vec<EventRow>>> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.cached(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, MemorySource};

    fn source() -> Arc<MemorySource> {
        Arc::new(
            MemorySource::new()
                .with_event("1", vec![row(-5, "Tech", "CA"), row(0, "Energy", "TX")])
                .with_event("2", vec![row(3, "Tech", "NY")]),
        )
    }

    #[tokio::test]
    async fn test_repeated_get_fetches_once() {
        let src = source();
        let cache = EventDataCache::new(src.clone());
        let id = EventId::from("1");

        let a = cache.get(&id).await.unwrap();
        let b = cache.get(&id).await.unwrap();
        let c = cache.get(&id).await.unwrap();

        assert_eq!(a.len(), 2);
        assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
        assert_eq!(src.fetch_count(&id), 1);
        assert!(cache.contains(&id));
    }

    #[tokio::test]
    async fn test_entries_are_per_id() {
        let src = source();
        let cache = EventDataCache::new(src.clone());
        cache.get(&EventId::from("1")).await.unwrap();
        let rows = cache.get(&EventId::from("2")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(src.fetch_count(&EventId::from("2")), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let src = source();
        let id = EventId::from("1");
        src.fail(&id, true);
        let cache = EventDataCache::new(src.clone());

        assert!(cache.get(&id).await.is_err());
        assert!(!cache.contains(&id));
        assert!(cache.is_empty());

        src.fail(&id, false);
        let rows = cache.get(&id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(src.fetch_count(&id), 2);

        cache.get(&id).await.unwrap();
        assert_eq!(src.fetch_count(&id), 2);
    }

    #[tokio::test]
    async fn test_concurrent_gets_are_not_deduplicated() {
        let src = source();
        let cache = EventDataCache::new(src.clone());
        let id = EventId::from("1");

        let (a, b) = tokio::join!(cache.get(&id), cache.get(&id));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(src.fetch_count(&id), 2);
        // Only one entry survives; both callers see it.
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }
}
