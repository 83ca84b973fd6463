//! Selection state machine driving the dashboard.
//!
//! ```text
//! Uninitialized ──catalog──► CatalogLoaded ──options(id)──► OptionsLoaded(id)
//!                                                                 │ render
//!                                                                 ▼
//!              event change ◄──────────────────────────────  Ready(selection)
//!              sector/state/window change ──► re-render from cache
//! ```
//!
//! Operations take `&self` and may overlap at fetch points. Every selection
//! change takes a fresh generation; a fetch that completes after a newer
//! change has been made renders nothing. Session locks are never held across
//! an `.await`.

use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cache::EventDataCache;
use crate::catalog::EventCatalog;
use crate::config::Config;
use crate::error::DataError;
use crate::filter::reduce;
use crate::logging::{log, log_data_error, log_transition, obj, v_str, Domain, Level};
use crate::model::{EventId, EventSummary, SelectionState};
use crate::options::{resolve_options, EventOptions};
use crate::render::ChartRenderer;
use crate::series::build_chart;
use crate::source::DataSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Phase {
    Uninitialized,
    CatalogLoaded,
    OptionsLoaded(EventId),
    Ready(SelectionState),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::CatalogLoaded => "catalog_loaded",
            Phase::OptionsLoaded(_) => "options_loaded",
            Phase::Ready(_) => "ready",
        }
    }
}

/// What a selection change ended up doing to the chart area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Rendered { points: usize },
    NoData,
    /// A newer selection superseded this one before its data arrived.
    Stale,
    /// Nothing to do: no event selected, or an unknown event id.
    Ignored,
}

struct Session {
    phase: Phase,
    selection: SelectionState,
    catalog: Arc<EventCatalog>,
    options: EventOptions,
    /// Generation of the latest event-id change.
    event_generation: u64,
}

pub struct SelectionController<R: ChartRenderer> {
    cache: EventDataCache,
    source: Arc<dyn DataSource>,
    renderer: R,
    session: Mutex<Session>,
    generation: AtomicU64,
    title_wrap: usize,
}

impl<R: ChartRenderer> SelectionController<R> {
    pub fn new(source: Arc<dyn DataSource>, renderer: R, cfg: &Config) -> Self {
        Self {
            cache: EventDataCache::new(source.clone()),
            source,
            renderer,
            session: Mutex::new(Session {
                phase: Phase::Uninitialized,
                selection: SelectionState::new(cfg.default_window),
                catalog: Arc::new(EventCatalog::default()),
                options: EventOptions::default(),
                event_generation: 0,
            }),
            generation: AtomicU64::new(0),
            title_wrap: cfg.title_wrap,
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn set_phase(session: &mut Session, phase: Phase, generation: u64) {
        if session.phase != phase {
            log_transition(session.phase.name(), phase.name(), generation);
        }
        session.phase = phase;
    }

    /// Loads the catalog, publishes the event list and selects the first event.
    ///
    /// On failure the selectors stay empty and the phase stays `Uninitialized`.
    pub async fn start(&self) -> Result<Outcome, DataError> {
        let catalog = match EventCatalog::load(self.source.as_ref()).await {
            Ok(c) => Arc::new(c),
            Err(err) => {
                log_data_error(Domain::Catalog, "load_failed", None, &err);
                return Err(err);
            }
        };

        {
            let mut session = self.session();
            session.catalog = catalog.clone();
            let generation = self.generation.load(Ordering::SeqCst);
            Self::set_phase(&mut session, Phase::CatalogLoaded, generation);
        }
        self.renderer.show_events(catalog.ids());

        match catalog.first() {
            Some(first) => self.select_event(first.clone()).await,
            None => {
                log(
                    Level::Warn,
                    Domain::Catalog,
                    "empty",
                    obj(&[("msg", v_str("event index has no events"))]),
                );
                Ok(Outcome::Ignored)
            }
        }
    }

    /// Switches event: clears sector/state, publishes the new event's option
    /// lists, then re-renders.
    pub async fn select_event(&self, id: EventId) -> Result<Outcome, DataError> {
        let generation = {
            let mut session = self.session();
            if !session.catalog.contains(&id) {
                log(
                    Level::Warn,
                    Domain::Selection,
                    "unknown_event",
                    obj(&[("event_id", v_str(id.as_str()))]),
                );
                return Ok(Outcome::Ignored);
            }
            let generation = self.next_generation();
            session.selection.event_id = Some(id.clone());
            session.selection.sector = None;
            session.selection.state = None;
            session.event_generation = generation;
            generation
        };

        let options = match resolve_options(&self.cache, &id).await {
            Ok(o) => o,
            Err(err) => {
                log_data_error(Domain::Options, "resolve_failed", Some(id.as_str()), &err);
                return Err(err);
            }
        };

        {
            let mut session = self.session();
            if session.event_generation != generation {
                log(
                    Level::Debug,
                    Domain::Options,
                    "stale_discarded",
                    obj(&[("event_id", v_str(id.as_str())), ("generation", json!(generation))]),
                );
                return Ok(Outcome::Stale);
            }
            session.options = options.clone();
            Self::set_phase(&mut session, Phase::OptionsLoaded(id.clone()), generation);
        }
        self.renderer.show_options(&id, &options);

        self.recompute_and_render(generation).await
    }

    pub async fn select_window(&self, window: u32) -> Result<Outcome, DataError> {
        self.update_selection(|s| s.window = window).await
    }

    pub async fn select_sector(&self, sector: Option<String>) -> Result<Outcome, DataError> {
        self.update_selection(|s| s.sector = sector).await
    }

    pub async fn select_state(&self, state: Option<String>) -> Result<Outcome, DataError> {
        self.update_selection(|s| s.state = state).await
    }

    async fn update_selection<F>(&self, apply: F) -> Result<Outcome, DataError>
    where
        F: FnOnce(&mut SelectionState),
    {
        let generation = {
            let mut session = self.session();
            apply(&mut session.selection);
            self.next_generation()
        };
        self.recompute_and_render(generation).await
    }

    /// Rows via cache, reduce, then chart or placeholder.
    async fn recompute_and_render(&self, generation: u64) -> Result<Outcome, DataError> {
        let (selection, summary) = {
            let session = self.session();
            let Some(id) = session.selection.event_id.clone() else {
                return Ok(Outcome::Ignored);
            };
            let summary = session.catalog.summary(&id).unwrap_or_else(|| EventSummary {
                title: id.to_string(),
                event_id: id,
                date: String::new(),
                tic: 0,
            });
            (session.selection.clone(), summary)
        };

        let rows = match self.cache.get(&summary.event_id).await {
            Ok(rows) => rows,
            Err(err) => {
                log_data_error(
                    Domain::Render,
                    "render_failed",
                    Some(summary.event_id.as_str()),
                    &err,
                );
                return Err(err);
            }
        };

        if !self.is_current(generation) {
            log(
                Level::Debug,
                Domain::Render,
                "stale_discarded",
                obj(&[
                    ("event_id", v_str(summary.event_id.as_str())),
                    ("generation", json!(generation)),
                ]),
            );
            return Ok(Outcome::Stale);
        }

        let filtered = reduce(
            &rows,
            selection.sector.as_deref(),
            selection.state.as_deref(),
            selection.window,
        );

        {
            let mut session = self.session();
            Self::set_phase(&mut session, Phase::Ready(selection.clone()), generation);
        }

        if filtered.is_empty() {
            log(
                Level::Info,
                Domain::Render,
                "no_data",
                obj(&[
                    ("event_id", v_str(summary.event_id.as_str())),
                    ("window", json!(selection.window)),
                    ("sector", json!(selection.sector)),
                    ("state", json!(selection.state)),
                ]),
            );
            self.renderer.show_no_data();
            return Ok(Outcome::NoData);
        }

        let chart = build_chart(
            &filtered,
            selection.window,
            &summary.title,
            &summary.date,
            summary.tic,
            self.title_wrap,
        );
        log(
            Level::Info,
            Domain::Render,
            "chart",
            obj(&[
                ("event_id", v_str(summary.event_id.as_str())),
                ("points", json!(chart.data.len())),
                ("window", json!(selection.window)),
                ("time_label", v_str(&chart.time_label)),
            ]),
        );
        self.renderer.render_chart(&chart);
        Ok(Outcome::Rendered {
            points: chart.data.len(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.session().phase.clone()
    }

    pub fn selection(&self) -> SelectionState {
        self.session().selection.clone()
    }

    pub fn options(&self) -> EventOptions {
        self.session().options.clone()
    }

    pub fn catalog(&self) -> Arc<EventCatalog> {
        self.session().catalog.clone()
    }

    pub fn cache(&self) -> &EventDataCache {
        &self.cache
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
