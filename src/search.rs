//! Interactive search orchestration.
//!
//! Owns the debounce, fallback, and race-cancellation policy for keystroke
//! search and category browsing. Visible results flow through a `watch`
//! channel; failures go to a separate error channel so they never reach the
//! render path.
//!
//! There is no transport-level abort: the upstream cannot cancel an in-flight
//! request, so cancellation is result-level only (stale completions are
//! discarded by sequence number).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::catalog::CatalogClient;
use crate::config::{Config, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_RESULTS, DEFAULT_SAMPLE_SIZE};
use crate::error::CatalogError;
use crate::normalize::normalize;
use crate::types::{RawCatalogRecord, Recipe};

/// Lifecycle of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Debouncing,
    Querying,
    Settled,
}

/// Tuning knobs for a search session.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Trailing-edge debounce window for keystrokes.
    pub debounce: Duration,
    /// Cap on visible results per dispatch.
    pub max_results: usize,
    /// Random-sample batch size for empty queries.
    pub sample_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            max_results: DEFAULT_MAX_RESULTS,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl SearchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            max_results: config.max_results,
            sample_size: config.sample_size,
        }
    }
}

/// Ephemeral per-session search state.
struct SearchState {
    /// Input generation; bumped on every keystroke or category switch.
    /// A pending debounce window dispatches only if its generation is still
    /// current when the window elapses.
    input_gen: u64,
    /// Highest dispatched sequence number.
    latest_seq: u64,
    /// Sequence number of the last completion applied to visible results.
    last_applied: u64,
    phase: Phase,
}

enum QueryPlan {
    Text(String),
    Category(String),
}

/// Orchestrates one search session.
///
/// Counters live inside the instance, never in process-wide state, so two
/// concurrent sessions (two screens) cannot interfere with each other.
pub struct SearchOrchestrator {
    inner: Arc<Inner>,
    errors_rx: Mutex<Option<mpsc::UnboundedReceiver<CatalogError>>>,
}

struct Inner {
    catalog: CatalogClient,
    state: Mutex<SearchState>,
    results_tx: watch::Sender<Vec<Recipe>>,
    errors_tx: mpsc::UnboundedSender<CatalogError>,
    options: SearchOptions,
}

impl SearchOrchestrator {
    pub fn new(catalog: CatalogClient, options: SearchOptions) -> Self {
        let (results_tx, _) = watch::channel(Vec::new());
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                catalog,
                state: Mutex::new(SearchState {
                    input_gen: 0,
                    latest_seq: 0,
                    last_applied: 0,
                    phase: Phase::Idle,
                }),
                results_tx,
                errors_tx,
                options,
            }),
            errors_rx: Mutex::new(Some(errors_rx)),
        }
    }

    /// Record a keystroke. Restarts the trailing-edge debounce window; only
    /// the value still current when the window elapses is dispatched, so a
    /// burst of rapid input coalesces into a single query.
    ///
    /// An empty or whitespace-only query dispatches a random sample instead
    /// of a text search.
    pub fn on_query_changed(&self, text: &str) {
        let query = text.to_string();
        let generation = {
            let mut state = self.inner.state.lock().unwrap();
            state.input_gen += 1;
            state.phase = Phase::Debouncing;
            state.input_gen
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.options.debounce).await;

            let seq = {
                let mut state = inner.state.lock().unwrap();
                if state.input_gen != generation {
                    // Superseded by newer input before the window elapsed.
                    return;
                }
                state.phase = Phase::Querying;
                state.latest_seq += 1;
                state.latest_seq
            };

            inner.run_query(QueryPlan::Text(query), seq, generation).await;
        });
    }

    /// Browse a category: an immediate dispatch (no debounce) through the
    /// same normalize/cap/race-guard path. Switching categories supersedes
    /// any in-flight fetch exactly like a new keystroke.
    pub fn select_category(&self, name: &str) {
        let category = name.to_string();
        let (seq, generation) = {
            let mut state = self.inner.state.lock().unwrap();
            state.input_gen += 1;
            state.phase = Phase::Querying;
            state.latest_seq += 1;
            (state.latest_seq, state.input_gen)
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_query(QueryPlan::Category(category), seq, generation).await;
        });
    }

    /// Visible results. Starts empty and only ever reflects the newest
    /// dispatched query.
    pub fn results(&self) -> watch::Receiver<Vec<Recipe>> {
        self.inner.results_tx.subscribe()
    }

    /// Take the error channel. Fetch failures land here instead of the
    /// render path. Yields `None` after the first call.
    pub fn take_errors(&self) -> Option<mpsc::UnboundedReceiver<CatalogError>> {
        self.errors_rx.lock().unwrap().take()
    }

    /// Current session phase.
    pub fn phase(&self) -> Phase {
        self.inner.state.lock().unwrap().phase
    }
}

impl Inner {
    async fn run_query(&self, plan: QueryPlan, seq: u64, generation: u64) {
        let fetched = match &plan {
            QueryPlan::Text(query) if query.trim().is_empty() => {
                self.catalog.random_sample(self.options.sample_size).await
            }
            QueryPlan::Text(query) => self.search_with_fallback(query).await,
            QueryPlan::Category(category) => self.catalog.filter_by_category(category).await,
        };

        // The staleness check and the publish must happen under the same
        // lock: a completion that passed the check but published after
        // releasing it could interleave with a newer completion and put
        // superseded results back on screen. `watch::Sender::send` never
        // blocks, so holding the mutex across it is safe.
        match fetched {
            Ok(raw) => {
                let recipes: Vec<Recipe> = raw
                    .iter()
                    .filter_map(normalize)
                    .take(self.options.max_results)
                    .collect();

                let mut state = self.state.lock().unwrap();
                if !self.is_current(&state, seq, generation) {
                    tracing::debug!(seq, latest = state.latest_seq, "discarding stale results");
                    return;
                }
                state.last_applied = seq;
                state.phase = Phase::Settled;
                let _ = self.results_tx.send(recipes);
            }
            Err(e) => {
                {
                    let mut state = self.state.lock().unwrap();
                    if !self.is_current(&state, seq, generation) {
                        tracing::debug!(seq, latest = state.latest_seq, "discarding stale failure");
                        return;
                    }
                    state.last_applied = seq;
                    state.phase = Phase::Idle;
                    let _ = self.results_tx.send(Vec::new());
                }
                tracing::warn!(error = %e, "search failed, clearing visible results");
                let _ = self.errors_tx.send(e);
            }
        }
    }

    /// A completion applies only if it belongs to the highest dispatched
    /// sequence number, nothing newer was already applied, and no newer
    /// input has arrived since dispatch.
    fn is_current(&self, state: &SearchState, seq: u64, generation: u64) -> bool {
        state.latest_seq == seq && state.last_applied < seq && state.input_gen == generation
    }

    /// Name search first; one ingredient-search fallback iff it came back
    /// empty. No further stages.
    async fn search_with_fallback(
        &self,
        query: &str,
    ) -> Result<Vec<RawCatalogRecord>, CatalogError> {
        let by_name = self.catalog.search_by_name(query).await?;
        if !by_name.is_empty() {
            return Ok(by_name);
        }
        tracing::debug!(query, "name search empty, trying ingredient search");
        self.catalog.filter_by_ingredient(query).await
    }
}
