//! Optimistic favorites synchronization against the remote store.
//!
//! The toggle protocol is apply-tentative, attempt-remote, commit-or-
//! compensate: the locally displayed flag flips immediately, the remote
//! mutation runs, and on failure the flag rolls back and the error goes to
//! the error channel. At most one mutation per user+recipe is in flight at
//! a time.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use dashmap::DashSet;
use tokio::sync::{mpsc, watch};

use crate::error::{FetchError, SyncError};
use crate::http::HttpClient;
use crate::types::{FavoriteEntry, Recipe};

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The remote mutation succeeded; the optimistic state stands.
    Confirmed(bool),
    /// The remote mutation failed; the flag was rolled back to this state.
    RolledBack(bool),
    /// A toggle for the same recipe is already in flight, or there is no
    /// user context. Nothing was changed.
    Rejected,
}

/// Reconciles the user's saved recipes against the favorites store.
pub struct FavoritesSynchronizer {
    http: Arc<dyn HttpClient>,
    base_url: String,
    /// (user, recipe) pairs with a mutation in flight.
    in_flight: DashSet<(String, String)>,
    /// Locally displayed saved flags for this session.
    flags_tx: watch::Sender<HashMap<String, bool>>,
    errors_tx: mpsc::UnboundedSender<SyncError>,
    errors_rx: Mutex<Option<mpsc::UnboundedReceiver<SyncError>>>,
}

impl FavoritesSynchronizer {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str) -> Self {
        let (flags_tx, _) = watch::channel(HashMap::new());
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            in_flight: DashSet::new(),
            flags_tx,
            errors_tx,
            errors_rx: Mutex::new(Some(errors_rx)),
        }
    }

    /// Fetch the user's favorites and return the set of saved recipe ids.
    /// Also reseeds the locally displayed flags.
    ///
    /// A failure means "unknown state": callers must not paint entries as
    /// unsaved on the strength of it.
    pub async fn load_saved_state(&self, user_id: &str) -> Result<HashSet<String>, SyncError> {
        if user_id.is_empty() {
            return Err(SyncError::Unavailable("no user context".to_string()));
        }

        let url = format!("{}/favorites/{}", self.base_url, user_id);
        tracing::debug!(url = %url, "loading saved favorites");
        let body = self.http.get(&url).await.map_err(to_sync_error)?;
        let entries: Vec<FavoriteEntry> = serde_json::from_str(&body)
            .map_err(|e| SyncError::Unavailable(format!("unexpected favorites payload: {}", e)))?;

        let saved: HashSet<String> = entries.into_iter().map(|e| e.recipe_id).collect();
        self.flags_tx.send_modify(|flags| {
            flags.clear();
            for id in &saved {
                flags.insert(id.clone(), true);
            }
        });
        Ok(saved)
    }

    /// Optimistic two-phase toggle.
    ///
    /// Flips the locally displayed flag immediately, then issues the remote
    /// mutation (POST to save, DELETE to unsave). On failure the flag rolls
    /// back to `currently_saved` and the error is emitted on the error
    /// channel. A second toggle for the same recipe while one is in flight
    /// is rejected; the per-recipe lock is released on every exit path.
    pub async fn toggle(
        &self,
        user_id: &str,
        recipe: &Recipe,
        currently_saved: bool,
    ) -> ToggleOutcome {
        if user_id.is_empty() {
            tracing::debug!(recipe_id = %recipe.id, "toggle without user context rejected");
            return ToggleOutcome::Rejected;
        }

        let key = (user_id.to_string(), recipe.id.clone());
        if !self.in_flight.insert(key.clone()) {
            tracing::debug!(recipe_id = %recipe.id, "toggle already in flight, rejecting");
            return ToggleOutcome::Rejected;
        }
        let _lock = ToggleLock {
            set: &self.in_flight,
            key,
        };

        let target = !currently_saved;
        self.set_flag(&recipe.id, target);

        let result = if target {
            self.save(user_id, recipe).await
        } else {
            self.remove(user_id, &recipe.id).await
        };

        match result {
            Ok(()) => ToggleOutcome::Confirmed(target),
            Err(e) => {
                tracing::warn!(recipe_id = %recipe.id, error = %e, "toggle failed, rolling back");
                self.set_flag(&recipe.id, currently_saved);
                let _ = self.errors_tx.send(e);
                ToggleOutcome::RolledBack(currently_saved)
            }
        }
    }

    /// Locally displayed saved flag for a recipe. Reflects the last loaded
    /// state plus confirmed and in-flight optimistic toggles; never guesses
    /// beyond that.
    pub fn is_saved(&self, recipe_id: &str) -> bool {
        self.flags_tx
            .borrow()
            .get(recipe_id)
            .copied()
            .unwrap_or(false)
    }

    /// Watch the locally displayed flags (optimistic updates included).
    pub fn flags(&self) -> watch::Receiver<HashMap<String, bool>> {
        self.flags_tx.subscribe()
    }

    /// Take the error channel. Yields `None` after the first call.
    pub fn take_errors(&self) -> Option<mpsc::UnboundedReceiver<SyncError>> {
        self.errors_rx.lock().unwrap().take()
    }

    fn set_flag(&self, recipe_id: &str, saved: bool) {
        self.flags_tx.send_modify(|flags| {
            flags.insert(recipe_id.to_string(), saved);
        });
    }

    async fn save(&self, user_id: &str, recipe: &Recipe) -> Result<(), SyncError> {
        let entry = FavoriteEntry {
            user_id: user_id.to_string(),
            recipe_id: recipe.id.clone(),
            title: recipe.title.clone(),
            image: recipe.image.clone(),
            cook_time: recipe.cook_time.clone(),
            servings: recipe.servings.clone(),
        };
        let body = serde_json::to_value(&entry)
            .map_err(|e| SyncError::Unavailable(e.to_string()))?;
        let url = format!("{}/favorites", self.base_url);
        tracing::debug!(url = %url, recipe_id = %recipe.id, "saving favorite");
        self.http.post_json(&url, &body).await.map_err(to_sync_error)?;
        Ok(())
    }

    async fn remove(&self, user_id: &str, recipe_id: &str) -> Result<(), SyncError> {
        let url = format!("{}/favorites/{}/{}", self.base_url, user_id, recipe_id);
        tracing::debug!(url = %url, "removing favorite");
        self.http.delete(&url).await.map_err(to_sync_error)?;
        Ok(())
    }
}

/// Releases the per-recipe toggle lock on drop, covering every exit path.
struct ToggleLock<'a> {
    set: &'a DashSet<(String, String)>,
    key: (String, String),
}

impl Drop for ToggleLock<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

fn to_sync_error(e: FetchError) -> SyncError {
    SyncError::Unavailable(e.to_string())
}
