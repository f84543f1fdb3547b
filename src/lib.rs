//! Client-side recipe discovery layer.
//!
//! Aggregates recipe records from a remote catalog, normalizes their
//! heterogeneous shapes into one canonical [`Recipe`] model, orchestrates
//! interactive search (debounce, name→ingredient fallback, stale-result
//! discard), and reconciles the user's favorites against a small REST store
//! with an optimistic toggle protocol.

pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod http;
pub mod normalize;
pub mod search;
pub mod types;

pub use catalog::CatalogClient;
pub use config::{Config, ConfigError};
pub use error::{CatalogError, FetchError, SyncError};
pub use favorites::{FavoritesSynchronizer, ToggleOutcome};
pub use http::{HttpClient, MockClient, MockResponse, ReqwestClient};
pub use normalize::{normalize, normalize_detail, youtube_embed_url};
pub use search::{Phase, SearchOptions, SearchOrchestrator};
pub use types::{Category, FavoriteEntry, RawCatalogRecord, Recipe, INGREDIENT_SLOTS};
