use thiserror::Error;

/// Transport-level failure talking to a remote collaborator.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// Failure talking to the upstream recipe catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Network or transport failure reaching the catalog.
    #[error("Upstream catalog unavailable: {0}")]
    Unavailable(#[from] FetchError),

    /// The catalog answered, but not in the shape we expect.
    #[error("Malformed catalog response: {0}")]
    Malformed(String),
}

/// Failure talking to the favorites store.
///
/// Callers must treat this as "unknown state", never as "unsaved".
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Favorites store unavailable: {0}")]
    Unavailable(String),
}
