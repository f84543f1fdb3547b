//! HTTP client trait and implementations.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::FetchError;

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL, returning the response body on a 2xx status.
    async fn get(&self, url: &str) -> Result<String, FetchError>;

    /// POST a JSON body, returning the response body on a 2xx status.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, FetchError>;

    /// DELETE a resource, returning the response body on a 2xx status.
    async fn delete(&self, url: &str) -> Result<String, FetchError>;
}

/// Production HTTP client backed by reqwest.
///
/// No caching and no retries: a failed request is surfaced to the caller
/// and retried only by a new user-initiated action.
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with the default timeout and user agent.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skillet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { inner })
    }

    async fn read_body(response: reqwest::Response) -> Result<String, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        tracing::debug!(url, "GET");
        let response = self.inner.get(parsed).send().await?;
        Self::read_body(response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, FetchError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        tracing::debug!(url, "POST");
        let response = self.inner.post(parsed).json(body).send().await?;
        Self::read_body(response).await
    }

    async fn delete(&self, url: &str) -> Result<String, FetchError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        tracing::debug!(url, "DELETE");
        let response = self.inner.delete(parsed).send().await?;
        Self::read_body(response).await
    }
}

/// Scripted response for [`MockClient`].
#[derive(Clone)]
pub enum MockResponse {
    /// Respond immediately with this body.
    Body(String),
    /// Respond with this body after the given delay (drive with paused time).
    Delayed(u64, String),
    /// Fail with a transport-level error.
    Error(String),
    /// Fail with this HTTP status.
    Status(u16),
    /// Never resolve. Exercises hung upstream calls.
    Hang,
}

/// Mock HTTP client for testing.
///
/// Responses are keyed by full URL and consumed as a queue: each call pops
/// the next scripted response, except the last one, which keeps answering
/// repeated calls to the same URL. Every call is recorded as
/// `"METHOD url"` for assertions on call counts and ordering.
pub struct MockClient {
    responses: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    calls: Mutex<Vec<String>>,
    posted: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockClient {
    /// Create a new empty mock client.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            posted: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response for a URL.
    pub fn with_response(self, url: &str, response: MockResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a body response for a URL.
    pub fn with_body(self, url: &str, body: &str) -> Self {
        self.with_response(url, MockResponse::Body(body.to_string()))
    }

    /// Queue a delayed body response for a URL.
    pub fn with_delayed_body(self, url: &str, delay_ms: u64, body: &str) -> Self {
        self.with_response(url, MockResponse::Delayed(delay_ms, body.to_string()))
    }

    /// Queue a transport error for a URL.
    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }

    /// Queue an HTTP status failure for a URL.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, MockResponse::Status(status))
    }

    /// Queue a never-resolving response for a URL.
    pub fn with_hang(self, url: &str) -> Self {
        self.with_response(url, MockResponse::Hang)
    }

    /// All calls made so far, as `"METHOD url"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose `"METHOD url"` record starts with the prefix.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// JSON bodies sent via POST, paired with their URLs.
    pub fn posted_bodies(&self) -> Vec<(String, serde_json::Value)> {
        self.posted.lock().unwrap().clone()
    }

    async fn respond(&self, method: &str, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(format!("{} {}", method, url));

        let response = {
            let mut responses = self.responses.lock().unwrap();
            match responses.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Delayed(ms, body)) => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(body)
            }
            Some(MockResponse::Error(e)) => Err(FetchError::InvalidUrl(e)),
            Some(MockResponse::Status(code)) => Err(FetchError::Status(code)),
            Some(MockResponse::Hang) => std::future::pending().await,
            None => Err(FetchError::InvalidUrl(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.respond("GET", url).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, FetchError> {
        self.posted
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        self.respond("POST", url).await
    }

    async fn delete(&self, url: &str) -> Result<String, FetchError> {
        self.respond("DELETE", url).await
    }
}
