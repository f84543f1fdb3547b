//! Typed accessors for the upstream recipe catalog.
//!
//! Thin read-only wrappers over the catalog's REST endpoints. No retries and
//! no caching: failures propagate to the caller untouched.

use std::sync::Arc;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CatalogError;
use crate::http::HttpClient;
use crate::normalize::normalize_detail;
use crate::types::{Category, RawCatalogRecord, Recipe};

/// Client for the upstream recipe catalog.
#[derive(Clone)]
pub struct CatalogClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl CatalogClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Look up a single record by id. `Ok(None)` when the catalog has no
    /// record for the id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<RawCatalogRecord>, CatalogError> {
        let records = self.fetch_records("lookup.php", &[("i", id)]).await?;
        Ok(records.into_iter().next())
    }

    /// Look up a record by id and normalize it, carrying the video URL
    /// through. `Ok(None)` when the id is unknown or the record normalizes
    /// to nothing renderable.
    pub async fn get_recipe_detail(&self, id: &str) -> Result<Option<Recipe>, CatalogError> {
        Ok(self.get_by_id(id).await?.as_ref().and_then(normalize_detail))
    }

    /// Search records by name substring. Possibly empty.
    pub async fn search_by_name(&self, text: &str) -> Result<Vec<RawCatalogRecord>, CatalogError> {
        self.fetch_records("search.php", &[("s", text)]).await
    }

    /// Filter records by ingredient. Possibly empty.
    pub async fn filter_by_ingredient(
        &self,
        text: &str,
    ) -> Result<Vec<RawCatalogRecord>, CatalogError> {
        self.fetch_records("filter.php", &[("i", text)]).await
    }

    /// Filter records by category. Possibly empty.
    pub async fn filter_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<RawCatalogRecord>, CatalogError> {
        self.fetch_records("filter.php", &[("c", category)]).await
    }

    /// Fetch up to `n` random records.
    ///
    /// The catalog exposes no bulk-random endpoint, so this fans out `n`
    /// independent single-random requests concurrently. Individual failures
    /// are dropped; the batch fails only when every request fails.
    pub async fn random_sample(&self, n: usize) -> Result<Vec<RawCatalogRecord>, CatalogError> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let fetches = (0..n).map(|_| self.fetch_records("random.php", &[]));
        let outcomes = join_all(fetches).await;

        let mut records = Vec::new();
        let mut successes = 0usize;
        let mut last_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(batch) => {
                    successes += 1;
                    records.extend(batch);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "random sample request failed");
                    last_error = Some(e);
                }
            }
        }

        match (successes, last_error) {
            (0, Some(e)) => Err(e),
            _ => Ok(records),
        }
    }

    /// List the catalog's categories.
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let body = self.get("categories.php", &[]).await?;
        parse_envelope(&body, "categories")
    }

    async fn fetch_records(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<RawCatalogRecord>, CatalogError> {
        let body = self.get(path, params).await?;
        parse_envelope(&body, "meals")
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String, CatalogError> {
        let url = self.endpoint(path, params)?;
        tracing::debug!(url = %url, "catalog request");
        Ok(self.http.get(url.as_str()).await?)
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<url::Url, CatalogError> {
        let mut url = url::Url::parse(&format!("{}/{}", self.base_url, path)).map_err(|e| {
            CatalogError::Unavailable(crate::error::FetchError::InvalidUrl(e.to_string()))
        })?;
        for (key, value) in params {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }
}

/// Parse the catalog's `{"<key>": [...] | null}` envelope.
///
/// A null array is an empty result; a missing or non-array `key` is a
/// malformed response.
fn parse_envelope<T: DeserializeOwned>(body: &str, key: &str) -> Result<Vec<T>, CatalogError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| CatalogError::Malformed(format!("invalid JSON: {}", e)))?;

    match value.get(key) {
        Some(Value::Null) => Ok(Vec::new()),
        Some(items @ Value::Array(_)) => serde_json::from_value(items.clone())
            .map_err(|e| CatalogError::Malformed(format!("unexpected `{}` shape: {}", key, e))),
        Some(_) => Err(CatalogError::Malformed(format!(
            "top-level `{}` is not an array",
            key
        ))),
        None => Err(CatalogError::Malformed(format!(
            "missing top-level `{}` array",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockClient;

    const BASE: &str = "https://catalog.test";

    fn client(mock: MockClient) -> CatalogClient {
        CatalogClient::new(Arc::new(mock), BASE)
    }

    fn meal_body(id: &str, name: &str) -> String {
        format!(
            r#"{{"meals":[{{"idMeal":"{}","strMeal":"{}","strInstructions":"Stir.","strIngredient1":"salt"}}]}}"#,
            id, name
        )
    }

    #[tokio::test]
    async fn search_by_name_parses_records() {
        let mock = MockClient::new().with_body(
            &format!("{}/search.php?s=chicken", BASE),
            &meal_body("52772", "Teriyaki Chicken"),
        );
        let records = client(mock).search_by_name("chicken").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("52772"));
    }

    #[tokio::test]
    async fn null_meals_is_an_empty_result() {
        let mock = MockClient::new()
            .with_body(&format!("{}/search.php?s=xyzzy", BASE), r#"{"meals":null}"#);
        let records = client(mock).search_by_name("xyzzy").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn missing_top_level_array_is_malformed() {
        let mock = MockClient::new().with_body(&format!("{}/search.php?s=a", BASE), r#"{}"#);
        let err = client(mock).search_by_name("a").await.unwrap_err();
        assert!(matches!(err, CatalogError::Malformed(_)));
    }

    #[tokio::test]
    async fn invalid_json_is_malformed() {
        let mock =
            MockClient::new().with_body(&format!("{}/search.php?s=a", BASE), "<html>oops</html>");
        let err = client(mock).search_by_name("a").await.unwrap_err();
        assert!(matches!(err, CatalogError::Malformed(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_unavailable() {
        let mock =
            MockClient::new().with_error(&format!("{}/search.php?s=a", BASE), "connection refused");
        let err = client(mock).search_by_name("a").await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[tokio::test]
    async fn get_by_id_returns_none_for_unknown_id() {
        let mock = MockClient::new()
            .with_body(&format!("{}/lookup.php?i=999", BASE), r#"{"meals":null}"#);
        assert!(client(mock).get_by_id("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_recipe_detail_attaches_video_url() {
        let body = r#"{"meals":[{"idMeal":"1","strMeal":"Stew","strInstructions":"Simmer.","strYoutube":"https://www.youtube.com/watch?v=abc"}]}"#;
        let mock = MockClient::new().with_body(&format!("{}/lookup.php?i=1", BASE), body);
        let recipe = client(mock).get_recipe_detail("1").await.unwrap().unwrap();
        assert_eq!(
            recipe.youtube_url.as_deref(),
            Some("https://www.youtube.com/watch?v=abc")
        );
    }

    #[tokio::test]
    async fn random_sample_tolerates_partial_failures() {
        let url = format!("{}/random.php", BASE);
        let mock = MockClient::new()
            .with_error(&url, "connection reset")
            .with_body(&url, &meal_body("1", "Stew"));
        let records = client(mock).random_sample(2).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn random_sample_with_an_empty_success_is_not_a_failure() {
        // One request succeeds with a null result set while the other fails:
        // a successful (if empty) request means the batch did not fail.
        let url = format!("{}/random.php", BASE);
        let mock = MockClient::new()
            .with_body(&url, r#"{"meals":null}"#)
            .with_error(&url, "connection reset");
        let records = client(mock).random_sample(2).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn random_sample_fails_only_when_all_requests_fail() {
        let url = format!("{}/random.php", BASE);
        let mock = MockClient::new().with_error(&url, "connection reset");
        let err = client(mock).random_sample(3).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[tokio::test]
    async fn random_sample_of_zero_makes_no_requests() {
        let mock = MockClient::new();
        let records = client(mock).random_sample(0).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn list_categories_parses_the_category_envelope() {
        let body = r#"{"categories":[{"strCategory":"Beef","strCategoryThumb":"https://example.com/beef.png","strCategoryDescription":"Beef dishes."}]}"#;
        let mock = MockClient::new().with_body(&format!("{}/categories.php", BASE), body);
        let categories = client(mock).list_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Beef");
    }
}
