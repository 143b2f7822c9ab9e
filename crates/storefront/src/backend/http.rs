//! QKart REST API client.
//!
//! Uses `reqwest` 0.13 for HTTP. Catalog and search responses are cached
//! using `moka` (5-minute TTL by default). Cart responses are never cached.

use std::sync::Arc;

use moka::future::Cache;
use qkart_core::{CartRecord, CatalogEntry, ProductId};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{BackendError, StorefrontBackend};
use crate::config::StorefrontConfig;

const SEARCH_NOT_FOUND: &str = "No products found";

/// Cache key for catalog listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Catalog,
    Search(String),
}

/// Error body returned by the backend: `{ "success": false, "message": "..." }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Body of `POST /cart`.
#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    #[serde(rename = "productId")]
    product_id: &'a ProductId,
    qty: u32,
}

// =============================================================================
// HttpBackend
// =============================================================================

/// Client for the QKart REST API.
///
/// Cheap to clone; clones share the connection pool and cache.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    products_url: Url,
    search_url: Url,
    cart_url: Url,
    cache: Option<Cache<CacheKey, Vec<CatalogEntry>>>,
}

impl HttpBackend {
    /// Create a new client for the backend at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry endpoint paths or the
    /// HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.http.timeout)
            .build()?;

        let cache = config.http.catalog_cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                products_url: endpoint(&config.api_url, &["products"])?,
                search_url: endpoint(&config.api_url, &["products", "search"])?,
                cart_url: endpoint(&config.api_url, &["cart"])?,
                cache,
            }),
        })
    }

    /// Send a request and decode a JSON success body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let err = error_from_response(status, &response_text);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %truncate(&response_text, 500),
                    "Backend returned server error"
                );
            } else {
                debug!(status = %status, error = %err, "Backend refused request");
            }
            return Err(err);
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&response_text, 500),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    async fn cached_listing(
        &self,
        key: CacheKey,
        url: Url,
    ) -> Result<Vec<CatalogEntry>, BackendError> {
        if let Some(cache) = &self.inner.cache
            && let Some(entries) = cache.get(&key).await
        {
            debug!(count = entries.len(), "Cache hit for catalog listing");
            return Ok(entries);
        }

        let entries: Vec<CatalogEntry> = self.execute(self.inner.client.get(url)).await?;

        if let Some(cache) = &self.inner.cache
            && !entries.is_empty()
        {
            cache.insert(key, entries.clone()).await;
        }

        Ok(entries)
    }
}

impl StorefrontBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, BackendError> {
        let entries = self
            .cached_listing(CacheKey::Catalog, self.inner.products_url.clone())
            .await?;
        debug!(count = entries.len(), "Fetched catalog");
        Ok(entries)
    }

    #[instrument(skip(self), fields(query = %query))]
    async fn search_catalog(&self, query: &str) -> Result<Vec<CatalogEntry>, BackendError> {
        let mut url = self.inner.search_url.clone();
        url.query_pairs_mut().append_pair("value", query);

        let entries = self
            .cached_listing(CacheKey::Search(query.to_string()), url)
            .await
            .map_err(|e| match e {
                BackendError::NotFound(_) => BackendError::NotFound(SEARCH_NOT_FOUND.to_string()),
                other => other,
            })?;

        if entries.is_empty() {
            return Err(BackendError::NotFound(SEARCH_NOT_FOUND.to_string()));
        }
        debug!(count = entries.len(), "Search returned products");
        Ok(entries)
    }

    #[instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartRecord>, BackendError> {
        let request = self
            .inner
            .client
            .get(self.inner.cart_url.clone())
            .bearer_auth(token.expose_secret());

        let records: Vec<CartRecord> = self.execute(request).await?;
        debug!(count = records.len(), "Fetched cart");
        Ok(records)
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn upsert_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Vec<CartRecord>, BackendError> {
        let request = self
            .inner
            .client
            .post(self.inner.cart_url.clone())
            .bearer_auth(token.expose_secret())
            .json(&UpsertRequest {
                product_id,
                qty: quantity,
            });

        let records: Vec<CartRecord> = self.execute(request).await?;
        debug!(count = records.len(), "Cart updated");
        Ok(records)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Append path segments to the API base URL.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, BackendError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| BackendError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map a non-success response to a `BackendError`.
fn error_from_response(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string()
            } else {
                truncate(body, 200)
            }
        });

    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
        StatusCode::BAD_REQUEST => BackendError::Rejected(message),
        _ => BackendError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const PRODUCTS_JSON: &str = r#"[
        {"name":"iPhone XR","category":"Phones","cost":100,"rating":4,"image":"https://i.imgur.com/lulqWzW.jpg","_id":"KCRwjF7lN97HnEaY"},
        {"name":"Basketball","category":"Sports","cost":50,"rating":5,"image":"https://i.imgur.com/lulqWzW.jpg","_id":"BW0jAAeDJmlZCF8i"}
    ]"#;

    /// Accept a single connection, reply with `status` and `body`, and return
    /// the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        let url = Url::parse(&format!("http://{addr}/api/v1")).unwrap();
        (url, handle)
    }

    fn backend(api_url: Url, cache_ttl: Option<Duration>) -> HttpBackend {
        let mut config = StorefrontConfig::new(api_url);
        config.http.timeout = Duration::from_secs(5);
        config.http.catalog_cache_ttl = cache_ttl;
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let base = Url::parse("https://qkart.example.com/api/v1").unwrap();
        assert_eq!(
            endpoint(&base, &["products", "search"]).unwrap().as_str(),
            "https://qkart.example.com/api/v1/products/search"
        );

        let trailing = Url::parse("https://qkart.example.com/api/v1/").unwrap();
        assert_eq!(
            endpoint(&trailing, &["cart"]).unwrap().as_str(),
            "https://qkart.example.com/api/v1/cart"
        );
    }

    #[test]
    fn test_error_body_message_is_extracted() {
        let body = r#"{"success":false,"message":"Product doesn't exist"}"#;
        let err = error_from_response(StatusCode::NOT_FOUND, body);
        assert!(matches!(err, BackendError::NotFound(ref m) if m == "Product doesn't exist"));

        let body = r#"{"success":false,"message":"Protected route, Oauth2 Bearer token not found"}"#;
        let err = error_from_response(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, BackendError::Unauthorized(ref m) if m.starts_with("Protected route")));

        let body = r#"{"success":false,"message":"Quantity must be a number"}"#;
        let err = error_from_response(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, BackendError::Rejected(ref m) if m == "Quantity must be a number"));
    }

    #[test]
    fn test_error_without_json_body() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(
            err,
            BackendError::Status { status: 502, ref message } if message == "Bad Gateway"
        ));

        let err = error_from_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert!(matches!(
            err,
            BackendError::Status { status: 500, ref message } if message == "<html>oops</html>"
        ));
    }

    #[tokio::test]
    async fn test_fetch_catalog_parses_products() {
        let (url, server) = serve_once("200 OK", PRODUCTS_JSON).await;
        let backend = backend(url, None);

        let catalog = backend.fetch_catalog().await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].id.as_str(), "KCRwjF7lN97HnEaY");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v1/products HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_fetch_catalog_is_served_from_cache() {
        let (url, server) = serve_once("200 OK", PRODUCTS_JSON).await;
        let backend = backend(url, Some(Duration::from_secs(60)));

        let first = backend.fetch_catalog().await.unwrap();
        server.await.unwrap();

        // The listener is gone, so a second request would fail
        let second = backend.fetch_catalog().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let (url, server) = serve_once("200 OK", PRODUCTS_JSON).await;
        let backend = backend(url, None);

        let results = backend.search_catalog("smart phone").await.unwrap();
        assert_eq!(results.len(), 2);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v1/products/search?value=smart+phone HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_search_empty_result_is_not_found() {
        let (url, _server) = serve_once("200 OK", "[]").await;
        let backend = backend(url, None);

        let err = backend.search_catalog("zzz").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(ref m) if m == "No products found"));
    }

    #[tokio::test]
    async fn test_search_404_is_not_found() {
        let (url, _server) = serve_once("404 Not Found", r#"{"success":false}"#).await;
        let backend = backend(url, None);

        let err = backend.search_catalog("zzz").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(ref m) if m == "No products found"));
    }

    #[tokio::test]
    async fn test_upsert_sends_bearer_and_body() {
        let (url, server) = serve_once("200 OK", r#"[{"productId":"KCRwjF7lN97HnEaY","qty":3}]"#).await;
        let backend = backend(url, None);
        let token = SecretString::from("bearer-token-value");

        let records = backend
            .upsert_cart_item(&token, &ProductId::new("KCRwjF7lN97HnEaY"), 3)
            .await
            .unwrap();
        assert_eq!(records, vec![CartRecord::new("KCRwjF7lN97HnEaY", 3)]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/v1/cart HTTP/1.1"));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("authorization: bearer bearer-token-value")
        );
        assert!(request.ends_with(r#"{"productId":"KCRwjF7lN97HnEaY","qty":3}"#));
    }

    #[tokio::test]
    async fn test_fetch_cart_malformed_body_is_parse_error() {
        let (url, _server) = serve_once("200 OK", r#"{"cart":"nope"}"#).await;
        let backend = backend(url, None);

        let err = backend
            .fetch_cart(&SecretString::from("token"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }
}
