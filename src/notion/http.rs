//! # Notion HTTP Transport
//!
//! [`DocumentApi`] over HTTPS using reqwest.

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::debug;

use super::api::{ApiFuture, DocumentApi, NOTION_VERSION};
use super::errors::{StoreError, StoreResult};

/// Notion REST client
#[derive(Clone)]
pub struct NotionHttp {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl NotionHttp {
    /// Create a client for `base_url` (normally `https://api.notion.com/v1`)
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> StoreResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Transport(format!("invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Transport("base URL cannot carry a path".into()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.trim().to_string(),
        })
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> StoreResult<Value> {
        let url = self.endpoint(segments);
        debug!(%method, path = url.path(), "notion request");

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION);
        if let Some(body) = body {
            request = request.json(&body);
        }

        // The URL carries ids, so it is stripped from transport errors
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.without_url().to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            return Err(StoreError::from_response(status.as_u16(), &body));
        }

        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

impl std::fmt::Debug for NotionHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionHttp")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl DocumentApi for NotionHttp {
    fn retrieve_database<'a>(&'a self, database_id: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move { self.send(Method::GET, &["databases", database_id], None).await })
    }

    fn retrieve_page<'a>(&'a self, page_id: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move { self.send(Method::GET, &["pages", page_id], None).await })
    }

    fn list_block_children<'a>(&'a self, block_id: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            self.send(Method::GET, &["blocks", block_id, "children"], None).await
        })
    }

    fn query_database<'a>(&'a self, database_id: &'a str, query: Value) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            self.send(Method::POST, &["databases", database_id, "query"], Some(query)).await
        })
    }

    fn create_page(&self, body: Value) -> ApiFuture<'_, Value> {
        Box::pin(async move { self.send(Method::POST, &["pages"], Some(body)).await })
    }

    fn update_page<'a>(&'a self, page_id: &'a str, body: Value) -> ApiFuture<'a, Value> {
        Box::pin(async move { self.send(Method::PATCH, &["pages", page_id], Some(body)).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Local stand-in for the Notion API; returns its base URL
    async fn stub_server() -> String {
        let app = Router::new()
            .route(
                "/v1/databases/:id",
                get(|headers: HeaderMap| async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string()
                    };
                    Json(json!({
                        "object": "database",
                        "authorization": header("authorization"),
                        "notion_version": header("notion-version"),
                    }))
                }),
            )
            .route("/v1/databases/:id/query", post(|| async { "not json" }))
            .route(
                "/v1/pages",
                post(|Json(body): Json<Value>| async move { Json(body) }),
            )
            .route(
                "/v1/pages/:id",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({
                            "code": "object_not_found",
                            "message": "Could not find page"
                        })),
                    )
                })
                .patch(|| async {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({
                            "code": "unauthorized",
                            "message": "API token is invalid."
                        })),
                    )
                }),
            )
            .route(
                "/v1/blocks/:id/children",
                get(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    async fn stub_client() -> NotionHttp {
        let base = stub_server().await;
        NotionHttp::new(&base, "secret_stub", Duration::from_secs(5)).unwrap()
    }

    fn client() -> NotionHttp {
        NotionHttp::new(
            "https://api.notion.com/v1",
            " secret_abc ",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let url = client().endpoint(&["databases", "abc", "query"]);
        assert_eq!(url.as_str(), "https://api.notion.com/v1/databases/abc/query");
    }

    #[test]
    fn test_endpoint_with_trailing_slash_base() {
        let http =
            NotionHttp::new("http://localhost:9000/v1/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(
            http.endpoint(&["pages", "p1"]).as_str(),
            "http://localhost:9000/v1/pages/p1"
        );
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let url = client().endpoint(&["pages", "../databases/x"]);
        assert_eq!(url.path(), "/v1/pages/..%2Fdatabases%2Fx");
    }

    #[test]
    fn test_api_key_is_trimmed_and_hidden() {
        let http = client();
        assert_eq!(http.api_key, "secret_abc");
        assert!(!format!("{http:?}").contains("secret_abc"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(NotionHttp::new("not a url", "k", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_requests_carry_auth_and_version_headers() {
        let http = stub_client().await;
        let body = http.retrieve_database("db1").await.unwrap();
        assert_eq!(body["authorization"], "Bearer secret_stub");
        assert_eq!(body["notion_version"], NOTION_VERSION);
    }

    #[tokio::test]
    async fn test_json_bodies_are_sent() {
        let http = stub_client().await;
        let body = http
            .create_page(json!({"parent": {"database_id": "db1"}}))
            .await
            .unwrap();
        assert_eq!(body["parent"]["database_id"], "db1");
    }

    #[tokio::test]
    async fn test_error_bodies_map_to_store_errors() {
        let http = stub_client().await;

        let err = http.retrieve_page("p1").await.unwrap_err();
        assert!(err.is_object_missing());
        assert!(err.to_string().contains("Could not find page"));

        let err = http.update_page("p1", json!({"archived": true})).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized));
    }

    #[tokio::test]
    async fn test_non_json_error_body_keeps_status() {
        let http = stub_client().await;
        let err = http.list_block_children("b1").await.unwrap_err();
        match err {
            StoreError::Upstream { status, code, message } => {
                assert_eq!(status, 502);
                assert_eq!(code, None);
                assert_eq!(message, "no error message");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_decode_error() {
        let http = stub_client().await;
        let err = http.query_database("db1", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }
}
