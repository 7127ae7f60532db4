//! # HTTP Server
//!
//! Combines the manual, upload, auth and health routers. Everything except
//! `/auth/*` and `/health` sits behind the session gate.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::{require_session, AuthResult, Credentials, JwtConfig, JwtManager, SessionGate};
use crate::config::{AppConfig, ServerSettings};
use crate::notion::{DocumentApi, ManualStore, Scrubber};

use super::auth_routes::auth_routes;
use super::manual_routes::manual_routes;
use super::response::ApiResponse;
use super::state::AppState;
use super::upload_routes::upload_routes;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// HTTP server for the manuals API
pub struct HttpServer {
    config: ServerSettings,
    router: Router,
}

impl HttpServer {
    /// Create a server from already-built parts
    pub fn new(config: ServerSettings, app: Arc<AppState>, gate: Arc<SessionGate>) -> Self {
        let router = Self::build_router(&config, app, gate);
        Self { config, router }
    }

    /// Wire a server from configuration and a document API
    pub fn assemble(config: &AppConfig, api: Arc<dyn DocumentApi>) -> AuthResult<Self> {
        let credentials = Credentials::from_settings(
            &config.auth.allowed_email,
            config.auth.password_hash.as_deref(),
            config.auth.password_hash_b64.as_deref(),
        )?;
        let jwt = JwtManager::new(JwtConfig {
            secret: config.auth.session_secret.clone(),
            session_ttl: chrono::Duration::days(config.auth.session_ttl_days),
            ..JwtConfig::default()
        });
        let gate = SessionGate::new(jwt, credentials, config.auth.secure_cookie);

        let store = ManualStore::new(api, &config.notion.database_id);
        let scrubber = Scrubber::new(&config.notion.api_key, &config.notion.database_id);

        Ok(Self::new(
            config.server.clone(),
            Arc::new(AppState::new(store, scrubber)),
            Arc::new(gate),
        ))
    }

    /// Build the combined router with all endpoints
    fn build_router(
        config: &ServerSettings,
        app: Arc<AppState>,
        gate: Arc<SessionGate>,
    ) -> Router {
        // Configure CORS from config
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            use tower_http::cors::AllowOrigin;
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let protected = Router::new()
            .merge(manual_routes(app.clone()))
            .merge(upload_routes(app))
            .route_layer(middleware::from_fn_with_state(gate.clone(), require_session));

        Router::new()
            .route("/health", get(health_handler))
            .merge(auth_routes(gate))
            .merge(protected)
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "manuals API listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server stopped");
        Ok(())
    }
}

async fn health_handler() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::hash_password;
    use crate::notion::InMemoryNotion;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const DB: &str = "0123456789abcdef0123456789abcdef";

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.notion.api_key = "secret_test_key".to_string();
        config.notion.database_id = DB.to_string();
        config.auth.allowed_email = "owner@example.com".to_string();
        config.auth.password_hash = Some(hash_password("hunter22").unwrap());
        config.auth.session_secret = "router-test-secret".to_string();
        config
    }

    fn router() -> Router {
        let notion = Arc::new(InMemoryNotion::with_database(DB));
        HttpServer::assemble(&config(), notion).unwrap().router()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn sign_in(router: &Router) -> String {
        let response = router
            .clone()
            .oneshot(
                Request::post("/auth/signin")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"email": "owner@example.com", "password": "hunter22"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    #[test]
    fn test_server_with_custom_port() {
        let mut config = config();
        config.server.port = 8080;
        let notion = Arc::new(InMemoryNotion::with_database(DB));
        let server = HttpServer::assemble(&config, notion).unwrap();
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_assemble_requires_password_hash() {
        let mut config = config();
        config.auth.password_hash = None;
        let notion = Arc::new(InMemoryNotion::with_database(DB));
        assert!(HttpServer::assemble(&config, notion).is_err());
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_gate_redirects_with_callback() {
        let response = router()
            .oneshot(
                Request::get("/manuals?view=grid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/signin?callbackUrl=%2Fmanuals%3Fview%3Dgrid"
        );
    }

    #[tokio::test]
    async fn test_signed_in_crud() {
        let router = router();
        let cookie = sign_in(&router).await;

        let response = router
            .clone()
            .oneshot(
                Request::post("/manuals")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"name": "Kettle", "category": "Kitchen"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["success"], true);
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(
                Request::get("/manuals")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed["data"][0]["name"], "Kettle");

        let response = router
            .clone()
            .oneshot(
                Request::delete(format!("/manuals/{id}"))
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "data": null})
        );
    }

    #[tokio::test]
    async fn test_validation_and_malformed_json_are_400() {
        let router = router();
        let cookie = sign_in(&router).await;

        let response = router
            .clone()
            .oneshot(
                Request::post("/manuals")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"name": "   "}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "Product name is required"})
        );

        let response = router
            .oneshot(
                Request::post("/manuals")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"name\":"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_missing_manual_is_500_without_secrets() {
        let router = router();
        let cookie = sign_in(&router).await;

        let response = router
            .oneshot(
                Request::get("/manuals/does-not-exist")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await.to_string();
        assert!(!body.contains(DB));
        assert!(!body.contains("secret_test_key"));
    }

    #[tokio::test]
    async fn test_sign_in_failure_is_generic() {
        let response = router()
            .oneshot(
                Request::post("/auth/signin")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"email": "owner@example.com", "password": "nope"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(
            body_json(response).await["error"],
            "Invalid email or password"
        );
    }

    #[tokio::test]
    async fn test_session_endpoint() {
        let router = router();

        let response = router
            .clone()
            .oneshot(Request::get("/auth/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "data": null})
        );

        let cookie = sign_in(&router).await;
        let response = router
            .oneshot(
                Request::get("/auth/session")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await["data"]["email"],
            "owner@example.com"
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let router = router();
        let cookie = sign_in(&router).await;

        let response = router
            .oneshot(
                Request::post("/upload")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"imageData": "data:text/plain;base64,QQ==", "fileName": "a.txt"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid image format");
    }
}
