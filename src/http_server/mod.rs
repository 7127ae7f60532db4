//! # HTTP Server Module
//!
//! Axum server exposing the manuals API.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/auth/*` - Sign-in, sign-out, session lookup
//! - `/manuals`, `/manuals/:id` - Manual CRUD (session required)
//! - `/upload` - Image upload (session required)

pub mod auth_routes;
pub mod errors;
pub mod manual_routes;
pub mod response;
pub mod server;
pub mod state;
pub mod upload_routes;

pub use errors::{ApiError, ApiJson};
pub use response::ApiResponse;
pub use server::HttpServer;
pub use state::AppState;
