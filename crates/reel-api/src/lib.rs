//! Axum HTTP API server.
//!
//! This crate provides:
//! - Multipart job submission and status polling
//! - Byte-range streaming and download of finished reels
//! - Public artifact serving for the publish fallback URL
//! - Health/readiness probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
