//! leserve - HTTP Search Server
//!
//! *Le Serve* (The Server) - Axum-based search and recommendation service
//! over the lerecherche core

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// API error types
pub mod error;

/// HTTP handlers for REST endpoints
pub mod handlers;

/// Server configuration from TOML and environment
pub mod config;

/// Request text sanitation and validation
pub mod validate;

/// Response cache
pub mod cache;

/// Per-client rate limiting
pub mod limiter;

/// API response types
pub mod responses;

/// Server instance management
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use handlers::{create_router, AppState};
pub use server::{LeServeServer, ServerError};
