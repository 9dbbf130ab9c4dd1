//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → /add, /mappings, /healthz → handlers.rs
//!     → anything else → handlers::redirect → PathStore::lookup
//!     → error.rs (ApiError → status + text body)
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
