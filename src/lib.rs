//! Path-based redirect service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;

pub use config::RedirectConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::PathStore;
