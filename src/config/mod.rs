//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RedirectConfig (validated, immutable)
//!
//! Mapping file change:
//!     watcher.rs detects change
//!     → store::load_mappings parses & validates
//!     → MappingUpdate sent to the running server
//!     → server applies it to the PathStore in one batch
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only mappings reload at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, MappingsConfig, ObservabilityConfig, RedirectConfig, SecurityConfig, TimeoutConfig,
    TlsConfig,
};
pub use watcher::{MappingUpdate, MappingWatcher};
