//! Mapping storage subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     urls.json (optional) → persistence.rs (parse & validate)
//!     → PathStore::extend (or built-in defaults)
//!
//! Runtime:
//!     POST /add → PathStore::add
//!     GET /{path} → PathStore::lookup
//!     GET /mappings → PathStore::snapshot
//!
//! Shutdown (opt-in):
//!     PathStore::snapshot → persistence.rs → urls.json
//! ```

pub mod path_store;
pub mod persistence;

pub use path_store::PathStore;
pub use persistence::{bootstrap, default_mappings, load_mappings, save_mappings, BootstrapSource, MappingFileError};
