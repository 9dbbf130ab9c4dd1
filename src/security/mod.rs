//! Security hardening subsystem.
//!
//! # Design Decisions
//! - Body limit applied to every route, including the redirect fallback
//! - Header layers never overwrite a header a handler already set

pub mod headers;
pub mod limits;
