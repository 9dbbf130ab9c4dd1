//! Client for the redirect service HTTP API.

pub mod client;

pub use client::{ClientError, RedirectClient, Resolution};
