//! # FreyaAI Common Library
//!
//! Shared code for the FreyaAI gateway crates including:
//! - API request/response types exchanged with the external backends
//! - Configuration resolution (CLI, environment, TOML, compiled defaults)
//! - Error types
//! - Cancellable periodic task used by the capture loop

pub mod api;
pub mod config;
pub mod error;
pub mod periodic;

pub use error::{Error, Result};
pub use periodic::PeriodicTask;
