//! Journal service (entry-owner service)
//!
//! Owns journal entries and publishes a subject change event after every
//! committed mutation, feeding the gateway's cache invalidation pipeline.
//! The persistence layer here is a thin boundary: an in-memory repository
//! whose write path returns post-commit effects for the caller to run.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repo;

pub use config::Config;
pub use error::{AppError, Result};
