//! Link service
//!
//! Maintains many-to-many link documents between journal entries and their
//! linked targets. All documents for one owner live in the same partition,
//! and every multi-document mutation is submitted as a single atomic batch
//! against that partition: either every operation commits or none do.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
