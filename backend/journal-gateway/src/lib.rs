//! Journal gateway (orchestrator)
//!
//! Composes the journal, link, task and user services without a shared
//! database or a distributed transaction coordinator:
//!
//! - [`saga`]: creates an entry in the journal service, links it to targets
//!   via the link service, and compensates by deleting the entry when the
//!   link step fails.
//! - [`dashboard`]: a read-through, TTL-bounded cache over a composed
//!   per-subject read model, plus a tagged response cache.
//! - [`invalidation`]: consumes subject change events from the bus and
//!   evicts both caches; at-least-once delivery, idempotent handler.
//! - [`prober`]: a scheduled task probing downstream liveness; failures are
//!   logged, never escalated.

pub mod clients;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod invalidation;
pub mod prober;
pub mod saga;

pub use config::Config;
pub use error::{GatewayError, Result};
