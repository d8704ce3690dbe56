//! Partition-scoped atomic storage for link documents.
//!
//! [`AtomicPartitionWriter`] is the capability the link store needs from its
//! backing store: submit a set of operations against one partition and have
//! them commit or fail as a unit. Any engine offering a partition-scoped
//! atomic multi-write (a document store's transactional batch, a relational
//! single-partition transaction, an embedded KV batch) can implement it.
//!
//! The service ships with [`MemoryPartitionWriter`], an in-process backend
//! used in development and tests. Durable persistence is an integration
//! concern behind the same trait.

mod link_store;
mod memory;

pub use link_store::LinkStore;
pub use memory::MemoryPartitionWriter;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::LinkDocument;

/// One operation inside an atomic batch.
///
/// Operations execute in the insertion order of the submitted collection;
/// the store never reorders them.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Create(LinkDocument),
    Delete { id: String },
}

/// Per-operation status code, HTTP-style.
///
/// 201 created, 204 deleted, 404 missing delete target, 409 conflicting
/// create, 424 aborted because a sibling operation failed, 500 store fault.
pub type OpStatusCode = u16;

/// Outcome of an atomic batch submission.
///
/// `committed == false` means the store cleanly rejected the whole batch and
/// wrote nothing; `statuses` carries the per-operation codes for diagnosis.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub committed: bool,
    pub statuses: Vec<OpStatusCode>,
}

/// Storage errors that are not clean batch rejections
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network-level failure; the batch outcome is unknown to the caller
    #[error("transport error: {0}")]
    Transport(String),
}

/// Capability: atomic multi-operation writes scoped to one partition.
#[async_trait]
pub trait AtomicPartitionWriter: Send + Sync {
    /// Submit `ops` as a single all-or-nothing batch against `partition_key`.
    ///
    /// A clean rejection returns `Ok` with `committed == false`; only
    /// transport-level faults are errors.
    async fn submit(
        &self,
        partition_key: &str,
        ops: Vec<BatchOp>,
    ) -> Result<BatchOutcome, StoreError>;

    /// Read every document in the partition; empty when none exist.
    async fn read_partition(&self, partition_key: &str) -> Result<Vec<LinkDocument>, StoreError>;
}
