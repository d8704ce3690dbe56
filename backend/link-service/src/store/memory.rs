//! In-process partition writer with genuine all-or-nothing batches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

use async_trait::async_trait;

use super::{AtomicPartitionWriter, BatchOp, BatchOutcome, StoreError};
use crate::models::LinkDocument;

const NO_INJECTED_FAILURE: usize = usize::MAX;

/// In-memory backend for [`AtomicPartitionWriter`].
///
/// Each partition is staged before commit: every operation is validated
/// against a working copy and the copy replaces the partition only if all of
/// them succeed. The partition map is guarded by a single async mutex, which
/// is held across no await points other than the map access itself.
pub struct MemoryPartitionWriter {
    partitions: Mutex<HashMap<String, Vec<LinkDocument>>>,
    // Test hook: index of the op the next submit must fail, if any.
    fail_op_index: AtomicUsize,
}

impl Default for MemoryPartitionWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPartitionWriter {
    pub fn new() -> Self {
        Self {
            partitions: Mutex::new(HashMap::new()),
            fail_op_index: AtomicUsize::new(NO_INJECTED_FAILURE),
        }
    }

    /// Make the next submitted batch fail at op `index` with a store fault.
    ///
    /// The batch is cleanly rejected; nothing is written. Used by tests to
    /// exercise the all-or-nothing guarantee.
    pub fn inject_failure_at(&self, index: usize) {
        self.fail_op_index.store(index, Ordering::SeqCst);
    }
}

#[async_trait]
impl AtomicPartitionWriter for MemoryPartitionWriter {
    async fn submit(
        &self,
        partition_key: &str,
        ops: Vec<BatchOp>,
    ) -> Result<BatchOutcome, StoreError> {
        let injected = self.fail_op_index.swap(NO_INJECTED_FAILURE, Ordering::SeqCst);

        let mut partitions = self.partitions.lock().await;
        let current = partitions.entry(partition_key.to_string()).or_default();

        // Stage every op against a working copy; commit by swapping it in.
        let mut staged = current.clone();
        let mut statuses = Vec::with_capacity(ops.len());
        let mut failed = false;

        for (index, op) in ops.iter().enumerate() {
            if failed {
                // Sibling already failed; remaining ops never execute.
                statuses.push(424);
                continue;
            }

            if index == injected {
                statuses.push(500);
                failed = true;
                continue;
            }

            match op {
                BatchOp::Create(doc) => {
                    let conflict = staged
                        .iter()
                        .any(|d| d.id == doc.id || d.target_id == doc.target_id);
                    if conflict {
                        statuses.push(409);
                        failed = true;
                    } else {
                        staged.push(doc.clone());
                        statuses.push(201);
                    }
                }
                BatchOp::Delete { id } => {
                    if let Some(pos) = staged.iter().position(|d| &d.id == id) {
                        staged.remove(pos);
                        statuses.push(204);
                    } else {
                        statuses.push(404);
                        failed = true;
                    }
                }
            }
        }

        if failed {
            debug!(
                partition = partition_key,
                ?statuses,
                "batch rejected, partition unchanged"
            );
            return Ok(BatchOutcome {
                committed: false,
                statuses,
            });
        }

        *current = staged;
        Ok(BatchOutcome {
            committed: true,
            statuses,
        })
    }

    async fn read_partition(&self, partition_key: &str) -> Result<Vec<LinkDocument>, StoreError> {
        let partitions = self.partitions.lock().await;
        Ok(partitions.get(partition_key).cloned().unwrap_or_default())
    }
}
