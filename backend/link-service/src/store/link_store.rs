//! Link set maintenance with all-or-nothing semantics per owner.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::{AtomicPartitionWriter, BatchOp, StoreError};
use crate::error::{AppError, Result};
use crate::models::LinkDocument;

/// Maintains the set of links per owning aggregate.
///
/// Every mutation is one atomic batch against the owner's partition: the
/// caller observes either a fully applied link set or an unchanged one.
/// Per-operation status codes are logged for diagnosis; callers only see a
/// single verdict.
pub struct LinkStore<W> {
    writer: W,
}

impl<W: AtomicPartitionWriter> LinkStore<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Access the underlying writer (test hooks live there).
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Create one link per target id as a single atomic batch.
    ///
    /// `target_ids` is a set: de-duplication is the caller's contract, the
    /// input type enforces it. Either every document is durably created and
    /// returned, or none are and the call fails.
    pub async fn create_links(
        &self,
        owner_id: &str,
        target_ids: &BTreeSet<String>,
    ) -> Result<Vec<LinkDocument>> {
        if target_ids.is_empty() {
            return Err(AppError::BadRequest("target_ids must not be empty".into()));
        }

        let docs: Vec<LinkDocument> = target_ids
            .iter()
            .map(|target| LinkDocument::new(owner_id, target.clone()))
            .collect();

        let ops = docs.iter().cloned().map(BatchOp::Create).collect();
        let outcome = self.writer.submit(owner_id, ops).await?;

        if !outcome.committed {
            warn!(
                owner_id,
                statuses = ?outcome.statuses,
                "link creation batch rejected"
            );
            return Err(AppError::BatchRejected(format!(
                "link creation for owner {} rejected",
                owner_id
            )));
        }

        info!(owner_id, count = docs.len(), "links created");
        Ok(docs)
    }

    /// Read the owner's full link set; empty when none exist.
    pub async fn get_links(&self, owner_id: &str) -> Result<Vec<LinkDocument>> {
        Ok(self.writer.read_partition(owner_id).await?)
    }

    /// Remove `remove` targets and add `add` targets in one atomic batch.
    ///
    /// Returns `Ok(false)` on a clean batch rejection so the caller can
    /// decide whether to retry; transport-level faults propagate as errors.
    pub async fn rearrange_links(
        &self,
        owner_id: &str,
        remove: &BTreeSet<String>,
        add: &BTreeSet<String>,
    ) -> Result<bool> {
        let current = self.writer.read_partition(owner_id).await?;

        // Deletions first, then creations, in the input collections' order.
        let mut ops: Vec<BatchOp> = Vec::with_capacity(remove.len() + add.len());
        for target in remove {
            match current.iter().find(|d| &d.target_id == target) {
                Some(doc) => ops.push(BatchOp::Delete { id: doc.id.clone() }),
                None => {
                    debug!(owner_id, target, "rearrange removal target not linked, skipping");
                }
            }
        }
        for target in add {
            ops.push(BatchOp::Create(LinkDocument::new(owner_id, target.clone())));
        }

        if ops.is_empty() {
            return Ok(true);
        }

        let outcome = match self.writer.submit(owner_id, ops).await {
            Ok(outcome) => outcome,
            Err(e @ StoreError::Transport(_)) => return Err(e.into()),
        };

        if !outcome.committed {
            warn!(
                owner_id,
                statuses = ?outcome.statuses,
                "rearrange batch rejected"
            );
            return Ok(false);
        }

        info!(
            owner_id,
            removed = remove.len(),
            added = add.len(),
            "links rearranged"
        );
        Ok(true)
    }
}
