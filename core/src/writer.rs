//! Commits prepared records to the three sinks in a fixed order.
//!
//! Order is vector index, then warehouse, then relational mirror, and the
//! first failing sink stops the chain. A relational row is therefore only
//! written once its vector and audit row exist. Nothing is rolled back: a
//! failed warehouse insert leaves the upserted vectors in place, and the
//! user is retried in full on the next run because the pair filter reads
//! the relational table.

use crate::context::SyncContext;
use crate::models::PreparedRecords;

/// How far a user's write got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing to write; no sink was called.
    Empty,
    VectorFailed,
    WarehouseFailed,
    /// Relational sink reached; rows it reported as persisted.
    Persisted(usize),
}

impl WriteOutcome {
    /// Rows to report as durably inserted.
    pub fn inserted(self) -> usize {
        match self {
            WriteOutcome::Persisted(n) => n,
            _ => 0,
        }
    }
}

pub async fn write_records(
    ctx: &SyncContext,
    namespace: &str,
    records: &PreparedRecords,
) -> WriteOutcome {
    if records.is_empty() {
        return WriteOutcome::Empty;
    }

    let targets = &ctx.targets;

    if !ctx.vector_sink.upsert(records.vectors(), namespace).await {
        tracing::warn!(
            target: "uvsync.writer",
            stage = "writer.vector.failed",
            namespace = %namespace,
            rows = records.len()
        );
        return WriteOutcome::VectorFailed;
    }

    if !ctx
        .warehouse_sink
        .insert(
            &targets.warehouse_dataset_id,
            &targets.warehouse_table_id,
            records.warehouse_rows(),
        )
        .await
    {
        tracing::warn!(
            target: "uvsync.writer",
            stage = "writer.warehouse.failed",
            namespace = %namespace,
            rows = records.len()
        );
        return WriteOutcome::WarehouseFailed;
    }

    let persisted = ctx
        .relational_sink
        .upsert(&targets.relational_table_id, records.relational_rows())
        .await;

    tracing::debug!(
        target: "uvsync.writer",
        stage = "writer.out",
        namespace = %namespace,
        rows = records.len(),
        persisted
    );

    WriteOutcome::Persisted(persisted)
}
