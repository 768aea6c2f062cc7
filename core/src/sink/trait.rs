//! Seams to the external systems a sync run talks to.
//!
//! Fetch-style collaborators return `anyhow::Result` and let failures
//! propagate. Sinks swallow their own failures (after logging them with a
//! [`crate::error::SinkErrorKind`]) and report a plain outcome.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::models::{RelationalRow, UserRows, Vector, VectorRecord, WarehouseRow};

/// Warehouse rows still to be vectorized, grouped by user.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn load_users(&self) -> anyhow::Result<Vec<UserRows>>;
}

/// Point-id lookup against the item vector index.
#[async_trait]
pub trait VectorFetcher: Send + Sync {
    /// Response order is not guaranteed to follow `point_ids`. An empty
    /// request yields an empty response.
    async fn fetch(&self, point_ids: &[String]) -> anyhow::Result<Vec<Vector>>;
}

/// Upsert into the user vector index.
#[async_trait]
pub trait VectorSink: Send + Sync {
    /// `false` on failure or when `records` is empty.
    async fn upsert(&self, records: &[VectorRecord], namespace: &str) -> bool;
}

/// Batch insert into the warehouse audit table.
#[async_trait]
pub trait WarehouseSink: Send + Sync {
    /// `true` iff the insert reported no row-level errors.
    async fn insert(&self, dataset_id: &str, table_id: &str, rows: &[WarehouseRow]) -> bool;
}

/// Upsert into the relational mirror table.
#[async_trait]
pub trait RelationalSink: Send + Sync {
    /// Number of rows durably written.
    async fn upsert(&self, table_id: &str, rows: &[RelationalRow]) -> usize;
}

/// One-shot read of the `(user_id, item_id)` pairs already mirrored.
#[async_trait]
pub trait PairIndexLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<HashSet<(String, String)>>;
}
