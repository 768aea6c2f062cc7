//! Warehouse access: the interaction row source and the audit-row sink.

mod api;
mod client;
mod query;

pub use api::{GcpWarehouseApi, JobHandle, QueryPage, WarehouseApi};
pub use client::BigQueryWarehouse;
pub use query::build_interaction_query;
