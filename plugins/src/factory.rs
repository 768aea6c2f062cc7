use std::sync::Arc;

use anyhow::{Context, Result};

use uvsync_core::api::{AppConfig, Secrets, SyncContext, VectorConfig};

use crate::bigquery::BigQueryWarehouse;
use crate::pinecone::{resolve_host, PineconeIndex};
use crate::supabase::{SupabaseClient, SupabasePairLoader};

/// Connect every backend named by `cfg` and bundle the handles for a run.
pub async fn build_context(cfg: &AppConfig, secrets: &Secrets) -> Result<SyncContext> {
    let items = build_index(
        &cfg.vector,
        &cfg.vector.items_index,
        cfg.vector.items_host.as_deref(),
        &secrets.vector_api_key,
    )
    .await
    .context("items index")?;
    let user_vectors = build_index(
        &cfg.vector,
        &cfg.vector.user_vectors_index,
        cfg.vector.user_vectors_host.as_deref(),
        &secrets.vector_api_key,
    )
    .await
    .context("user-vectors index")?;

    let warehouse = Arc::new(
        BigQueryWarehouse::connect(&secrets.warehouse_credentials, &cfg.warehouse)
            .await
            .context("warehouse")?,
    );

    let relational = SupabaseClient::new(
        &secrets.relational_url,
        secrets.relational_key.clone(),
        cfg.relational.timeout_ms,
        cfg.relational.page_size,
    )
    .context("relational store")?;
    let pair_loader = SupabasePairLoader::new(relational.clone(), cfg.relational.table_id.clone());

    Ok(SyncContext {
        row_source: warehouse.clone(),
        fetcher: Arc::new(items),
        vector_sink: Arc::new(user_vectors),
        warehouse_sink: warehouse,
        relational_sink: Arc::new(relational),
        pair_loader: Arc::new(pair_loader),
        targets: cfg.targets(),
    })
}

async fn build_index(
    cfg: &VectorConfig,
    index_name: &str,
    host: Option<&str>,
    api_key: &str,
) -> Result<PineconeIndex> {
    let host = match host.filter(|h| !h.trim().is_empty()) {
        Some(h) => h.to_string(),
        None => resolve_host(&cfg.control_plane_url, index_name, api_key, cfg.timeout_ms).await?,
    };
    PineconeIndex::new(
        &host,
        api_key.to_string(),
        cfg.timeout_ms,
        cfg.fetch_batch_size,
        cfg.upsert_batch_size,
    )
}
