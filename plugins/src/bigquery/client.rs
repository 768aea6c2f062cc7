use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use gcp_bigquery_client::error::BQError;
use gcp_bigquery_client::yup_oauth2::ServiceAccountKey;
use serde_json::{Map, Value};
use uvsync_core::api::{
    group_by_user, InteractionRow, RowSource, SinkErrorKind, UserRows, WarehouseConfig,
    WarehouseRow, WarehouseSink,
};

use super::api::{connect_client, GcpWarehouseApi, JobHandle, WarehouseApi};
use super::query::build_interaction_query;

const PRIVATE_KEY: &str = "private_key";
const PROJECT_ID: &str = "project_id";

/// Interaction row source and audit-row sink over one project.
pub struct BigQueryWarehouse {
    api: Arc<dyn WarehouseApi>,
    project_id: String,
    cfg: WarehouseConfig,
}

impl BigQueryWarehouse {
    pub async fn connect(
        credentials: &Map<String, Value>,
        cfg: &WarehouseConfig,
    ) -> anyhow::Result<Self> {
        let project_id = resolve_project_id(credentials, cfg)?;
        let client = connect_client(service_account_key(credentials)?).await?;
        tracing::info!(
            target: "uvsync.warehouse",
            stage = "warehouse.connected",
            project = %project_id,
            dataset = %cfg.dataset_id
        );
        let api = GcpWarehouseApi::new(client, project_id.clone(), cfg.timeout_ms);
        Ok(Self::with_api(Arc::new(api), project_id, cfg))
    }

    pub fn with_api(api: Arc<dyn WarehouseApi>, project_id: String, cfg: &WarehouseConfig) -> Self {
        Self {
            api,
            project_id,
            cfg: cfg.clone(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Run the interaction query to completion and read every result page.
    pub async fn query_rows(&self) -> anyhow::Result<Vec<InteractionRow>> {
        let sql = build_interaction_query(&self.project_id, &self.cfg);
        tracing::debug!(
            target: "uvsync.warehouse",
            stage = "warehouse.query.in",
            limit = ?self.cfg.limit,
            page = ?self.cfg.page
        );

        let mut page = self.api.query(&sql).await?;
        let mut job: Option<JobHandle> = None;
        let mut rows = Vec::new();
        let mut pages = 0usize;

        loop {
            if page.job.is_some() {
                job = page.job.take();
            }
            let current = job
                .as_ref()
                .context("warehouse returned no job reference to continue from");

            if !page.complete {
                let current = current?;
                tracing::debug!(
                    target: "uvsync.warehouse",
                    stage = "warehouse.query.wait",
                    job_id = %current.job_id
                );
                page = self.api.query_results(current, None).await?;
                continue;
            }

            pages += 1;
            rows.extend(page.rows.drain(..).filter_map(interaction_row));

            let Some(token) = page.page_token.take() else {
                break;
            };
            page = self.api.query_results(current?, Some(token.as_str())).await?;
        }

        tracing::debug!(
            target: "uvsync.warehouse",
            stage = "warehouse.query.out",
            pages,
            rows = rows.len()
        );
        Ok(rows)
    }
}

#[async_trait]
impl RowSource for BigQueryWarehouse {
    async fn load_users(&self) -> anyhow::Result<Vec<UserRows>> {
        let rows = self.query_rows().await?;
        Ok(group_by_user(rows))
    }
}

#[async_trait]
impl WarehouseSink for BigQueryWarehouse {
    /// `true` iff the table accepted every row.
    async fn insert(&self, dataset_id: &str, table_id: &str, rows: &[WarehouseRow]) -> bool {
        if rows.is_empty() {
            return false;
        }
        match self.api.insert_all(dataset_id, table_id, rows).await {
            Ok(0) => true,
            Ok(rejected) => {
                tracing::warn!(
                    target: "uvsync.warehouse",
                    stage = "warehouse.insert.rejected",
                    table = %format!("{}.{}", dataset_id, table_id),
                    kind = %SinkErrorKind::Schema,
                    rejected,
                    rows = rows.len()
                );
                false
            }
            Err(e) => {
                let kind = e
                    .downcast_ref::<BQError>()
                    .map(classify)
                    .unwrap_or(SinkErrorKind::Unknown);
                tracing::warn!(
                    target: "uvsync.warehouse",
                    stage = "warehouse.insert.failed",
                    table = %format!("{}.{}", dataset_id, table_id),
                    kind = %kind,
                    transient = kind.is_transient(),
                    error = %format!("{:#}", e)
                );
                false
            }
        }
    }
}

pub(crate) fn classify(err: &BQError) -> SinkErrorKind {
    match err {
        BQError::RequestError(e) if e.is_timeout() => SinkErrorKind::Timeout,
        BQError::RequestError(e) => match e.status() {
            Some(status) => SinkErrorKind::from_status(status.as_u16()),
            None => SinkErrorKind::Network,
        },
        BQError::ResponseError { error } => u16::try_from(error.error.code)
            .map(SinkErrorKind::from_status)
            .unwrap_or(SinkErrorKind::Unknown),
        BQError::SerializationError(_) => SinkErrorKind::Decode,
        _ => SinkErrorKind::Unknown,
    }
}

/// Service-account key with `\n` escapes in the private key restored.
pub(crate) fn service_account_key(
    credentials: &Map<String, Value>,
) -> anyhow::Result<ServiceAccountKey> {
    let mut creds = credentials.clone();
    if let Some(Value::String(pk)) = creds.get_mut(PRIVATE_KEY) {
        *pk = pk.replace("\\n", "\n");
    }
    serde_json::from_value(Value::Object(creds)).context("invalid service account credentials")
}

pub(crate) fn resolve_project_id(
    credentials: &Map<String, Value>,
    cfg: &WarehouseConfig,
) -> anyhow::Result<String> {
    if let Some(id) = cfg.project_id.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(id.to_string());
    }
    credentials
        .get(PROJECT_ID)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .context("no warehouse project id in config or credentials")
}

/// Decode one result row; rows missing an id column are dropped.
pub(crate) fn interaction_row(record: Map<String, Value>) -> Option<InteractionRow> {
    match serde_json::from_value::<InteractionRow>(Value::Object(record)) {
        Ok(row) => Some(row),
        Err(e) => {
            tracing::warn!(
                target: "uvsync.warehouse",
                stage = "warehouse.row.skipped",
                error = %e
            );
            None
        }
    }
}
