//! The three warehouse REST calls the sync makes, behind a seam so the
//! paging and insert contracts can be exercised without a live project.

use anyhow::Context;
use async_trait::async_trait;
use gcp_bigquery_client::error::BQError;
use gcp_bigquery_client::model::get_query_results_parameters::GetQueryResultsParameters;
use gcp_bigquery_client::model::job_reference::JobReference;
use gcp_bigquery_client::model::query_request::QueryRequest;
use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;
use gcp_bigquery_client::model::table_row::TableRow;
use gcp_bigquery_client::model::table_schema::TableSchema;
use gcp_bigquery_client::Client;
use serde_json::{Map, Value};
use uvsync_core::api::WarehouseRow;

/// Query job to poll or page through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: String,
    pub location: Option<String>,
}

/// One response of `jobs.query` or `jobs.getQueryResults`, rows keyed by column.
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub complete: bool,
    pub job: Option<JobHandle>,
    pub rows: Vec<Map<String, Value>>,
    pub page_token: Option<String>,
}

#[async_trait]
pub trait WarehouseApi: Send + Sync {
    /// Start `sql`; the first page comes back if the job finishes in time.
    async fn query(&self, sql: &str) -> anyhow::Result<QueryPage>;

    /// Wait on `job` (no token) or read the page at `page_token`.
    async fn query_results(
        &self,
        job: &JobHandle,
        page_token: Option<&str>,
    ) -> anyhow::Result<QueryPage>;

    /// `insertAll`; returns the number of rows the table rejected.
    async fn insert_all(
        &self,
        dataset_id: &str,
        table_id: &str,
        rows: &[WarehouseRow],
    ) -> anyhow::Result<usize>;
}

/// [`WarehouseApi`] over `gcp-bigquery-client`.
pub struct GcpWarehouseApi {
    client: Client,
    project_id: String,
    timeout_ms: i32,
}

impl GcpWarehouseApi {
    pub fn new(client: Client, project_id: String, timeout_ms: u64) -> Self {
        Self {
            client,
            project_id,
            timeout_ms: i32::try_from(timeout_ms).unwrap_or(i32::MAX),
        }
    }
}

#[async_trait]
impl WarehouseApi for GcpWarehouseApi {
    async fn query(&self, sql: &str) -> anyhow::Result<QueryPage> {
        let mut request = QueryRequest::new(sql);
        request.timeout_ms = Some(self.timeout_ms);
        let resp = self
            .client
            .job()
            .query(&self.project_id, request)
            .await
            .map_err(|e| wrap("interaction query failed", e))?;
        Ok(page_from_parts(
            resp.job_complete,
            resp.job_reference,
            resp.schema,
            resp.rows,
            resp.page_token,
        ))
    }

    async fn query_results(
        &self,
        job: &JobHandle,
        page_token: Option<&str>,
    ) -> anyhow::Result<QueryPage> {
        let params = GetQueryResultsParameters {
            location: job.location.clone(),
            page_token: page_token.map(str::to_string),
            timeout_ms: Some(self.timeout_ms),
            ..Default::default()
        };
        let resp = self
            .client
            .job()
            .get_query_results(&self.project_id, &job.job_id, params)
            .await
            .map_err(|e| wrap("reading query results failed", e))?;
        Ok(page_from_parts(
            resp.job_complete,
            resp.job_reference,
            resp.schema,
            resp.rows,
            resp.page_token,
        ))
    }

    async fn insert_all(
        &self,
        dataset_id: &str,
        table_id: &str,
        rows: &[WarehouseRow],
    ) -> anyhow::Result<usize> {
        let mut request = TableDataInsertAllRequest::new();
        for row in rows {
            request
                .add_row(Some(row.id.clone()), row)
                .map_err(|e| wrap("failed to encode audit row", e))?;
        }
        let resp = self
            .client
            .tabledata()
            .insert_all(&self.project_id, dataset_id, table_id, request)
            .await
            .map_err(|e| wrap("insertAll request failed", e))?;
        Ok(resp.insert_errors.map(|errors| errors.len()).unwrap_or(0))
    }
}

fn wrap(what: &'static str, err: BQError) -> anyhow::Error {
    anyhow::Error::new(err).context(what)
}

fn page_from_parts(
    job_complete: Option<bool>,
    job_reference: Option<JobReference>,
    schema: Option<TableSchema>,
    rows: Option<Vec<TableRow>>,
    page_token: Option<String>,
) -> QueryPage {
    let columns: Vec<String> = schema
        .and_then(|s| s.fields)
        .map(|fields| fields.into_iter().map(|f| f.name).collect())
        .unwrap_or_default();

    let rows = rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            let mut record = Map::new();
            let cells = row.columns.unwrap_or_default();
            for (name, cell) in columns.iter().zip(cells) {
                match cell.value {
                    Some(Value::Null) | None => {}
                    Some(value) => {
                        record.insert(name.clone(), value);
                    }
                }
            }
            record
        })
        .collect();

    let job = job_reference.and_then(|r| {
        r.job_id.map(|job_id| JobHandle {
            job_id,
            location: r.location,
        })
    });

    QueryPage {
        complete: job_complete.unwrap_or(true),
        job,
        rows,
        page_token: page_token.filter(|t| !t.is_empty()),
    }
}

pub async fn connect_client(
    key: gcp_bigquery_client::yup_oauth2::ServiceAccountKey,
) -> anyhow::Result<Client> {
    Client::from_service_account_key(key, false)
        .await
        .context("failed to create warehouse client from service account")
}
