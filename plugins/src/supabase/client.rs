use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uvsync_core::api::{Metadata, PairIndexLoader, RelationalRow, RelationalSink};

use crate::http::{self, error_kind};

const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";
const PREFER_INSERT: &str = "return=minimal";
const PREFER_COUNT: &str = "count=exact";

#[derive(Clone)]
pub struct SupabaseClient {
    key: String,
    http: reqwest::Client,
    rest_url: String,
    page_size: usize,
}

impl SupabaseClient {
    pub fn new(base_url: &str, key: String, timeout_ms: u64, page_size: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(!key.trim().is_empty(), "missing relational service key");
        Ok(Self {
            key,
            http: http::build_client(timeout_ms)?,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            page_size: page_size.max(1),
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.key).bearer_auth(&self.key)
    }

    fn table_url(&self, table_id: &str) -> String {
        format!("{}/{}", self.rest_url, table_id)
    }

    /// One batch upsert. Returns the number of rows echoed back.
    pub async fn upsert_rows(&self, table_id: &str, rows: &[RelationalRow]) -> anyhow::Result<usize> {
        let url = self.table_url(table_id);
        tracing::debug!(
            target: "uvsync.relational",
            stage = "relational.http.upsert.in",
            url = %url,
            rows = rows.len()
        );
        let req = self
            .auth(self.http.post(&url))
            .header("Prefer", PREFER_UPSERT)
            .json(rows);
        let resp = http::send(req, &url).await?;
        let echoed: Vec<Value> = http::parse_json(resp).await?;
        tracing::debug!(
            target: "uvsync.relational",
            stage = "relational.http.upsert.out",
            persisted = echoed.len()
        );
        Ok(echoed.len())
    }

    pub async fn insert_row(&self, table_id: &str, row: &RelationalRow) -> anyhow::Result<()> {
        let url = self.table_url(table_id);
        let req = self
            .auth(self.http.post(&url))
            .header("Prefer", PREFER_INSERT)
            .json(row);
        let resp = http::send(req, &url).await?;
        http::ensure_success(resp).await
    }

    /// Every distinct `(user_id, item_id)` pair in `table_id`, read in pages
    /// of up to `page_size` rows. The server may cap a page below that, so
    /// paging stops on the `Content-Range` total or on an empty page.
    pub async fn select_pairs(&self, table_id: &str) -> anyhow::Result<HashSet<(String, String)>> {
        let url = self.table_url(table_id);
        let mut pairs = HashSet::new();
        let mut offset = 0usize;

        loop {
            let range = format!("{}-{}", offset, offset + self.page_size - 1);
            let req = self
                .auth(self.http.get(&url))
                .query(&[("select", "user_id,item_id")])
                .header("Prefer", PREFER_COUNT)
                .header("Range-Unit", "items")
                .header("Range", range);
            let resp = http::send(req, &url).await?;
            let total = resp
                .headers()
                .get(reqwest::header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(content_range_total);
            let page: Vec<Map<String, Value>> = http::parse_json(resp).await?;
            if page.is_empty() {
                break;
            }
            offset += page.len();

            for row in page {
                let row = Metadata::from(row);
                if let (Some(user_id), Some(item_id)) = (row.user_id(), row.item_id()) {
                    pairs.insert((user_id, item_id));
                }
            }

            if total.is_some_and(|total| offset >= total) {
                break;
            }
        }

        tracing::debug!(
            target: "uvsync.relational",
            stage = "relational.pairs.out",
            rows = offset,
            pairs = pairs.len()
        );
        Ok(pairs)
    }
}

/// Total from a `Content-Range: 0-99/1234` header; `None` when unknown (`*`).
fn content_range_total(header: &str) -> Option<usize> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl RelationalSink for SupabaseClient {
    /// Batch upsert, falling back to row-by-row inserts when the batch
    /// fails. Rows that fail individually are dropped from the count.
    async fn upsert(&self, table_id: &str, rows: &[RelationalRow]) -> usize {
        if rows.is_empty() {
            return 0;
        }

        let err = match self.upsert_rows(table_id, rows).await {
            Ok(n) => return n,
            Err(e) => e,
        };
        let kind = error_kind(&err);
        tracing::warn!(
            target: "uvsync.relational",
            stage = "relational.upsert.fallback",
            table = %table_id,
            rows = rows.len(),
            kind = %kind,
            error = %err
        );

        let mut inserted = 0;
        for row in rows {
            match self.insert_row(table_id, row).await {
                Ok(()) => inserted += 1,
                Err(e) => {
                    tracing::debug!(
                        target: "uvsync.relational",
                        stage = "relational.insert.failed",
                        point_id = %row.point_id,
                        kind = %error_kind(&e)
                    );
                }
            }
        }
        inserted
    }
}

/// Reads the existing-pair index from the relational mirror table.
pub struct SupabasePairLoader {
    client: SupabaseClient,
    table_id: String,
}

impl SupabasePairLoader {
    pub fn new(client: SupabaseClient, table_id: String) -> Self {
        Self { client, table_id }
    }
}

#[async_trait]
impl PairIndexLoader for SupabasePairLoader {
    async fn load(&self) -> anyhow::Result<HashSet<(String, String)>> {
        self.client.select_pairs(&self.table_id).await
    }
}
