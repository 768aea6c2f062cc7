use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uvsync_core::api::{Vector, VectorFetcher, VectorRecord, VectorSink};

use crate::http::{self, error_kind};

const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";
const API_VERSION: &str = "2024-07";

/// Data-plane handle on one index.
#[derive(Clone)]
pub struct PineconeIndex {
    api_key: String,
    http: reqwest::Client,
    url_fetch: String,
    url_upsert: String,
    fetch_batch_size: usize,
    upsert_batch_size: usize,
}

impl PineconeIndex {
    pub fn new(
        host: &str,
        api_key: String,
        timeout_ms: u64,
        fetch_batch_size: usize,
        upsert_batch_size: usize,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing vector index API key");
        let base = normalize_host(host);
        Ok(Self {
            api_key,
            http: http::build_client(timeout_ms)?,
            url_fetch: format!("{}/vectors/fetch", base),
            url_upsert: format!("{}/vectors/upsert", base),
            fetch_batch_size: fetch_batch_size.max(1),
            upsert_batch_size: upsert_batch_size.max(1),
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("Api-Key", &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
    }

    /// Fetch vectors by id from the default namespace, chunked by
    /// `fetch_batch_size`. Ids the index does not know are simply absent.
    pub async fn fetch_vectors(&self, ids: &[String]) -> anyhow::Result<Vec<Vector>> {
        let mut out = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(self.fetch_batch_size) {
            let query: Vec<(&str, &str)> = chunk.iter().map(|id| ("ids", id.as_str())).collect();
            let url = &self.url_fetch;
            tracing::debug!(
                target: "uvsync.vector",
                stage = "vector.http.fetch.in",
                url = %url,
                ids = chunk.len()
            );
            let req = self.auth(self.http.get(url).query(&query));
            let resp = http::send(req, url).await?;
            let status = resp.status();
            let body: FetchResponse = http::parse_json(resp).await?;
            tracing::debug!(
                target: "uvsync.vector",
                stage = "vector.http.fetch.out",
                status = %status,
                vectors = body.vectors.len()
            );
            out.extend(body.vectors.into_values());
        }
        Ok(out)
    }

    /// Upsert `records` into `namespace`, chunked by `upsert_batch_size`.
    /// Returns the number of vectors the index acknowledged.
    pub async fn upsert_vectors(
        &self,
        records: &[VectorRecord],
        namespace: &str,
    ) -> anyhow::Result<usize> {
        let mut upserted = 0;
        for chunk in records.chunks(self.upsert_batch_size) {
            let url = &self.url_upsert;
            tracing::debug!(
                target: "uvsync.vector",
                stage = "vector.http.upsert.in",
                url = %url,
                namespace = %namespace,
                vectors = chunk.len()
            );
            let payload = UpsertRequest {
                vectors: chunk,
                namespace,
            };
            let req = self.auth(self.http.post(url).json(&payload));
            let resp = http::send(req, url).await?;
            let body: UpsertResponse = http::parse_json(resp).await?;
            upserted += body.upserted_count.unwrap_or(chunk.len());
        }
        Ok(upserted)
    }
}

#[async_trait]
impl VectorFetcher for PineconeIndex {
    async fn fetch(&self, point_ids: &[String]) -> anyhow::Result<Vec<Vector>> {
        if point_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_vectors(point_ids).await
    }
}

#[async_trait]
impl VectorSink for PineconeIndex {
    async fn upsert(&self, records: &[VectorRecord], namespace: &str) -> bool {
        if records.is_empty() {
            return false;
        }
        match self.upsert_vectors(records, namespace).await {
            Ok(_) => true,
            Err(e) => {
                let kind = error_kind(&e);
                tracing::warn!(
                    target: "uvsync.vector",
                    stage = "vector.upsert.failed",
                    namespace = %namespace,
                    kind = %kind,
                    transient = kind.is_transient(),
                    error = %e
                );
                false
            }
        }
    }
}

/// Look up the data-plane host of `index_name` through the control plane.
pub async fn resolve_host(
    control_plane_url: &str,
    index_name: &str,
    api_key: &str,
    timeout_ms: u64,
) -> anyhow::Result<String> {
    let client = http::build_client(timeout_ms)?;
    let url = format!(
        "{}/indexes/{}",
        control_plane_url.trim_end_matches('/'),
        index_name
    );
    let req = client
        .get(&url)
        .header("Api-Key", api_key)
        .header(API_VERSION_HEADER, API_VERSION);
    let resp = http::send(req, &url).await?;
    let desc: IndexDescription = http::parse_json(resp).await?;
    tracing::info!(
        target: "uvsync.vector",
        stage = "vector.host.resolved",
        index = %index_name,
        host = %desc.host
    );
    Ok(normalize_host(&desc.host))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, Vector>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(default, rename = "upsertedCount")]
    upserted_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ApiError;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use uvsync_core::api::{Metadata, SinkErrorKind};

    fn record(id: &str, item: &str) -> VectorRecord {
        let meta: Metadata =
            serde_json::from_value(json!({"user_id": "u1", "item_id": item})).unwrap();
        VectorRecord::new(id, meta, vec![0.1, 0.2]).unwrap()
    }

    #[test]
    fn test_normalize_host_adds_scheme() {
        assert_eq!(normalize_host("idx-123.svc.pinecone.io/"), "https://idx-123.svc.pinecone.io");
        assert_eq!(normalize_host("http://localhost:5080"), "http://localhost:5080");
    }

    #[tokio::test]
    async fn test_fetch_parses_vectors_and_sends_api_key() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/vectors/fetch")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ids".into(), "p1".into()),
                Matcher::UrlEncoded("ids".into(), "p2".into()),
            ]))
            .match_header("api-key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "namespace": "",
                    "vectors": {
                        "p2": {"id": "p2", "values": [0.3, 0.4], "metadata": {"brand": "b"}},
                        "p1": {"id": "p1", "values": [0.1, 0.2]}
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let index = PineconeIndex::new(&server.url(), "secret".into(), 1_000, 100, 100).unwrap();
        let mut vectors = index
            .fetch(&["p1".to_string(), "p2".to_string()])
            .await
            .unwrap();
        vectors.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].values, vec![0.1, 0.2]);
        assert!(vectors[0].metadata.is_empty());
        assert_eq!(vectors[1].metadata.get("brand"), Some(&json!("b")));
    }

    #[tokio::test]
    async fn test_fetch_chunks_requests() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/vectors/fetch")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"vectors": {}}"#)
            .expect(3)
            .create_async()
            .await;

        let index = PineconeIndex::new(&server.url(), "secret".into(), 1_000, 2, 100).unwrap();
        let ids: Vec<String> = (0..5).map(|i| format!("p{}", i)).collect();
        let vectors = index.fetch(&ids).await.unwrap();

        assert!(vectors.is_empty());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_empty_request_makes_no_call() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/vectors/fetch")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let index = PineconeIndex::new(&server.url(), "secret".into(), 1_000, 100, 100).unwrap();
        assert!(index.fetch(&[]).await.unwrap().is_empty());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_status_error_is_classified() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/vectors/fetch")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let index = PineconeIndex::new(&server.url(), "bad".into(), 1_000, 100, 100).unwrap();
        let err = index.fetch(&["p1".to_string()]).await.unwrap_err();
        let api = err.downcast_ref::<ApiError>().expect("expected ApiError");
        assert_eq!(api.kind(), SinkErrorKind::Authentication);
        assert_eq!(api.status(), Some(401));
    }

    #[tokio::test]
    async fn test_upsert_sends_namespace_and_records() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/vectors/upsert")
            .match_body(Matcher::Json(json!({
                "namespace": "u1",
                "vectors": [{
                    "id": "p1",
                    "values": [0.1, 0.2],
                    "metadata": {"user_id": "u1", "item_id": "a"}
                }]
            })))
            .with_status(200)
            .with_body(r#"{"upsertedCount": 1}"#)
            .create_async()
            .await;

        let index = PineconeIndex::new(&server.url(), "secret".into(), 1_000, 100, 100).unwrap();
        assert!(index.upsert(&[record("p1", "a")], "u1").await);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_upsert_failure_returns_false() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/vectors/upsert")
            .with_status(500)
            .create_async()
            .await;

        let index = PineconeIndex::new(&server.url(), "secret".into(), 1_000, 100, 100).unwrap();
        assert!(!index.upsert(&[record("p1", "a")], "u1").await);
    }

    #[tokio::test]
    async fn test_upsert_empty_returns_false_without_call() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/vectors/upsert")
            .expect(0)
            .create_async()
            .await;

        let index = PineconeIndex::new(&server.url(), "secret".into(), 1_000, 100, 100).unwrap();
        assert!(!index.upsert(&[], "u1").await);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_host_reads_index_description() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/indexes/items")
            .with_status(200)
            .with_body(r#"{"name": "items", "host": "items-abc.svc.pinecone.io"}"#)
            .create_async()
            .await;

        let host = resolve_host(&server.url(), "items", "secret", 1_000)
            .await
            .unwrap();
        assert_eq!(host, "https://items-abc.svc.pinecone.io");
    }
}
