#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use uvsync_core::api::{
    InteractionRow, PairIndexLoader, RelationalRow, RelationalSink, RowSource, SyncContext,
    SyncTargets, UserRows, Vector, VectorFetcher, VectorRecord, VectorSink, WarehouseRow,
    WarehouseSink,
};

pub struct StaticRowSource(pub Vec<UserRows>);

#[async_trait]
impl RowSource for StaticRowSource {
    async fn load_users(&self) -> anyhow::Result<Vec<UserRows>> {
        Ok(self.0.clone())
    }
}

/// Serves vectors from a map; any request containing `"boom"` fails.
#[derive(Default)]
pub struct MapFetcher {
    pub vectors: HashMap<String, Vector>,
    pub requests: Mutex<Vec<Vec<String>>>,
}

impl MapFetcher {
    pub fn with_points(ids: &[&str]) -> Self {
        let vectors = ids
            .iter()
            .map(|id| {
                let meta = serde_json::from_value(json!({"brand": "acme", "created_at": 1714557600})).unwrap();
                (id.to_string(), Vector::new(*id, vec![0.1, 0.2, 0.3]).with_metadata(meta))
            })
            .collect();
        Self {
            vectors,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorFetcher for MapFetcher {
    async fn fetch(&self, point_ids: &[String]) -> anyhow::Result<Vec<Vector>> {
        self.requests.lock().unwrap().push(point_ids.to_vec());
        if point_ids.iter().any(|id| id == "boom") {
            anyhow::bail!("fetch exploded");
        }
        let wanted: HashSet<&String> = point_ids.iter().collect();
        // HashMap order: deliberately unrelated to request order.
        Ok(self
            .vectors
            .iter()
            .filter(|(id, _)| wanted.contains(id))
            .map(|(_, v)| v.clone())
            .collect())
    }
}

pub struct RecordingVectorSink {
    pub succeed: bool,
    pub calls: Mutex<Vec<(String, Vec<VectorRecord>)>>,
}

impl RecordingVectorSink {
    pub fn new(succeed: bool) -> Self {
        Self {
            succeed,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl VectorSink for RecordingVectorSink {
    async fn upsert(&self, records: &[VectorRecord], namespace: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push((namespace.to_string(), records.to_vec()));
        self.succeed && !records.is_empty()
    }
}

pub struct RecordingWarehouseSink {
    pub succeed: bool,
    pub calls: Mutex<Vec<(String, String, Vec<WarehouseRow>)>>,
}

impl RecordingWarehouseSink {
    pub fn new(succeed: bool) -> Self {
        Self {
            succeed,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl WarehouseSink for RecordingWarehouseSink {
    async fn insert(&self, dataset_id: &str, table_id: &str, rows: &[WarehouseRow]) -> bool {
        self.calls.lock().unwrap().push((
            dataset_id.to_string(),
            table_id.to_string(),
            rows.to_vec(),
        ));
        self.succeed
    }
}

/// Persists everything unless `persisted` caps the count.
#[derive(Default)]
pub struct RecordingRelationalSink {
    pub persisted: Option<usize>,
    pub calls: Mutex<Vec<(String, Vec<RelationalRow>)>>,
}

impl RecordingRelationalSink {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RelationalSink for RecordingRelationalSink {
    async fn upsert(&self, table_id: &str, rows: &[RelationalRow]) -> usize {
        self.calls
            .lock()
            .unwrap()
            .push((table_id.to_string(), rows.to_vec()));
        self.persisted.unwrap_or(rows.len()).min(rows.len())
    }
}

#[derive(Default)]
pub struct StaticPairLoader {
    pub pairs: HashSet<(String, String)>,
    pub fail: bool,
}

#[async_trait]
impl PairIndexLoader for StaticPairLoader {
    async fn load(&self) -> anyhow::Result<HashSet<(String, String)>> {
        if self.fail {
            anyhow::bail!("relational store unreachable");
        }
        Ok(self.pairs.clone())
    }
}

pub struct Harness {
    pub fetcher: Arc<MapFetcher>,
    pub vector_sink: Arc<RecordingVectorSink>,
    pub warehouse_sink: Arc<RecordingWarehouseSink>,
    pub relational_sink: Arc<RecordingRelationalSink>,
    pub ctx: SyncContext,
}

impl Harness {
    pub fn new(
        users: Vec<UserRows>,
        fetcher: MapFetcher,
        vector_ok: bool,
        warehouse_ok: bool,
        pair_loader: StaticPairLoader,
    ) -> Self {
        let fetcher = Arc::new(fetcher);
        let vector_sink = Arc::new(RecordingVectorSink::new(vector_ok));
        let warehouse_sink = Arc::new(RecordingWarehouseSink::new(warehouse_ok));
        let relational_sink = Arc::new(RecordingRelationalSink::default());
        let ctx = SyncContext {
            row_source: Arc::new(StaticRowSource(users)),
            fetcher: fetcher.clone(),
            vector_sink: vector_sink.clone(),
            warehouse_sink: warehouse_sink.clone(),
            relational_sink: relational_sink.clone(),
            pair_loader: Arc::new(pair_loader),
            targets: SyncTargets::default(),
        };
        Self {
            fetcher,
            vector_sink,
            warehouse_sink,
            relational_sink,
            ctx,
        }
    }
}

pub fn user(user_id: &str, rows: &[(&str, &str)]) -> UserRows {
    UserRows {
        user_id: user_id.to_string(),
        rows: rows
            .iter()
            .map(|(item, point)| InteractionRow::new(user_id, *item, *point))
            .collect(),
    }
}
