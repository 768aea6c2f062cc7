use std::sync::Arc;

use crate::models::ITEM_ID_KEY;
use crate::sink::{
    PairIndexLoader, RelationalSink, RowSource, VectorFetcher, VectorSink, WarehouseSink,
};

/// Table and key names the writer and preparer target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTargets {
    pub warehouse_dataset_id: String,
    pub warehouse_table_id: String,
    pub relational_table_id: String,
    /// Metadata key holding the item identity used for dedup.
    pub item_key: String,
}

impl Default for SyncTargets {
    fn default() -> Self {
        Self {
            warehouse_dataset_id: "prod".to_string(),
            warehouse_table_id: "user_vectors".to_string(),
            relational_table_id: "user_vectors".to_string(),
            item_key: ITEM_ID_KEY.to_string(),
        }
    }
}

/// Every collaborator handle a run needs, built once at startup.
#[derive(Clone)]
pub struct SyncContext {
    pub row_source: Arc<dyn RowSource>,
    pub fetcher: Arc<dyn VectorFetcher>,
    pub vector_sink: Arc<dyn VectorSink>,
    pub warehouse_sink: Arc<dyn WarehouseSink>,
    pub relational_sink: Arc<dyn RelationalSink>,
    pub pair_loader: Arc<dyn PairIndexLoader>,
    pub targets: SyncTargets,
}
