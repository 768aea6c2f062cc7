use serde::{Deserialize, Serialize};

use crate::context::SyncTargets;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub warehouse: WarehouseConfig,

    #[serde(default)]
    pub vector: VectorConfig,

    #[serde(default)]
    pub relational: RelationalConfig,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl AppConfig {
    pub fn targets(&self) -> SyncTargets {
        SyncTargets {
            warehouse_dataset_id: self.warehouse.dataset_id.clone(),
            warehouse_table_id: self.warehouse.user_vector_table_id.clone(),
            relational_table_id: self.relational.table_id.clone(),
            item_key: self.sync.item_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "uvsync_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Overrides the project id from the service-account credentials.
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,

    #[serde(default = "default_click_out_table_id")]
    pub click_out_table_id: String,

    #[serde(default = "default_saved_table_id")]
    pub saved_table_id: String,

    #[serde(default = "default_user_vector_table_id")]
    pub user_vector_table_id: String,

    /// Page size for the interaction query; unset reads everything.
    #[serde(default)]
    pub limit: Option<u64>,

    /// Zero-based page index, used with `limit`.
    #[serde(default)]
    pub page: Option<u64>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_dataset_id() -> String {
    "prod".to_string()
}

fn default_click_out_table_id() -> String {
    "click_outs".to_string()
}

fn default_saved_table_id() -> String {
    "saved_items".to_string()
}

fn default_user_vector_table_id() -> String {
    "user_vectors".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset_id: default_dataset_id(),
            click_out_table_id: default_click_out_table_id(),
            saved_table_id: default_saved_table_id(),
            user_vector_table_id: default_user_vector_table_id(),
            limit: None,
            page: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Index holding item embeddings (fetch side).
    #[serde(default = "default_items_index")]
    pub items_index: String,

    /// Index receiving per-user namespaces (upsert side).
    #[serde(default = "default_user_vectors_index")]
    pub user_vectors_index: String,

    /// Data-plane host of the items index; resolved via the control plane if unset.
    #[serde(default)]
    pub items_host: Option<String>,

    #[serde(default)]
    pub user_vectors_host: Option<String>,

    #[serde(default = "default_control_plane_url")]
    pub control_plane_url: String,

    #[serde(default = "default_fetch_batch_size")]
    pub fetch_batch_size: usize,

    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_items_index() -> String {
    "items".to_string()
}

fn default_user_vectors_index() -> String {
    "user-vectors".to_string()
}

fn default_control_plane_url() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_fetch_batch_size() -> usize {
    100
}

fn default_upsert_batch_size() -> usize {
    100
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            items_index: default_items_index(),
            user_vectors_index: default_user_vectors_index(),
            items_host: None,
            user_vectors_host: None,
            control_plane_url: default_control_plane_url(),
            fetch_batch_size: default_fetch_batch_size(),
            upsert_batch_size: default_upsert_batch_size(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalConfig {
    #[serde(default = "default_user_vector_table_id")]
    pub table_id: String,

    /// Rows per request when reading the existing-pair index.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_page_size() -> usize {
    1000
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            table_id: default_user_vector_table_id(),
            page_size: default_page_size(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Metadata key holding the item identity used for dedup.
    #[serde(default = "default_item_key")]
    pub item_key: String,

    /// Environment variable carrying the secrets JSON blob.
    #[serde(default = "default_secrets_env")]
    pub secrets_env: String,
}

fn default_item_key() -> String {
    crate::models::ITEM_ID_KEY.to_string()
}

fn default_secrets_env() -> String {
    "SECRETS_JSON".to_string()
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            item_key: default_item_key(),
            secrets_env: default_secrets_env(),
        }
    }
}
