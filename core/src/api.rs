//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `uvsync_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, AppConfig, LoggingConfig, RelationalConfig, Secrets,
    SyncSettings, VectorConfig, WarehouseConfig,
};
pub use crate::context::{SyncContext, SyncTargets};
pub use crate::dataset::{ExistingPairIndex, UserDataset};
pub use crate::driver::{process_user, progress_line, run, RunStats};
pub use crate::error::{CliError, RecordError, SecretsError, SinkErrorKind, SyncError};
pub use crate::models::{
    group_by_user, InteractionRow, InteractionType, Metadata, PreparedRecords, RelationalRow,
    UserRows, Vector, VectorRecord, WarehouseRow,
};
pub use crate::prepare::prepare;
pub use crate::sink::{
    PairIndexLoader, RelationalSink, RowSource, VectorFetcher, VectorSink, WarehouseSink,
};
pub use crate::writer::{write_records, WriteOutcome};
