mod load;
mod secrets;
mod types;

pub use load::{apply_env_overrides, get_data_dir, load_default, load_from_path};
pub use secrets::Secrets;
pub use types::{
    AppConfig, LoggingConfig, RelationalConfig, SyncSettings, VectorConfig, WarehouseConfig,
};
