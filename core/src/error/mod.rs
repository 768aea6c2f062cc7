#[allow(clippy::module_inception)]
pub mod error;
pub mod record;
pub mod sink;

pub use error::{CliError, SecretsError, SyncError};
pub use record::RecordError;
pub use sink::SinkErrorKind;
