use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("secrets error: {0}")]
    Secrets(#[from] SecretsError),
    #[error("client setup failed: {0}")]
    Setup(String),
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// 11: config or secrets, 20: client setup / IO, 50: anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Secrets(_) => 11,
            CliError::Setup(_) | CliError::Io(_) => 20,
            CliError::Sync(_) | CliError::Anyhow(_) => 50,
        }
    }
}

#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
    #[error("secrets blob is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("secrets blob is missing key '{0}'")]
    MissingKey(&'static str),
    #[error("secret '{key}' is invalid: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Failures raised while processing one user. The driver catches these at
/// the per-user boundary.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("vector fetch failed for user {user_id}: {source}")]
    Fetch {
        user_id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("row source failed: {0}")]
    RowSource(#[source] anyhow::Error),
    #[error("progress output failed: {0}")]
    Output(#[from] std::io::Error),
}
