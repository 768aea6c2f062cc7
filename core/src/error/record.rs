use thiserror::Error;

/// Typed failure of the per-row record constructors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("metadata missing required field '{field}'")]
    MissingField { field: &'static str },
}
