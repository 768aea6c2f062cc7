use serde_json::{Map, Value};

use crate::error::SecretsError;

const SUPABASE_URL: &str = "SUPABASE_URL";
const SUPABASE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
const GCP_CREDENTIALS: &str = "GCP_CREDENTIALS";
const PINECONE_API_KEY: &str = "PINECONE_API_KEY";

/// Credentials for the three backends, read from one JSON blob.
#[derive(Clone)]
pub struct Secrets {
    pub relational_url: String,
    pub relational_key: String,
    /// Service-account key object for the warehouse.
    pub warehouse_credentials: Map<String, Value>,
    pub vector_api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("relational_url", &self.relational_url)
            .field("relational_key", &"***")
            .field("warehouse_credentials", &"***")
            .field("vector_api_key", &"***")
            .finish()
    }
}

impl Secrets {
    /// Read the blob from environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self, SecretsError> {
        let raw = std::env::var(var).map_err(|_| SecretsError::MissingEnv(var.to_string()))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, SecretsError> {
        let blob: Map<String, Value> = serde_json::from_str(raw)?;

        let warehouse_credentials = match blob.get(GCP_CREDENTIALS) {
            Some(Value::Object(map)) => map.clone(),
            // Some secret stores hand the key over as an embedded JSON string.
            Some(Value::String(s)) => serde_json::from_str::<Map<String, Value>>(s).map_err(|e| {
                SecretsError::InvalidValue {
                    key: GCP_CREDENTIALS,
                    reason: e.to_string(),
                }
            })?,
            Some(_) => {
                return Err(SecretsError::InvalidValue {
                    key: GCP_CREDENTIALS,
                    reason: "expected a JSON object".to_string(),
                })
            }
            None => return Err(SecretsError::MissingKey(GCP_CREDENTIALS)),
        };

        Ok(Self {
            relational_url: required_str(&blob, SUPABASE_URL)?,
            relational_key: required_str(&blob, SUPABASE_KEY)?,
            warehouse_credentials,
            vector_api_key: required_str(&blob, PINECONE_API_KEY)?,
        })
    }
}

fn required_str(blob: &Map<String, Value>, key: &'static str) -> Result<String, SecretsError> {
    match blob.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(_) => Err(SecretsError::InvalidValue {
            key,
            reason: "expected a non-empty string".to_string(),
        }),
        None => Err(SecretsError::MissingKey(key)),
    }
}
