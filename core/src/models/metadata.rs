//! Per-vector metadata.
//!
//! Index metadata is an open JSON object. `Metadata` keeps it that way for
//! the upsert payload but gives the sync path typed access to the handful of
//! keys it relies on.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const USER_ID_KEY: &str = "user_id";
pub const ITEM_ID_KEY: &str = "item_id";

/// Warehouse `DATETIME` text, with or without fractional seconds.
const WAREHOUSE_DATETIME: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Identifier-like lookup: non-empty strings as-is, numbers rendered.
    pub fn get_id(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<String> {
        self.get_id(USER_ID_KEY)
    }

    pub fn item_id(&self) -> Option<String> {
        self.get_id(ITEM_ID_KEY)
    }

    /// Stamp the owning user and item onto the metadata.
    pub fn stamp(&mut self, user_id: &str, item_id: &str) {
        self.insert(USER_ID_KEY, user_id);
        self.insert(ITEM_ID_KEY, item_id);
    }

    /// Rewrite date-time values as ISO-8601 text. Only strings that already
    /// parse as a date-time are touched; numbers and other text stay as-is.
    pub fn normalize_timestamps(&mut self) {
        for value in self.0.values_mut() {
            if let Value::String(text) = value {
                if let Some(iso) = datetime_to_iso8601(text) {
                    *text = iso;
                }
            }
        }
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn datetime_to_iso8601(text: &str) -> Option<String> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.to_rfc3339());
    }
    // Warehouse TIMESTAMP text carries a trailing zone name.
    if let Some(naive) = text.strip_suffix(" UTC") {
        let dt = NaiveDateTime::parse_from_str(naive, WAREHOUSE_DATETIME).ok()?;
        return Some(dt.and_utc().to_rfc3339());
    }
    NaiveDateTime::parse_from_str(text, WAREHOUSE_DATETIME)
        .ok()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}
