use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::metadata::Metadata;
use crate::error::RecordError;

/// Row for the user-vector index upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Metadata,
}

impl VectorRecord {
    /// Requires `item_id` in the metadata; timestamps are normalized.
    pub fn new(point_id: &str, mut metadata: Metadata, values: Vec<f32>) -> Result<Self, RecordError> {
        if metadata.item_id().is_none() {
            return Err(RecordError::MissingField { field: "item_id" });
        }
        metadata.normalize_timestamps();
        Ok(Self {
            id: point_id.to_string(),
            values,
            metadata,
        })
    }
}

/// Audit row for the warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseRow {
    pub id: String,
    pub created_at: String,
    pub user_id: String,
    pub item_id: String,
}

impl WarehouseRow {
    /// Fresh row id and current wall-clock timestamp.
    pub fn new(metadata: &Metadata) -> Result<Self, RecordError> {
        let (user_id, item_id) = required_ids(metadata)?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339(),
            user_id,
            item_id,
        })
    }
}

/// Mirror row for the relational table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationalRow {
    pub user_id: String,
    pub item_id: String,
    pub point_id: String,
}

impl RelationalRow {
    pub fn new(point_id: &str, metadata: &Metadata) -> Result<Self, RecordError> {
        let (user_id, item_id) = required_ids(metadata)?;
        Ok(Self {
            user_id,
            item_id,
            point_id: point_id.to_string(),
        })
    }
}

fn required_ids(metadata: &Metadata) -> Result<(String, String), RecordError> {
    let user_id = metadata
        .user_id()
        .ok_or(RecordError::MissingField { field: "user_id" })?;
    let item_id = metadata
        .item_id()
        .ok_or(RecordError::MissingField { field: "item_id" })?;
    Ok((user_id, item_id))
}

/// The three row families built from one dataset. Always equal length and
/// aligned by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedRecords {
    vectors: Vec<VectorRecord>,
    warehouse_rows: Vec<WarehouseRow>,
    relational_rows: Vec<RelationalRow>,
}

impl PreparedRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one aligned triple.
    pub fn push(&mut self, vector: VectorRecord, warehouse: WarehouseRow, relational: RelationalRow) {
        self.vectors.push(vector);
        self.warehouse_rows.push(warehouse);
        self.relational_rows.push(relational);
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[VectorRecord] {
        &self.vectors
    }

    pub fn warehouse_rows(&self) -> &[WarehouseRow] {
        &self.warehouse_rows
    }

    pub fn relational_rows(&self) -> &[RelationalRow] {
        &self.relational_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: serde_json::Value) -> Metadata {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_vector_record_requires_item_id() {
        let err = VectorRecord::new("p1", meta(json!({"user_id": "u1"})), vec![0.1]).unwrap_err();
        assert_eq!(err, RecordError::MissingField { field: "item_id" });
    }

    #[test]
    fn test_warehouse_row_gets_fresh_id() {
        let m = meta(json!({"user_id": "u1", "item_id": "i1"}));
        let a = WarehouseRow::new(&m).unwrap();
        let b = WarehouseRow::new(&m).unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, "p1");
        assert_eq!(a.user_id, "u1");
        assert!(chrono::DateTime::parse_from_rfc3339(&a.created_at).is_ok());
    }

    #[test]
    fn test_relational_row_requires_user_id() {
        let err = RelationalRow::new("p1", &meta(json!({"item_id": "i1"}))).unwrap_err();
        assert_eq!(err, RecordError::MissingField { field: "user_id" });
    }
}
