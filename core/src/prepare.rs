//! Turns a [`UserDataset`] into the three aligned row families the sinks
//! consume, keeping one row per distinct item.

use std::collections::HashSet;

use crate::dataset::UserDataset;
use crate::error::RecordError;
use crate::models::{Metadata, PreparedRecords, RelationalRow, VectorRecord, WarehouseRow};

/// Single pass over `dataset`. The item identity of a row is read from
/// `item_key` in its metadata; rows without one are dropped, and only the
/// first row per item is kept.
pub fn prepare(dataset: &UserDataset, item_key: &str) -> PreparedRecords {
    let mut out = PreparedRecords::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (point_id, metadata, embedding) in dataset.iter() {
        let Some(item_id) = metadata.get_id(item_key) else {
            tracing::debug!(
                target: "uvsync.prepare",
                user_id = %dataset.user_id(),
                point_id = %point_id,
                item_key = %item_key,
                "row has no item id, skipping"
            );
            continue;
        };
        if seen.contains(&item_id) {
            continue;
        }

        match build_triple(point_id, metadata, embedding) {
            Ok((vector, warehouse, relational)) => {
                out.push(vector, warehouse, relational);
                seen.insert(item_id);
            }
            Err(e) => {
                tracing::warn!(
                    target: "uvsync.prepare",
                    user_id = %dataset.user_id(),
                    point_id = %point_id,
                    error = %e,
                    "skipping row"
                );
            }
        }
    }

    tracing::debug!(
        target: "uvsync.prepare",
        stage = "prepare.out",
        user_id = %dataset.user_id(),
        input = dataset.len(),
        output = out.len()
    );

    out
}

fn build_triple(
    point_id: &str,
    metadata: &Metadata,
    embedding: &[f32],
) -> Result<(VectorRecord, WarehouseRow, RelationalRow), RecordError> {
    let warehouse = WarehouseRow::new(metadata)?;
    let relational = RelationalRow::new(point_id, metadata)?;
    let vector = VectorRecord::new(point_id, metadata.clone(), embedding.to_vec())?;
    Ok((vector, warehouse, relational))
}
