use std::collections::HashMap;

use super::pairs::ExistingPairIndex;
use crate::error::SyncError;
use crate::models::{InteractionRow, Metadata, Vector};
use crate::sink::VectorFetcher;

/// One user's vectors, ready to be prepared for the sinks.
///
/// `point_ids`, `metadata` and `embeddings` are positionally aligned and
/// never mutated after construction. Point ids are unique and follow the
/// order of the warehouse rows they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDataset {
    user_id: String,
    point_ids: Vec<String>,
    metadata: Vec<Metadata>,
    embeddings: Vec<Vec<f32>>,
}

impl UserDataset {
    /// Build the dataset for `user_id` from its warehouse rows.
    ///
    /// Rows whose pair is already in `pairs` are dropped, the remaining
    /// point ids are fetched in one call, and every returned vector is
    /// matched back to its row by id so the row's `item_id` is the one
    /// stamped on its metadata. Fetch failures propagate.
    pub async fn from_rows(
        user_id: &str,
        rows: &[InteractionRow],
        fetcher: &dyn VectorFetcher,
        pairs: &ExistingPairIndex,
    ) -> Result<Self, SyncError> {
        let pending: Vec<&InteractionRow> = rows
            .iter()
            .filter(|row| !row.point_id.is_empty())
            .filter(|row| !pairs.contains(user_id, &row.item_id))
            .collect();

        let request: Vec<String> = pending.iter().map(|row| row.point_id.clone()).collect();

        tracing::debug!(
            target: "uvsync.dataset",
            stage = "dataset.fetch.in",
            user_id = %user_id,
            rows = rows.len(),
            requested = request.len()
        );

        let vectors = fetcher
            .fetch(&request)
            .await
            .map_err(|source| SyncError::Fetch {
                user_id: user_id.to_string(),
                source,
            })?;
        let returned = vectors.len();

        let mut by_id: HashMap<String, Vector> =
            vectors.into_iter().map(|v| (v.id.clone(), v)).collect();

        let mut dataset = Self::empty(user_id);
        let mut dimension: Option<usize> = None;

        for row in pending {
            // A repeated point id finds nothing on its second lookup.
            let Some(vector) = by_id.remove(&row.point_id) else {
                continue;
            };
            if vector.values.is_empty() {
                tracing::warn!(
                    target: "uvsync.dataset",
                    user_id = %user_id,
                    point_id = %vector.id,
                    "vector has no values, skipping"
                );
                continue;
            }
            let expected = *dimension.get_or_insert(vector.values.len());
            if vector.values.len() != expected {
                tracing::warn!(
                    target: "uvsync.dataset",
                    user_id = %user_id,
                    point_id = %vector.id,
                    dimension = vector.values.len(),
                    expected,
                    "vector dimension mismatch, skipping"
                );
                continue;
            }

            let mut metadata = vector.metadata;
            metadata.stamp(user_id, &row.item_id);

            dataset.point_ids.push(vector.id);
            dataset.metadata.push(metadata);
            dataset.embeddings.push(vector.values);
        }

        tracing::debug!(
            target: "uvsync.dataset",
            stage = "dataset.fetch.out",
            user_id = %user_id,
            returned,
            unmatched = by_id.len(),
            size = dataset.len()
        );

        Ok(dataset)
    }

    fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            point_ids: Vec::new(),
            metadata: Vec::new(),
            embeddings: Vec::new(),
        }
    }

    /// A dataset is valid iff it holds at least one embedding.
    pub fn is_valid(&self) -> bool {
        !self.embeddings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.point_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_ids.is_empty()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn point_ids(&self) -> &[String] {
        &self.point_ids
    }

    pub fn metadata(&self) -> &[Metadata] {
        &self.metadata
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Aligned `(point_id, metadata, embedding)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Metadata, &[f32])> {
        self.point_ids
            .iter()
            .zip(&self.metadata)
            .zip(&self.embeddings)
            .map(|((id, meta), emb)| (id.as_str(), meta, emb.as_slice()))
    }
}

#[cfg(test)]
impl UserDataset {
    pub(crate) fn from_parts(
        user_id: &str,
        point_ids: Vec<String>,
        metadata: Vec<Metadata>,
        embeddings: Vec<Vec<f32>>,
    ) -> Self {
        assert_eq!(point_ids.len(), metadata.len());
        assert_eq!(point_ids.len(), embeddings.len());
        Self {
            user_id: user_id.to_string(),
            point_ids,
            metadata,
            embeddings,
        }
    }
}
