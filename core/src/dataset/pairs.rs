use std::collections::{HashMap, HashSet};

use crate::sink::PairIndexLoader;

/// `(user_id, item_id)` pairs already mirrored downstream.
///
/// Loaded once before the run and only read afterwards; pairs written during
/// the run are picked up by the next run's load.
#[derive(Debug, Clone, Default)]
pub struct ExistingPairIndex {
    by_user: HashMap<String, HashSet<String>>,
    len: usize,
}

impl ExistingPairIndex {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut index = Self::default();
        for (user_id, item_id) in pairs {
            if index.by_user.entry(user_id).or_default().insert(item_id) {
                index.len += 1;
            }
        }
        index
    }

    /// Load through `loader`; a failed load degrades to an empty index.
    pub async fn load(loader: &dyn PairIndexLoader) -> Self {
        match loader.load().await {
            Ok(pairs) => {
                let index = Self::new(pairs);
                tracing::info!(
                    target: "uvsync.pairs",
                    stage = "pairs.load.out",
                    pairs = index.len(),
                    users = index.by_user.len()
                );
                index
            }
            Err(e) => {
                tracing::error!(
                    target: "uvsync.pairs",
                    stage = "pairs.load.failed",
                    error = %e,
                    "existing-pair load failed, continuing without filtering"
                );
                Self::default()
            }
        }
    }

    pub fn contains(&self, user_id: &str, item_id: &str) -> bool {
        self.by_user
            .get(user_id)
            .is_some_and(|items| items.contains(item_id))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
