use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How the user interacted with the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    ClickOut,
    Saved,
}

impl InteractionType {
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionType::ClickOut => "click_out",
            InteractionType::Saved => "saved",
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "click_out" => Ok(InteractionType::ClickOut),
            "saved" => Ok(InteractionType::Saved),
            _ => Err(format!("Invalid interaction type: {}", s)),
        }
    }
}

/// One warehouse interaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRow {
    pub user_id: String,
    pub item_id: String,
    pub point_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_type: Option<InteractionType>,
    /// Any other columns the query returned.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl InteractionRow {
    pub fn new(
        user_id: impl Into<String>,
        item_id: impl Into<String>,
        point_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            point_id: point_id.into(),
            interaction_type: None,
            extra: Map::new(),
        }
    }

    pub fn with_interaction(mut self, interaction_type: InteractionType) -> Self {
        self.interaction_type = Some(interaction_type);
        self
    }

    /// Key lookup across the fixed columns and the extra ones.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "user_id" => Some(Value::String(self.user_id.clone())),
            "item_id" => Some(Value::String(self.item_id.clone())),
            "point_id" => Some(Value::String(self.point_id.clone())),
            "interaction_type" => self
                .interaction_type
                .map(|t| Value::String(t.as_str().to_string())),
            _ => self.extra.get(key).cloned(),
        }
    }
}

/// All rows of one user, as yielded by a row source.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRows {
    pub user_id: String,
    pub rows: Vec<InteractionRow>,
}

/// Group rows by `user_id`. Groups appear in order of each user's first row
/// and keep their rows in input order; a user never appears twice.
pub fn group_by_user(rows: impl IntoIterator<Item = InteractionRow>) -> Vec<UserRows> {
    let mut groups: Vec<UserRows> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in rows {
        match positions.get(&row.user_id) {
            Some(&idx) => groups[idx].rows.push(row),
            None => {
                positions.insert(row.user_id.clone(), groups.len());
                groups.push(UserRows {
                    user_id: row.user_id.clone(),
                    rows: vec![row],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_by_user_merges_non_contiguous_rows() {
        let rows = vec![
            InteractionRow::new("u2", "a", "p1"),
            InteractionRow::new("u1", "b", "p2"),
            InteractionRow::new("u2", "c", "p3"),
        ];
        let groups = group_by_user(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].user_id, "u2");
        let items: Vec<_> = groups[0].rows.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(items, vec!["a", "c"]);
        assert_eq!(groups[1].user_id, "u1");
    }

    #[test]
    fn test_group_by_user_empty() {
        assert!(group_by_user(Vec::new()).is_empty());
    }

    #[test]
    fn test_row_deserializes_extra_columns() {
        let row: InteractionRow = serde_json::from_value(json!({
            "user_id": "u1",
            "item_id": "i1",
            "point_id": "p1",
            "interaction_type": "saved",
            "brand": "acme"
        }))
        .unwrap();
        assert_eq!(row.interaction_type, Some(InteractionType::Saved));
        assert_eq!(row.get("brand"), Some(json!("acme")));
        assert_eq!(row.get("point_id"), Some(json!("p1")));
    }

    #[test]
    fn test_interaction_type_from_str() {
        assert_eq!(
            "click_out".parse::<InteractionType>(),
            Ok(InteractionType::ClickOut)
        );
        assert!("view".parse::<InteractionType>().is_err());
    }
}
