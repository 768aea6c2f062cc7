use uvsync_core::api::{InteractionType, WarehouseConfig};

/// Interaction rows not yet mirrored to the user-vector table, one per
/// user/item pair. Click-outs win over saves for the same pair.
pub fn build_interaction_query(project_id: &str, cfg: &WarehouseConfig) -> String {
    let table = |table_id: &str| format!("`{}.{}.{}`", project_id, cfg.dataset_id, table_id);

    let mut sql = format!(
        "WITH user_items AS (\n\
         \x20 SELECT DISTINCT user_id, item_id, point_id, '{click}' AS interaction_type\n\
         \x20 FROM {click_table}\n\
         \x20 WHERE point_id IS NOT NULL\n\
         \x20 UNION ALL\n\
         \x20 SELECT DISTINCT user_id, item_id, point_id, '{saved}' AS interaction_type\n\
         \x20 FROM {saved_table}\n\
         \x20 WHERE point_id IS NOT NULL\n\
         ), numbered AS (\n\
         \x20 SELECT ui.*,\n\
         \x20   ROW_NUMBER() OVER (PARTITION BY ui.user_id, ui.item_id ORDER BY ui.interaction_type) AS row_num\n\
         \x20 FROM user_items ui\n\
         \x20 LEFT JOIN {vector_table} AS uv\n\
         \x20   ON uv.user_id = ui.user_id AND uv.item_id = ui.item_id\n\
         \x20 WHERE uv.user_id IS NULL\n\
         )\n\
         SELECT * EXCEPT(row_num)\n\
         FROM numbered\n\
         WHERE row_num = 1\n\
         ORDER BY user_id, item_id",
        click = InteractionType::ClickOut.as_str(),
        saved = InteractionType::Saved.as_str(),
        click_table = table(&cfg.click_out_table_id),
        saved_table = table(&cfg.saved_table_id),
        vector_table = table(&cfg.user_vector_table_id),
    );

    if let Some(limit) = cfg.limit.filter(|n| *n > 0) {
        sql.push_str(&format!("\nLIMIT {}", limit));
        if let Some(page) = cfg.page.filter(|p| *p > 0) {
            sql.push_str(&format!("\nOFFSET {}", page * limit));
        }
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_targets_configured_tables() {
        let sql = build_interaction_query("proj", &WarehouseConfig::default());
        assert!(sql.contains("`proj.prod.click_outs`"));
        assert!(sql.contains("`proj.prod.saved_items`"));
        assert!(sql.contains("LEFT JOIN `proj.prod.user_vectors`"));
        assert!(sql.contains("'click_out' AS interaction_type"));
        assert!(sql.contains("'saved' AS interaction_type"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn test_limit_without_page_has_no_offset() {
        let cfg = WarehouseConfig {
            limit: Some(50),
            page: Some(0),
            ..WarehouseConfig::default()
        };
        let sql = build_interaction_query("proj", &cfg);
        assert!(sql.ends_with("\nLIMIT 50"));
        assert!(!sql.contains("OFFSET"));
    }

    #[test]
    fn test_page_offsets_by_limit() {
        let cfg = WarehouseConfig {
            limit: Some(50),
            page: Some(3),
            ..WarehouseConfig::default()
        };
        let sql = build_interaction_query("proj", &cfg);
        assert!(sql.ends_with("\nLIMIT 50\nOFFSET 150"));
    }

    #[test]
    fn test_page_without_limit_is_ignored() {
        let cfg = WarehouseConfig {
            page: Some(2),
            ..WarehouseConfig::default()
        };
        let sql = build_interaction_query("proj", &cfg);
        assert!(!sql.contains("OFFSET"));
    }
}
