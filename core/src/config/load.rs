use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default uvsync data directory: ~/.uvsync
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".uvsync"))
}

/// Load config from an explicit path (`~` is expanded), then apply
/// environment overrides.
pub fn load_from_path(path: &str) -> anyhow::Result<AppConfig> {
    let expanded = shellexpand::tilde(path).to_string();
    let s = std::fs::read_to_string(&expanded)
        .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", expanded, e))?;
    let mut cfg = toml::from_str::<AppConfig>(&s)?;
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.uvsync/config.toml (highest)
    let user_config = get_data_dir()?.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if user_config.exists() {
        let s = std::fs::read_to_string(&user_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    // Environment variable overrides (Priority 0: highest)
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());

    Ok(cfg)
}

/// Apply `UVSYNC_*` overrides; blank values are ignored.
pub fn apply_env_overrides(cfg: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("UVSYNC_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = get("UVSYNC_WAREHOUSE_PROJECT_ID") {
        cfg.warehouse.project_id = Some(v);
    }
    if let Some(v) = get("UVSYNC_WAREHOUSE_DATASET_ID") {
        cfg.warehouse.dataset_id = v;
    }
    if let Some(v) = get("UVSYNC_ITEMS_INDEX") {
        cfg.vector.items_index = v;
    }
    if let Some(v) = get("UVSYNC_USER_VECTORS_INDEX") {
        cfg.vector.user_vectors_index = v;
    }
    if let Some(v) = get("UVSYNC_RELATIONAL_TABLE_ID") {
        cfg.relational.table_id = v;
    }
    if let Some(v) = get("UVSYNC_SECRETS_ENV") {
        cfg.sync.secrets_env = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [warehouse]
            dataset_id = "analytics"
            limit = 500

            [vector]
            items_host = "https://items.example.io"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.warehouse.dataset_id, "analytics");
        assert_eq!(cfg.warehouse.limit, Some(500));
        assert_eq!(cfg.warehouse.saved_table_id, "saved_items");
        assert_eq!(cfg.vector.items_host.as_deref(), Some("https://items.example.io"));
        assert_eq!(cfg.vector.fetch_batch_size, 100);
        assert_eq!(cfg.sync.item_key, "item_id");
        assert_eq!(cfg.sync.secrets_env, "SECRETS_JSON");
    }

    #[test]
    fn test_env_overrides_ignore_blank_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("UVSYNC_WAREHOUSE_DATASET_ID", "staging"),
            ("UVSYNC_ITEMS_INDEX", "   "),
        ]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.warehouse.dataset_id, "staging");
        assert_eq!(cfg.vector.items_index, "items");
    }

    #[test]
    fn test_load_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[relational]\ntable_id = \"mirror\"").unwrap();
        let cfg = load_from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.relational.table_id, "mirror");
        assert_eq!(cfg.targets().relational_table_id, "mirror");
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        assert!(load_from_path("/nonexistent/uvsync.toml").is_err());
    }
}
