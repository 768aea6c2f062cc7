use clap::Parser;

use uvsync_core::api::AppConfig;

/// Sync user interactions into per-user vector namespaces, the warehouse
/// audit table and the relational mirror.
#[derive(Parser, Debug, Default)]
#[command(name = "uvsync", version)]
pub struct Args {
    /// Config file; defaults to ~/.uvsync/config.toml, then ./config.toml.
    #[arg(long)]
    pub config: Option<String>,

    /// Rows per warehouse page.
    #[arg(long)]
    pub limit: Option<u64>,

    /// Zero-based warehouse page, used with --limit.
    #[arg(long, requires = "limit")]
    pub page: Option<u64>,
}

impl Args {
    /// Flags win over the config file.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(limit) = self.limit {
            cfg.warehouse.limit = Some(limit);
        }
        if let Some(page) = self.page {
            cfg.warehouse.page = Some(page);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_run_everything() {
        let args = Args::try_parse_from(["uvsync"]).unwrap();
        let mut cfg = AppConfig::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.warehouse.limit, None);
        assert_eq!(cfg.warehouse.page, None);
    }

    #[test]
    fn test_paging_flags_override_config() {
        let args = Args::try_parse_from(["uvsync", "--limit", "500", "--page", "2"]).unwrap();
        let mut cfg = AppConfig::default();
        cfg.warehouse.limit = Some(10);
        args.apply(&mut cfg);
        assert_eq!(cfg.warehouse.limit, Some(500));
        assert_eq!(cfg.warehouse.page, Some(2));
    }

    #[test]
    fn test_page_requires_limit() {
        assert!(Args::try_parse_from(["uvsync", "--page", "2"]).is_err());
    }
}
