use clap::Parser;
mod commands;
use commands::cli;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uvsync_core::api::{self as core_api, CliError};

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let mut cfg = match args.config.as_deref() {
        Some(path) => core_api::load_from_path(path),
        None => core_api::load_default(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;
    args.apply(&mut cfg);
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    let secrets = core_api::Secrets::from_env(&cfg.sync.secrets_env)?;
    let ctx = uvsync_plugins::factory::build_context(&cfg, &secrets)
        .await
        .map_err(|e| CliError::Setup(format!("{e:#}")))?;

    let stats = {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        core_api::run(&ctx, &mut out).await?
    };

    tracing::info!(
        target: "uvsync.cli",
        stage = "cli.summary",
        users = stats.users,
        users_with_inserts = stats.users_with_inserts,
        inserted = stats.inserted,
        success_rate = stats.success_rate()
    );

    Ok(0)
}

/// Installs the stderr and/or file layers named by `[logging]`.
fn init_tracing(logging: &core_api::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }
    if !logging.console && !logging.file {
        return Err("logging enabled but neither console nor file output is on".to_string());
    }

    let file_layer = if logging.file {
        let writer = log_file_writer(&log_dir(logging.directory.as_deref()))?;
        Some(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
    } else {
        None
    };

    // stdout carries progress lines; logs stay on stderr.
    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    tracing_subscriber::registry()
        .with(log_filter(&logging.level)?)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// `RUST_LOG` wins over the configured level when set.
fn log_filter(level: &str) -> Result<EnvFilter, String> {
    match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => Ok(EnvFilter::from_default_env()),
        _ => EnvFilter::try_new(level).map_err(|e| format!("invalid log level '{level}': {e}")),
    }
}

fn log_dir(directory: Option<&str>) -> std::path::PathBuf {
    directory
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("uvsync"))
}

/// One log file per run; the worker guard lives for the rest of the process.
fn log_file_writer(
    dir: &std::path::Path,
) -> Result<tracing_appender::non_blocking::NonBlocking, String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("cannot create log dir {}: {e}", dir.display()))?;
    let appender =
        tracing_appender::rolling::never(dir, format!("uvsync.{}.log", std::process::id()));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Ok(writer)
}
