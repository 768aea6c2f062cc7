use std::io::Write;

use crate::context::SyncContext;
use crate::dataset::{ExistingPairIndex, UserDataset};
use crate::error::SyncError;
use crate::models::UserRows;
use crate::prepare::prepare;
use crate::writer::write_records;

use super::stats::{progress_line, RunStats};

/// Build, prepare and write one user's rows. Returns the rows the
/// relational sink reported as persisted; an invalid dataset returns 0
/// without touching any sink. Fetch failures are returned to the caller.
pub async fn process_user(
    ctx: &SyncContext,
    pairs: &ExistingPairIndex,
    user: &UserRows,
) -> Result<usize, SyncError> {
    let dataset =
        UserDataset::from_rows(&user.user_id, &user.rows, ctx.fetcher.as_ref(), pairs).await?;

    if !dataset.is_valid() {
        tracing::debug!(
            target: "uvsync.driver",
            user_id = %user.user_id,
            rows = user.rows.len(),
            "no vectors to sync"
        );
        return Ok(0);
    }

    let records = prepare(&dataset, &ctx.targets.item_key);
    let outcome = write_records(ctx, dataset.user_id(), &records).await;
    Ok(outcome.inserted())
}

/// Sync every pending user, writing one progress line per user to `out`.
///
/// A failure inside one user is logged and counted as zero inserted rows;
/// only a failing row source or progress output aborts the run.
pub async fn run<W: Write>(ctx: &SyncContext, out: &mut W) -> Result<RunStats, SyncError> {
    let started = std::time::Instant::now();

    let users = ctx
        .row_source
        .load_users()
        .await
        .map_err(SyncError::RowSource)?;
    let pairs = ExistingPairIndex::load(ctx.pair_loader.as_ref()).await;

    tracing::info!(
        target: "uvsync.driver",
        stage = "run.start",
        users = users.len(),
        existing_pairs = pairs.len()
    );

    let mut stats = RunStats::default();

    for user in &users {
        let inserted = match process_user(ctx, &pairs, user).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(
                    target: "uvsync.driver",
                    stage = "run.user.failed",
                    user_id = %user.user_id,
                    error = %e
                );
                0
            }
        };

        stats.record(inserted);
        writeln!(out, "{}", progress_line(&user.user_id, inserted, &stats))?;
    }

    tracing::info!(
        target: "uvsync.driver",
        stage = "run.done",
        users = stats.users,
        users_with_inserts = stats.users_with_inserts,
        inserted = stats.inserted,
        elapsed_ms = started.elapsed().as_millis() as u64
    );

    Ok(stats)
}
