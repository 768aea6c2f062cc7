//! The per-user sync loop.

mod run;
mod stats;

pub use run::{process_user, run};
pub use stats::{progress_line, RunStats};
