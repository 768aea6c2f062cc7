//! Per-user dataset construction.

mod builder;
mod pairs;

pub use builder::UserDataset;
pub use pairs::ExistingPairIndex;
