//! PostgREST client for the relational mirror table.

mod client;

pub use client::{SupabaseClient, SupabasePairLoader};
