//! Pinecone-compatible vector index client.

mod client;

pub use client::{resolve_host, PineconeIndex};
