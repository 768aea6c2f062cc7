pub mod bigquery;
pub mod factory;
pub mod http;
pub mod pinecone;
pub mod supabase;
