pub mod api;
pub mod config;
pub mod context;
pub mod dataset;
pub mod driver;
pub mod error;
pub mod models;
pub mod prepare;
pub mod sink;
pub mod writer;
