//! # Brazil Tech Mapper Common Library
//!
//! Shared code for the mapper services including:
//! - CNPJ root normalization
//! - Tech-scope and subsegment classification
//! - CSV ingestion with column alias resolution
//! - Listed-company registry (CVM) fetching and caching
//! - Filtering, summaries and CSV export
//! - Configuration loading

pub mod classify;
pub mod columns;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod registry;

pub use classify::Subsegment;
pub use error::{Error, Result};
pub use record::Record;
