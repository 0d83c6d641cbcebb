//! Orchestration of product attribute validation
//!
//! The only async boundary of the crate: definitions and attachments come
//! from a [`CatalogLookup`], one call each per product. Validation itself
//! is synchronous and leaves no side effects on failure.

mod errors;
mod lookup;
mod product;
pub mod storage;

pub use errors::{PipelineError, PipelineResult};
pub use lookup::{CatalogLookup, InMemoryCatalog, LookupError, LookupFuture, SearchIndexer};
pub use product::{ProductAttributePipeline, ProductAttributeRequest, ValidatedProduct};
pub use storage::{from_storage_rows, to_storage_rows, AttributeOwner, StoredAttributeRow};
