//! catalog-attrs - dynamic catalog attribute validation
//!
//! Attribute schemas are data: definitions declare a kind and its options,
//! values are validated against that grammar, and category policy decides
//! which attributes a product and its variants may carry.

pub mod attribute;
pub mod category;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod variant;
