//! Catalog collaborators
//!
//! The pipeline reads definitions and category attachments through
//! [`CatalogLookup`] and notifies an optional [`SearchIndexer`] after a
//! product is committed. Both are async seams; everything else is
//! synchronous.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::attribute::AttributeDefinition;
use crate::category::CategoryAttachment;

/// Boxed future returned by the collaborators
pub type LookupFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LookupError>> + Send + 'a>>;

/// Failure reported by a collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Backend could not be reached or answered with an error
    #[error("catalog backend unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with data that could not be decoded
    #[error("malformed catalog data: {0}")]
    Malformed(String),
}

impl LookupError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "LOOKUP_UNAVAILABLE",
            Self::Malformed(_) => "LOOKUP_MALFORMED",
        }
    }
}

/// Read access to attribute definitions and category attachments.
pub trait CatalogLookup: Send + Sync {
    /// Definitions matching any of the ids or slugs.
    ///
    /// References with no match are simply absent from the result.
    fn lookup_definitions<'a>(
        &'a self,
        ids: &'a [Uuid],
        slugs: &'a [String],
    ) -> LookupFuture<'a, Vec<AttributeDefinition>>;

    /// Attachments of a category, empty when the category has none.
    fn lookup_category_attachments<'a>(
        &'a self,
        category_slug: &'a str,
    ) -> LookupFuture<'a, Vec<CategoryAttachment>>;
}

/// Best-effort search reindexing.
pub trait SearchIndexer: Send + Sync {
    fn reindex_product(&self, product_id: Uuid) -> LookupFuture<'_, ()>;
}

/// Catalog held in memory, loadable from a JSON snapshot.
///
/// ```json
/// {
///   "definitions": [{ "id": "...", "slug": "size", "name": "Size", "kind": "size", "options": { "type": "ALPHA" } }],
///   "categories": { "tops": [{ "attributeId": "...", "attributeSlug": "size", "variantAllowed": true }] }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    definitions: Vec<AttributeDefinition>,
    #[serde(default)]
    categories: HashMap<String, Vec<CategoryAttachment>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definition(mut self, definition: AttributeDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn with_category(
        mut self,
        category_slug: impl Into<String>,
        attachments: Vec<CategoryAttachment>,
    ) -> Self {
        self.categories.insert(category_slug.into(), attachments);
        self
    }

    pub fn definitions(&self) -> &[AttributeDefinition] {
        &self.definitions
    }

    /// Parses a JSON snapshot. Definitions pass through definition validation.
    pub fn from_json(text: &str) -> Result<Self, LookupError> {
        serde_json::from_str(text).map_err(|e| LookupError::Malformed(e.to_string()))
    }

    fn matching(&self, ids: &[Uuid], slugs: &[String]) -> Vec<AttributeDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.id.is_some_and(|id| ids.contains(&id)) || slugs.contains(&d.slug))
            .cloned()
            .collect()
    }
}

impl CatalogLookup for InMemoryCatalog {
    fn lookup_definitions<'a>(
        &'a self,
        ids: &'a [Uuid],
        slugs: &'a [String],
    ) -> LookupFuture<'a, Vec<AttributeDefinition>> {
        Box::pin(async move { Ok(self.matching(ids, slugs)) })
    }

    fn lookup_category_attachments<'a>(
        &'a self,
        category_slug: &'a str,
    ) -> LookupFuture<'a, Vec<CategoryAttachment>> {
        Box::pin(async move {
            Ok(self
                .categories
                .get(category_slug)
                .cloned()
                .unwrap_or_default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKind;

    #[tokio::test]
    async fn test_lookup_by_id_or_slug() {
        let color_id = Uuid::new_v4();
        let catalog = InMemoryCatalog::new()
            .with_definition(AttributeDefinition::new("color", "Color", AttributeKind::String).with_id(color_id))
            .with_definition(AttributeDefinition::new("brand", "Brand", AttributeKind::String).with_id(Uuid::new_v4()))
            .with_definition(AttributeDefinition::new("fit", "Fit", AttributeKind::String).with_id(Uuid::new_v4()));

        let found = catalog
            .lookup_definitions(&[color_id], &["fit".to_string()])
            .await
            .unwrap();
        let slugs: Vec<_> = found.iter().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, vec!["color", "fit"]);
    }

    #[tokio::test]
    async fn test_unknown_category_has_no_attachments() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog
            .lookup_category_attachments("garden")
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_snapshot_rejects_invalid_definition() {
        let err = InMemoryCatalog::from_json(
            r#"{"definitions":[{"slug":"w","name":"W","kind":"range","options":{"min":5,"max":1}}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), "LOOKUP_MALFORMED");
    }
}
