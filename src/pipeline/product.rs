//! Product attribute pipeline
//!
//! Stages, in order, each failing fast:
//! 1. load attachments (when a category is given) and definitions, one call each
//! 2. re-validate stored definitions
//! 3. normalize product and variant attributes
//! 4. attachment check (aggregated)
//! 5. category rules and age group (aggregated)
//! 6. mandated size type, per variant
//! 7. variant attribute sets, then SKUs
//! 8. variant preparation and storage rows
//!
//! Nothing is persisted here. The output is handed to the persistence layer.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{PipelineError, PipelineResult};
use super::lookup::{CatalogLookup, SearchIndexer};
use super::storage::{to_storage_rows, AttributeOwner, StoredAttributeRow};
use crate::attribute::{
    attribute_slugs, normalize_with_index, AgeGroup, AttributeDefinition, AttributeRef,
    AttributeValueInput, DefinitionIndex, NormalizedAttribute,
};
use crate::category::{
    check_category_attachment_rules, CategoryAttachments, CategoryRuleBook, CategoryViolations,
};
use crate::variant::{
    check_variant_attribute_sets, ensure_unique_skus, prepare_variant, PreparedVariant,
    VariantInput,
};

/// Product payload submitted for validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttributeRequest {
    /// Existing product id; one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
    /// Size type applied to variants that declare none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_type: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeValueInput>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

impl ProductAttributeRequest {
    fn category(&self) -> Option<&str> {
        self.category_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn all_inputs(&self) -> impl Iterator<Item = &AttributeValueInput> {
        self.attributes
            .iter()
            .chain(self.variants.iter().flat_map(|v| v.attributes.iter()))
    }

    /// Distinct ids and slugs referenced anywhere in the request, in order.
    pub fn references(&self) -> (Vec<Uuid>, Vec<String>) {
        let mut ids = Vec::new();
        let mut slugs = Vec::new();
        let mut seen = HashSet::new();
        for reference in self.all_inputs().flat_map(AttributeValueInput::references) {
            if !seen.insert(reference.clone()) {
                continue;
            }
            match reference {
                AttributeRef::ById(id) => ids.push(id),
                AttributeRef::BySlug(slug) => slugs.push(slug),
            }
        }
        (ids, slugs)
    }
}

/// Validated product, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedProduct {
    pub product_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    pub attributes: Vec<NormalizedAttribute>,
    pub variants: Vec<PreparedVariant>,
    pub storage_rows: Vec<StoredAttributeRow>,
}

/// Composes lookup, normalization and policy checks for one product.
pub struct ProductAttributePipeline {
    lookup: Arc<dyn CatalogLookup>,
    rules: Arc<CategoryRuleBook>,
    indexer: Option<Arc<dyn SearchIndexer>>,
}

impl ProductAttributePipeline {
    pub fn new(lookup: Arc<dyn CatalogLookup>, rules: Arc<CategoryRuleBook>) -> Self {
        Self {
            lookup,
            rules,
            indexer: None,
        }
    }

    pub fn with_indexer(mut self, indexer: Arc<dyn SearchIndexer>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    pub fn rules(&self) -> &CategoryRuleBook {
        &self.rules
    }

    /// Loads and re-validates the definitions referenced by `ids` and `slugs`.
    async fn load_definitions(
        &self,
        ids: &[Uuid],
        slugs: &[String],
    ) -> PipelineResult<Vec<AttributeDefinition>> {
        if ids.is_empty() && slugs.is_empty() {
            return Ok(Vec::new());
        }

        let definitions = self.lookup.lookup_definitions(ids, slugs).await?;
        for def in &definitions {
            def.validate()
                .map_err(|errors| PipelineError::StoredDefinitionInvalid {
                    slug: def.slug.clone(),
                    errors,
                })?;
        }
        Ok(definitions)
    }

    async fn load_attachments(&self, category: Option<&str>) -> PipelineResult<CategoryAttachments> {
        let Some(category) = category else {
            return Ok(CategoryAttachments::empty());
        };
        let raw = self.lookup.lookup_category_attachments(category).await?;
        CategoryAttachments::new(raw).map_err(|source| PipelineError::Attachment {
            category: category.to_string(),
            source,
        })
    }

    /// Normalizes a flat attribute list against the catalog.
    pub async fn normalize(
        &self,
        inputs: &[AttributeValueInput],
    ) -> PipelineResult<Vec<NormalizedAttribute>> {
        let request = ProductAttributeRequest {
            attributes: inputs.to_vec(),
            ..Default::default()
        };
        let (ids, slugs) = request.references();
        let definitions = self.load_definitions(&ids, &slugs).await?;
        let index = DefinitionIndex::new(&definitions);
        Ok(normalize_with_index(&index, inputs)?)
    }

    /// Validates a product with its variants.
    pub async fn process(&self, request: &ProductAttributeRequest) -> PipelineResult<ValidatedProduct> {
        let category = request.category();
        let attachments = self.load_attachments(category).await?;
        let (ids, slugs) = request.references();
        let definitions = self.load_definitions(&ids, &slugs).await?;
        let index = DefinitionIndex::new(&definitions);

        let product_attributes = normalize_with_index(&index, &request.attributes)?;
        let variant_attributes = request
            .variants
            .iter()
            .map(|v| normalize_with_index(&index, &v.attributes))
            .collect::<Result<Vec<_>, _>>()?;

        let product_slugs = attribute_slugs(&product_attributes);
        let variant_slugs: Vec<Vec<String>> =
            variant_attributes.iter().map(|a| attribute_slugs(a)).collect();

        if let Some(category) = category {
            check_category_attachment_rules(attachments.as_slice(), &product_slugs)
                .into_result(category)?;

            self.rules.enforce_with_age_group(
                category,
                &product_slugs,
                &variant_slugs,
                request.age_group,
            )?;

            for (variant_index, variant) in request.variants.iter().enumerate() {
                let declared = declared_size_type(request, variant);
                self.rules
                    .enforce_variant_size_type(
                        category,
                        variant_index,
                        declared,
                        &variant_slugs[variant_index],
                    )
                    .map_err(|v| CategoryViolations::single(category, v))?;
            }
        }

        check_variant_attribute_sets(&variant_attributes, &attachments)?;
        ensure_unique_skus(&request.variants)?;

        let product_id = request.product_id.unwrap_or_else(Uuid::new_v4);
        let mut storage_rows =
            to_storage_rows(AttributeOwner::Product(product_id), &product_attributes);

        let mut variants = Vec::with_capacity(request.variants.len());
        for (variant_index, (input, attributes)) in
            request.variants.iter().zip(variant_attributes).enumerate()
        {
            let prepared = prepare_variant(variant_index, input, attributes)?;
            storage_rows.extend(to_storage_rows(
                AttributeOwner::Variant(prepared.id),
                &prepared.attributes,
            ));
            variants.push(prepared);
        }

        tracing::info!(
            product_id = %product_id,
            category = category.unwrap_or("-"),
            attributes = product_attributes.len(),
            variants = variants.len(),
            rows = storage_rows.len(),
            "PRODUCT_ATTRIBUTES_VALIDATED"
        );

        Ok(ValidatedProduct {
            product_id,
            category_slug: category.map(str::to_string),
            attributes: product_attributes,
            variants,
            storage_rows,
        })
    }

    /// Forwards a committed product to the search indexer.
    ///
    /// Indexer failures are logged and never returned.
    pub async fn notify_committed(&self, product_id: Uuid) {
        let Some(indexer) = &self.indexer else {
            return;
        };
        match indexer.reindex_product(product_id).await {
            Ok(()) => tracing::debug!(product_id = %product_id, "SEARCH_REINDEX_OK"),
            Err(e) => tracing::warn!(
                product_id = %product_id,
                error = %e,
                "SEARCH_REINDEX_FAILED"
            ),
        }
    }
}

/// Size type a variant declares: its own, else the product's.
///
/// Never inferred from the size attribute; a category that mandates a size
/// type requires it to be declared.
fn declared_size_type<'r>(
    request: &'r ProductAttributeRequest,
    variant: &'r VariantInput,
) -> Option<&'r str> {
    [variant.size_type.as_deref(), request.size_type.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_references_are_distinct_and_ordered() {
        let id = Uuid::new_v4();
        let request = ProductAttributeRequest {
            attributes: vec![
                AttributeValueInput::by_slug("fabric", json!("Cotton")),
                AttributeValueInput::by_id(id, json!("x")),
            ],
            variants: vec![VariantInput {
                attributes: vec![
                    AttributeValueInput::by_slug("size", json!("M")),
                    AttributeValueInput::by_slug("fabric", json!("Wool")),
                ],
                ..Default::default()
            }],
            ..Default::default()
        };

        let (ids, slugs) = request.references();
        assert_eq!(ids, vec![id]);
        assert_eq!(slugs, vec!["fabric".to_string(), "size".to_string()]);
    }

    #[test]
    fn test_declared_size_type_is_never_inferred() {
        let mut request = ProductAttributeRequest::default();
        let variant = VariantInput::default();
        assert_eq!(declared_size_type(&request, &variant), None);

        request.size_type = Some(" ALPHA ".into());
        assert_eq!(declared_size_type(&request, &variant), Some("ALPHA"));

        let explicit = VariantInput {
            size_type: Some("numeric".into()),
            ..Default::default()
        };
        assert_eq!(declared_size_type(&request, &explicit), Some("numeric"));

        let blank = VariantInput {
            size_type: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(declared_size_type(&request, &blank), Some("ALPHA"));
    }
}
