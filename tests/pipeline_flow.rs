//! Pipeline Flow Tests
//!
//! End-to-end tests for the product attribute pipeline:
//! - One lookup call per collaborator per product
//! - Stage order and fail-fast behavior
//! - Storage rows for product and variant attributes
//! - Indexer failures never fail the caller

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use catalog_attrs::attribute::{
    AttributeDefinition, AttributeKind, AttributeValueInput, RangeOptions, SizeType,
};
use catalog_attrs::category::{CategoryAttachment, CategoryRuleBook, CategoryViolation};
use catalog_attrs::config::CatalogConfig;
use catalog_attrs::pipeline::{
    AttributeOwner, CatalogLookup, InMemoryCatalog, LookupError, LookupFuture, PipelineError,
    ProductAttributePipeline, ProductAttributeRequest, SearchIndexer,
};
use catalog_attrs::variant::{VariantError, VariantInput};
use serde_json::json;
use tempfile::NamedTempFile;
use uuid::Uuid;

// =============================================================================
// Helper Functions
// =============================================================================

fn definition(raw: serde_json::Value) -> AttributeDefinition {
    let def: AttributeDefinition = serde_json::from_value(raw).unwrap();
    def.with_id(Uuid::new_v4())
}

fn tops_catalog() -> InMemoryCatalog {
    let fabric = definition(json!({ "slug": "fabric", "name": "Fabric", "kind": "enum",
        "options": { "choices": ["Cotton", "Linen"] } }));
    let fit = definition(json!({ "slug": "fit", "name": "Fit", "kind": "enum",
        "options": { "choices": ["Slim", "Regular"] } }));
    let size = definition(json!({ "slug": "size", "name": "Size", "kind": "size",
        "options": { "type": "ALPHA" } }));
    let color = definition(json!({ "slug": "color", "name": "Color", "kind": "color" }));

    let attachments = vec![
        CategoryAttachment::new(fabric.id.unwrap(), "fabric").required().at(0),
        CategoryAttachment::new(fit.id.unwrap(), "fit").at(1),
        CategoryAttachment::new(size.id.unwrap(), "size").variant_allowed().at(2),
        CategoryAttachment::new(color.id.unwrap(), "color").variant_allowed().at(3),
    ];

    InMemoryCatalog::new()
        .with_definition(fabric)
        .with_definition(fit)
        .with_definition(size)
        .with_definition(color)
        .with_category("tops", attachments)
}

fn variant(size: &str, color: &str) -> VariantInput {
    VariantInput {
        sku: Some(format!("TEE-{}-{}", color, size)),
        price: Some(19.99),
        attributes: vec![
            AttributeValueInput::by_slug("size", json!(size)),
            AttributeValueInput::by_slug("color", json!(color)),
        ],
        ..Default::default()
    }
}

fn tops_request() -> ProductAttributeRequest {
    ProductAttributeRequest {
        category_slug: Some("tops".into()),
        size_type: Some("ALPHA".into()),
        attributes: vec![
            AttributeValueInput::by_slug("fabric", json!("Cotton")),
            AttributeValueInput::by_slug("fit", json!("Slim")),
        ],
        variants: vec![variant("M", "Black"), variant("L", "Black")],
        ..Default::default()
    }
}

fn footwear_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_definition(definition(json!({ "slug": "material", "name": "Material",
            "kind": "string" })))
        .with_definition(definition(json!({ "slug": "primary_use", "name": "Primary use",
            "kind": "enum", "options": { "choices": ["Running", "Casual"] } })))
        .with_definition(definition(json!({ "slug": "shoe_size", "name": "Shoe size",
            "kind": "size", "options": { "type": "SHOES" } })))
}

fn footwear_request(size_type: Option<&str>) -> ProductAttributeRequest {
    ProductAttributeRequest {
        category_slug: Some("footwear".into()),
        attributes: vec![
            AttributeValueInput::by_slug("material", json!("Leather")),
            AttributeValueInput::by_slug("primary_use", json!("Running")),
        ],
        variants: vec![VariantInput {
            sku: Some("RUN-42".into()),
            size_type: size_type.map(str::to_string),
            attributes: vec![AttributeValueInput::by_slug("shoe_size", json!(10))],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn pipeline(catalog: InMemoryCatalog) -> ProductAttributePipeline {
    ProductAttributePipeline::new(Arc::new(catalog), Arc::new(CategoryRuleBook::builtin()))
}

/// Lookup that counts calls and delegates to an in-memory catalog.
struct CountingLookup {
    inner: InMemoryCatalog,
    definition_calls: AtomicUsize,
    attachment_calls: AtomicUsize,
}

impl CatalogLookup for CountingLookup {
    fn lookup_definitions<'a>(
        &'a self,
        ids: &'a [Uuid],
        slugs: &'a [String],
    ) -> LookupFuture<'a, Vec<AttributeDefinition>> {
        self.definition_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup_definitions(ids, slugs)
    }

    fn lookup_category_attachments<'a>(
        &'a self,
        category_slug: &'a str,
    ) -> LookupFuture<'a, Vec<CategoryAttachment>> {
        self.attachment_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup_category_attachments(category_slug)
    }
}

struct FailingLookup;

impl CatalogLookup for FailingLookup {
    fn lookup_definitions<'a>(
        &'a self,
        _ids: &'a [Uuid],
        _slugs: &'a [String],
    ) -> LookupFuture<'a, Vec<AttributeDefinition>> {
        Box::pin(async { Err(LookupError::Unavailable("connection refused".into())) })
    }

    fn lookup_category_attachments<'a>(
        &'a self,
        _category_slug: &'a str,
    ) -> LookupFuture<'a, Vec<CategoryAttachment>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

struct FailingIndexer {
    calls: AtomicUsize,
}

impl SearchIndexer for FailingIndexer {
    fn reindex_product(&self, _product_id: Uuid) -> LookupFuture<'_, ()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(LookupError::Unavailable("search cluster down".into())) })
    }
}

// =============================================================================
// Happy Path Tests
// =============================================================================

/// A compliant product passes with rows for product and variants.
#[tokio::test]
async fn test_compliant_product_passes() {
    let product = pipeline(tops_catalog())
        .process(&tops_request())
        .await
        .unwrap();

    assert_eq!(product.attributes.len(), 2);
    assert_eq!(product.variants.len(), 2);
    assert_eq!(product.variants[0].price_cents, Some(1999));
    assert_eq!(product.storage_rows.len(), 2 + 2 * 2);

    let product_rows = product
        .storage_rows
        .iter()
        .filter(|r| r.owner == AttributeOwner::Product(product.product_id))
        .count();
    assert_eq!(product_rows, 2);
    assert!(product
        .storage_rows
        .iter()
        .any(|r| r.owner == AttributeOwner::Variant(product.variants[1].id) && r.value == "L"));
}

/// Each collaborator is called once per product.
#[tokio::test]
async fn test_single_lookup_per_batch() {
    let lookup = Arc::new(CountingLookup {
        inner: tops_catalog(),
        definition_calls: AtomicUsize::new(0),
        attachment_calls: AtomicUsize::new(0),
    });
    let pipeline = ProductAttributePipeline::new(lookup.clone(), Arc::new(CategoryRuleBook::builtin()));

    pipeline.process(&tops_request()).await.unwrap();
    assert_eq!(lookup.definition_calls.load(Ordering::SeqCst), 1);
    assert_eq!(lookup.attachment_calls.load(Ordering::SeqCst), 1);
}

/// Identical requests normalize identically.
#[tokio::test]
async fn test_process_is_deterministic() {
    let pipeline = pipeline(tops_catalog());
    let request = tops_request();

    let first = pipeline.process(&request).await.unwrap();
    let second = pipeline.process(&request).await.unwrap();
    assert_eq!(first.attributes, second.attributes);
    let attrs = |p: &catalog_attrs::pipeline::ValidatedProduct| {
        p.variants.iter().map(|v| v.attributes.clone()).collect::<Vec<_>>()
    };
    assert_eq!(attrs(&first), attrs(&second));
}

// =============================================================================
// Failure Tests
// =============================================================================

/// An unknown attribute aborts the run.
#[tokio::test]
async fn test_unknown_attribute() {
    let mut request = tops_request();
    request
        .attributes
        .push(AttributeValueInput::by_slug("gsm", json!(180)));

    let err = pipeline(tops_catalog()).process(&request).await.unwrap_err();
    assert_eq!(err.code(), "ATTR_UNKNOWN_ATTRIBUTE");
    assert_eq!(err.status_code(), 400);
}

/// Attachment violations are reported for the category.
#[tokio::test]
async fn test_missing_required_attachment() {
    let mut request = tops_request();
    request.attributes.remove(0);

    let err = pipeline(tops_catalog()).process(&request).await.unwrap_err();
    match err {
        PipelineError::Category(violations) => {
            assert_eq!(violations.category, "tops");
            assert!(violations
                .codes()
                .contains(&"CATEGORY_MISSING_REQUIRED_ATTRIBUTE"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

/// A declared size type that contradicts the category fails for that variant.
#[tokio::test]
async fn test_size_type_mismatch() {
    let mut request = tops_request();
    request.variants[1].size_type = Some("NUMERIC".into());

    let err = pipeline(tops_catalog()).process(&request).await.unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert!(err.to_string().contains("Variant 1"));
}

/// A mandated size type must be declared even when the size attribute implies it.
#[tokio::test]
async fn test_undeclared_size_type_is_missing() {
    let pipeline = pipeline(footwear_catalog());

    let err = pipeline.process(&footwear_request(None)).await.unwrap_err();
    match err {
        PipelineError::Category(violations) => {
            assert_eq!(
                violations.violations,
                vec![CategoryViolation::SizeTypeMissing {
                    variant_index: 0,
                    expected: SizeType::Shoes
                }]
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let product = pipeline
        .process(&footwear_request(Some("shoes")))
        .await
        .unwrap();
    assert_eq!(product.variants.len(), 1);
}

/// Two variants with the same combination conflict.
#[tokio::test]
async fn test_duplicate_variant_conflict() {
    let mut request = tops_request();
    request.variants[1] = variant("M", "Black");
    request.variants[1].sku = Some("OTHER-SKU".into());

    let err = pipeline(tops_catalog()).process(&request).await.unwrap_err();
    assert_eq!(
        err,
        PipelineError::Variant(VariantError::DuplicateVariant {
            index: 1,
            first_index: 0
        })
    );
    assert_eq!(err.status_code(), 409);
}

/// SKUs are unique within a product.
#[tokio::test]
async fn test_duplicate_sku() {
    let mut request = tops_request();
    request.variants[1].sku = request.variants[0].sku.clone();

    let err = pipeline(tops_catalog()).process(&request).await.unwrap_err();
    assert_eq!(err.code(), "VARIANT_DUPLICATE_SKU");
}

/// A stored definition that breaks invariants is an upstream fault.
#[tokio::test]
async fn test_invalid_stored_definition() {
    let broken = AttributeDefinition::new(
        "weight",
        "Weight",
        AttributeKind::Range(RangeOptions {
            min: 10.0,
            max: 1.0,
            step: None,
        }),
    )
    .with_id(Uuid::new_v4());
    let catalog = InMemoryCatalog::new().with_definition(broken);
    let request = ProductAttributeRequest {
        attributes: vec![AttributeValueInput::by_slug("weight", json!(5))],
        ..Default::default()
    };

    let err = pipeline(catalog).process(&request).await.unwrap_err();
    assert_eq!(err.code(), "PIPELINE_STORED_DEFINITION_INVALID");
    assert_eq!(err.status_code(), 502);
}

/// Lookup failures surface as lookup errors.
#[tokio::test]
async fn test_lookup_failure() {
    let pipeline = ProductAttributePipeline::new(Arc::new(FailingLookup), Arc::new(CategoryRuleBook::builtin()));
    let err = pipeline.process(&tops_request()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Lookup(_)));
}

/// A product without category skips category policy.
#[tokio::test]
async fn test_uncategorized_product() {
    let request = ProductAttributeRequest {
        attributes: vec![AttributeValueInput::by_slug("color", json!("Teal"))],
        ..Default::default()
    };
    let product = pipeline(tops_catalog()).process(&request).await.unwrap();
    assert_eq!(product.category_slug, None);
    assert_eq!(product.attributes[0].attribute_slug, "color");
}

// =============================================================================
// Collaborator Tests
// =============================================================================

/// Indexer failures are swallowed as warnings.
#[tokio::test]
async fn test_indexer_failure_does_not_propagate() {
    let indexer = Arc::new(FailingIndexer {
        calls: AtomicUsize::new(0),
    });
    let pipeline = pipeline(tops_catalog()).with_indexer(indexer.clone());

    let product = pipeline.process(&tops_request()).await.unwrap();
    pipeline.notify_committed(product.product_id).await;
    assert_eq!(indexer.calls.load(Ordering::SeqCst), 1);
}

/// Rules loaded from a config file replace the built-in table.
#[tokio::test]
async fn test_rules_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"categoryRules":[{{"categorySlug":"tops","forbiddenAttributes":["color"]}}]}}"#
    )
    .unwrap();
    let config = CatalogConfig::load(file.path()).unwrap();
    let pipeline = ProductAttributePipeline::new(Arc::new(tops_catalog()), Arc::new(config.rule_book()));

    let err = pipeline.process(&tops_request()).await.unwrap_err();
    assert!(err.to_string().contains("color"));
}

/// The normalize entry point needs no category.
#[tokio::test]
async fn test_normalize_entry_point() {
    let normalized = pipeline(tops_catalog())
        .normalize(&[AttributeValueInput::by_slug("size", json!("XL"))])
        .await
        .unwrap();
    assert_eq!(normalized[0].attribute_slug, "size");
}
