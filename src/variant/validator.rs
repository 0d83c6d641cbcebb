//! Variant attribute set validation
//!
//! Checks run in a fixed order and stop at the first violation:
//! 1. no attribute slug repeats within one variant
//! 2. every variant attribute is variant-allowed (when the category has attachments)
//! 3. no two variants share an attribute combination

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::errors::{VariantError, VariantResult};
use super::types::{InventoryInput, InventoryRow, PreparedVariant, VariantInput};
use crate::attribute::NormalizedAttribute;
use crate::category::CategoryAttachments;

/// Order-independent identity key of a variant's attribute combination.
///
/// Each pair is rendered as `attributeId:JSON(value)`; pairs are sorted and
/// joined with `|`.
pub fn variant_key(attributes: &[NormalizedAttribute]) -> String {
    let mut parts: Vec<String> = attributes
        .iter()
        .map(|a| format!("{}:{}", a.attribute_id, a.value.canonical_json()))
        .collect();
    parts.sort();
    parts.join("|")
}

/// Rejects two variants with the same attribute combination.
///
/// Variants without attributes share the empty key, so at most one of them
/// is accepted.
pub fn ensure_unique_variants(variants: &[Vec<NormalizedAttribute>]) -> VariantResult<()> {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(variants.len());
    for (index, attributes) in variants.iter().enumerate() {
        let key = variant_key(attributes);
        if let Some(&first_index) = seen.get(&key) {
            return Err(VariantError::DuplicateVariant { index, first_index });
        }
        seen.insert(key, index);
    }
    Ok(())
}

/// Rejects a slug repeated within one variant.
pub fn ensure_no_duplicate_attributes(variants: &[Vec<NormalizedAttribute>]) -> VariantResult<()> {
    for (variant_index, attributes) in variants.iter().enumerate() {
        let mut seen = HashSet::with_capacity(attributes.len());
        for attribute in attributes {
            if !seen.insert(attribute.attribute_slug.as_str()) {
                return Err(VariantError::DuplicateAttributeInVariant {
                    variant_index,
                    slug: attribute.attribute_slug.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Rejects variant attributes the category does not mark variant-allowed.
///
/// An empty attachment set does not scope variant attributes.
pub fn ensure_variant_allowed(
    variants: &[Vec<NormalizedAttribute>],
    attachments: &CategoryAttachments,
) -> VariantResult<()> {
    if attachments.is_empty() {
        return Ok(());
    }
    for (variant_index, attributes) in variants.iter().enumerate() {
        if let Some(attribute) = attributes
            .iter()
            .find(|a| !attachments.is_variant_allowed(&a.attribute_slug))
        {
            return Err(VariantError::AttributeNotAllowedAsVariantAttribute {
                variant_index,
                slug: attribute.attribute_slug.clone(),
            });
        }
    }
    Ok(())
}

/// Runs the three attribute set checks in order.
pub fn check_variant_attribute_sets(
    variants: &[Vec<NormalizedAttribute>],
    attachments: &CategoryAttachments,
) -> VariantResult<()> {
    ensure_no_duplicate_attributes(variants)?;
    ensure_variant_allowed(variants, attachments)?;
    ensure_unique_variants(variants)
}

/// Rejects a non-blank SKU used by two variants of the batch.
pub fn ensure_unique_skus(variants: &[VariantInput]) -> VariantResult<()> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, variant) in variants.iter().enumerate() {
        let Some(sku) = variant.sku() else {
            continue;
        };
        if let Some(&first_index) = seen.get(sku) {
            return Err(VariantError::DuplicateSku {
                sku: sku.to_string(),
                index,
                first_index,
            });
        }
        seen.insert(sku, index);
    }
    Ok(())
}

/// Builds the persistence shape of one variant.
///
/// Cents fields win over decimal prices; a decimal price is rounded to the
/// nearest cent. A variant without an id gets a fresh one.
pub fn prepare_variant(
    index: usize,
    input: &VariantInput,
    attributes: Vec<NormalizedAttribute>,
) -> VariantResult<PreparedVariant> {
    let price_cents = cents(index, "price", input.price_cents, input.price)?;
    let compare_at_cents = cents(
        index,
        "compareAtPrice",
        input.compare_at_cents,
        input.compare_at_price,
    )?;
    let inventory = input
        .inventory
        .iter()
        .map(|item| inventory_row(index, item))
        .collect::<VariantResult<Vec<_>>>()?;

    Ok(PreparedVariant {
        id: input.id.unwrap_or_else(Uuid::new_v4),
        index,
        sku: input.sku().map(str::to_string),
        title: input.title.clone(),
        price_cents,
        compare_at_cents,
        barcode: input.barcode.clone(),
        attributes,
        inventory,
    })
}

fn cents(
    variant_index: usize,
    field: &'static str,
    exact: Option<i64>,
    decimal: Option<f64>,
) -> VariantResult<Option<i64>> {
    let invalid = |reason: String| VariantError::InvalidVariantField {
        variant_index,
        field,
        reason,
    };

    if let Some(c) = exact {
        if c < 0 {
            return Err(invalid(format!("must not be negative, got {}", c)));
        }
        return Ok(Some(c));
    }

    match decimal {
        None => Ok(None),
        Some(p) if !p.is_finite() => Err(invalid("must be a finite number".into())),
        Some(p) if p < 0.0 => Err(invalid(format!("must not be negative, got {}", p))),
        Some(p) => {
            let c = (p * 100.0).round();
            if c > i64::MAX as f64 {
                return Err(invalid(format!("{} is too large", p)));
            }
            Ok(Some(c as i64))
        }
    }
}

fn inventory_row(variant_index: usize, item: &InventoryInput) -> VariantResult<InventoryRow> {
    let quantity_on_hand =
        u64::try_from(item.quantity_on_hand).map_err(|_| VariantError::InvalidVariantField {
            variant_index,
            field: "quantityOnHand",
            reason: format!("must not be negative, got {}", item.quantity_on_hand),
        })?;
    Ok(InventoryRow {
        location: item.location.clone(),
        quantity_on_hand,
    })
}
