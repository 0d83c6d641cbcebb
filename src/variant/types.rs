//! Variant input and output types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attribute::{AttributeValueInput, NormalizedAttribute};

/// Raw variant as submitted with a product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    /// Client-assigned id; one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    /// Decimal price, used when `price_cents` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    /// Declared size grammar, compared against the category's mandate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_type: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeValueInput>,
    #[serde(default)]
    pub inventory: Vec<InventoryInput>,
}

impl VariantInput {
    /// SKU with surrounding whitespace removed, `None` when blank.
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub quantity_on_hand: i64,
}

/// Inventory line ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub location: Option<String>,
    pub quantity_on_hand: u64,
}

/// Variant after attribute normalization and field preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedVariant {
    pub id: Uuid,
    /// Position of the variant in the request
    pub index: usize,
    pub sku: Option<String>,
    pub title: Option<String>,
    pub price_cents: Option<i64>,
    pub compare_at_cents: Option<i64>,
    pub barcode: Option<String>,
    pub attributes: Vec<NormalizedAttribute>,
    pub inventory: Vec<InventoryRow>,
}
