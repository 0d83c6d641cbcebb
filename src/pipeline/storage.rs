//! Storage encoding of normalized attributes
//!
//! Strings are stored as-is, numbers and booleans as their JSON text, lists
//! and JSON values as compact JSON. Decoding is driven by the definition's
//! kind, never by the text itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attribute::{
    AttributeError, AttributeRef, AttributeResult, AttributeValue, DefinitionIndex,
    NormalizedAttribute,
};

/// Entity an attribute row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum AttributeOwner {
    Product(Uuid),
    Variant(Uuid),
}

/// One attribute value as handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAttributeRow {
    pub attribute_id: Uuid,
    pub owner: AttributeOwner,
    pub value: String,
}

/// Encodes normalized attributes for one owner.
pub fn to_storage_rows(
    owner: AttributeOwner,
    attributes: &[NormalizedAttribute],
) -> Vec<StoredAttributeRow> {
    attributes
        .iter()
        .map(|a| StoredAttributeRow {
            attribute_id: a.attribute_id,
            owner,
            value: a.value.to_storage_text(),
        })
        .collect()
}

/// Decodes stored rows back into normalized attributes.
///
/// # Errors
///
/// `UnknownAttribute` if a row references a definition not in the index.
pub fn from_storage_rows(
    index: &DefinitionIndex<'_>,
    rows: &[StoredAttributeRow],
) -> AttributeResult<Vec<NormalizedAttribute>> {
    rows.iter()
        .map(|row| {
            let reference = AttributeRef::ById(row.attribute_id);
            let def = index
                .get(&reference)
                .ok_or(AttributeError::UnknownAttribute { reference })?;
            Ok(NormalizedAttribute {
                attribute_id: row.attribute_id,
                attribute_slug: def.slug.clone(),
                value: AttributeValue::from_storage_text(&def.kind, &row.value),
            })
        })
        .collect()
}
