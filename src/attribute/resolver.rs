//! Attribute resolution and normalization
//!
//! Each input references its definition by id or slug. The id is tried
//! first, then the slug. The batch is fail-fast: the first unresolved
//! reference or invalid value aborts normalization of the whole batch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::{AttributeError, AttributeResult};
use super::types::{AttributeDefinition, AttributeRef, AttributeValue};
use super::value::ValueValidator;

/// Raw attribute value supplied by a product or variant request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValueInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_slug: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl AttributeValueInput {
    pub fn by_id(id: Uuid, value: Value) -> Self {
        Self {
            attribute_id: Some(id),
            attribute_slug: None,
            value,
        }
    }

    pub fn by_slug(slug: impl Into<String>, value: Value) -> Self {
        Self {
            attribute_id: None,
            attribute_slug: Some(slug.into()),
            value,
        }
    }

    fn slug(&self) -> Option<&str> {
        self.attribute_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// References in resolution order: id first, then slug.
    pub fn references(&self) -> Vec<AttributeRef> {
        let mut refs = Vec::with_capacity(2);
        if let Some(id) = self.attribute_id {
            refs.push(AttributeRef::ById(id));
        }
        if let Some(slug) = self.slug() {
            refs.push(AttributeRef::BySlug(slug.to_string()));
        }
        refs
    }

    /// The primary reference of this input.
    ///
    /// # Errors
    ///
    /// `MissingReference` when neither id nor slug is present.
    pub fn reference(&self) -> AttributeResult<AttributeRef> {
        self.references()
            .into_iter()
            .next()
            .ok_or(AttributeError::MissingReference)
    }
}

/// Validated attribute ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAttribute {
    pub attribute_id: Uuid,
    pub attribute_slug: String,
    pub value: AttributeValue,
}

/// Definitions visible to one request, indexed by id and slug.
pub struct DefinitionIndex<'a> {
    by_id: HashMap<Uuid, &'a AttributeDefinition>,
    by_slug: HashMap<&'a str, &'a AttributeDefinition>,
}

impl<'a> DefinitionIndex<'a> {
    pub fn new(definitions: &'a [AttributeDefinition]) -> Self {
        let mut by_id = HashMap::with_capacity(definitions.len());
        let mut by_slug = HashMap::with_capacity(definitions.len());
        for def in definitions {
            if let Some(id) = def.id {
                by_id.insert(id, def);
            }
            by_slug.insert(def.slug.as_str(), def);
        }
        Self { by_id, by_slug }
    }

    pub fn get(&self, reference: &AttributeRef) -> Option<&'a AttributeDefinition> {
        match reference {
            AttributeRef::ById(id) => self.by_id.get(id).copied(),
            AttributeRef::BySlug(slug) => self.by_slug.get(slug.as_str()).copied(),
        }
    }

    /// Resolves an input to exactly one definition.
    ///
    /// # Errors
    ///
    /// - `MissingReference` if the input carries neither id nor slug
    /// - `UnknownAttribute` if no definition matches
    pub fn resolve(&self, input: &AttributeValueInput) -> AttributeResult<&'a AttributeDefinition> {
        let refs = input.references();
        let Some(primary) = refs.first() else {
            return Err(AttributeError::MissingReference);
        };
        refs.iter()
            .find_map(|r| self.get(r))
            .ok_or_else(|| AttributeError::UnknownAttribute {
                reference: primary.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

/// Resolves and validates a batch of attribute inputs.
///
/// The output preserves input order. Identical input always yields
/// identical output.
///
/// # Errors
///
/// The first failure of the batch: `MissingReference`, `UnknownAttribute`,
/// `UnpersistedDefinition` or `InvalidAttributeValue`.
pub fn normalize_attributes(
    definitions: &[AttributeDefinition],
    inputs: &[AttributeValueInput],
) -> AttributeResult<Vec<NormalizedAttribute>> {
    let index = DefinitionIndex::new(definitions);
    normalize_with_index(&index, inputs)
}

/// Same as [`normalize_attributes`] against a prebuilt index.
pub fn normalize_with_index(
    index: &DefinitionIndex<'_>,
    inputs: &[AttributeValueInput],
) -> AttributeResult<Vec<NormalizedAttribute>> {
    let mut normalized = Vec::with_capacity(inputs.len());

    for input in inputs {
        let def = index.resolve(input)?;
        let attribute_id = def.id.ok_or_else(|| AttributeError::UnpersistedDefinition {
            slug: def.slug.clone(),
        })?;
        let value = ValueValidator::for_definition(def)?.validate(&input.value)?;

        normalized.push(NormalizedAttribute {
            attribute_id,
            attribute_slug: def.slug.clone(),
            value,
        });
    }

    tracing::debug!(count = normalized.len(), "ATTRIBUTES_NORMALIZED");
    Ok(normalized)
}

/// Slugs of a normalized list, in order.
pub fn attribute_slugs(attributes: &[NormalizedAttribute]) -> Vec<String> {
    attributes.iter().map(|a| a.attribute_slug.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::types::{AttributeKind, ColorOptions, EnumOptions};
    use serde_json::json;

    fn defs() -> Vec<AttributeDefinition> {
        vec![
            AttributeDefinition::new(
                "color",
                "Color",
                AttributeKind::Color(ColorOptions::default()),
            )
            .with_id(Uuid::new_v4()),
            AttributeDefinition::new(
                "fit",
                "Fit",
                AttributeKind::Enum(EnumOptions {
                    choices: vec!["Slim".into(), "Regular".into()],
                    allow_custom: false,
                }),
            )
            .with_id(Uuid::new_v4()),
        ]
    }

    #[test]
    fn test_resolves_by_slug_and_id() {
        let defs = defs();
        let fit_id = defs[1].id.unwrap();
        let out = normalize_attributes(
            &defs,
            &[
                AttributeValueInput::by_slug("color", json!("Black")),
                AttributeValueInput::by_id(fit_id, json!("Slim")),
            ],
        )
        .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].attribute_slug, "color");
        assert_eq!(out[0].value, AttributeValue::text("Black"));
        assert_eq!(out[1].attribute_id, fit_id);
    }

    #[test]
    fn test_id_falls_back_to_slug() {
        let defs = defs();
        let input = AttributeValueInput {
            attribute_id: Some(Uuid::new_v4()),
            attribute_slug: Some("fit".into()),
            value: json!("Regular"),
        };
        let out = normalize_attributes(&defs, &[input]).unwrap();
        assert_eq!(out[0].attribute_slug, "fit");
    }

    #[test]
    fn test_unknown_reference() {
        let err = normalize_attributes(
            &defs(),
            &[AttributeValueInput::by_slug("fabric", json!("Cotton"))],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AttributeError::UnknownAttribute {
                reference: AttributeRef::BySlug("fabric".into())
            }
        );
    }

    #[test]
    fn test_missing_reference() {
        let input = AttributeValueInput {
            attribute_id: None,
            attribute_slug: Some("  ".into()),
            value: json!("x"),
        };
        assert_eq!(
            normalize_attributes(&defs(), &[input]).unwrap_err(),
            AttributeError::MissingReference
        );
    }

    #[test]
    fn test_fail_fast_on_first_invalid_value() {
        let err = normalize_attributes(
            &defs(),
            &[
                AttributeValueInput::by_slug("fit", json!("Baggy")),
                AttributeValueInput::by_slug("unknown", json!(1)),
            ],
        )
        .unwrap_err();
        assert_eq!(err.code(), "ATTR_INVALID_VALUE");
    }

    #[test]
    fn test_unpersisted_definition() {
        let defs = vec![AttributeDefinition::new("brand", "Brand", AttributeKind::String)];
        let err = normalize_attributes(
            &defs,
            &[AttributeValueInput::by_slug("brand", json!("Acme"))],
        )
        .unwrap_err();
        assert_eq!(err.code(), "ATTR_UNPERSISTED_DEFINITION");
    }

    #[test]
    fn test_input_wire_format() {
        let input: AttributeValueInput =
            serde_json::from_value(json!({ "attributeSlug": "color", "value": "Red" })).unwrap();
        assert_eq!(input.reference().unwrap(), AttributeRef::BySlug("color".into()));
    }
}
