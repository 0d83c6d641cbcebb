//! Dynamic category attachments
//!
//! Attachments record which attributes apply to a category, whether the
//! product must carry them and whether variants may use them. An empty
//! attachment set means the category does not scope attributes at all.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AttachmentError, CategoryViolation, CategoryViolations};

/// One attribute attached to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAttachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub attribute_id: Uuid,
    pub attribute_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub variant_allowed: bool,
    #[serde(default)]
    pub position: i32,
}

impl CategoryAttachment {
    pub fn new(attribute_id: Uuid, attribute_slug: impl Into<String>) -> Self {
        Self {
            category_id: None,
            attribute_id,
            attribute_slug: attribute_slug.into(),
            name: None,
            required: false,
            variant_allowed: false,
            position: 0,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn variant_allowed(mut self) -> Self {
        self.variant_allowed = true;
        self
    }

    pub fn at(mut self, position: i32) -> Self {
        self.position = position;
        self
    }
}

/// Attachments of one category, ordered by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryAttachments {
    items: Vec<CategoryAttachment>,
}

impl CategoryAttachments {
    /// Sorts by position, ties keep input order.
    ///
    /// # Errors
    ///
    /// `DuplicateAttachment` if an attribute is attached twice.
    pub fn new(mut items: Vec<CategoryAttachment>) -> Result<Self, AttachmentError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert((item.category_id, item.attribute_id)) {
                return Err(AttachmentError::DuplicateAttachment {
                    attribute_id: item.attribute_id,
                    attribute_slug: item.attribute_slug.clone(),
                });
            }
        }
        items.sort_by_key(|a| a.position);
        Ok(Self { items })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryAttachment> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[CategoryAttachment] {
        &self.items
    }

    pub fn attribute_slugs(&self) -> Vec<String> {
        self.items.iter().map(|a| a.attribute_slug.clone()).collect()
    }

    /// Variant-allowed slugs in position order.
    pub fn variant_allowed_slugs(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|a| a.variant_allowed)
            .map(|a| a.attribute_slug.clone())
            .collect()
    }

    pub fn is_variant_allowed(&self, slug: &str) -> bool {
        self.items
            .iter()
            .any(|a| a.variant_allowed && a.attribute_slug == slug)
    }
}

/// Outcome of [`check_category_attachment_rules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentReport {
    pub ok: bool,
    pub errors: Vec<CategoryViolation>,
}

impl AttachmentReport {
    pub fn into_result(self, category: &str) -> Result<(), CategoryViolations> {
        CategoryViolations::check(category, self.errors)
    }
}

/// Checks product attribute slugs against the category's attachments.
///
/// Every required attachment must be present and every product slug must
/// be attached. Violations are aggregated.
pub fn check_category_attachment_rules(
    attachments: &[CategoryAttachment],
    product_slugs: &[String],
) -> AttachmentReport {
    let mut errors = Vec::new();

    if !attachments.is_empty() {
        for attachment in attachments.iter().filter(|a| a.required) {
            if !product_slugs.contains(&attachment.attribute_slug) {
                errors.push(CategoryViolation::MissingRequiredAttribute {
                    attribute_slug: attachment.attribute_slug.clone(),
                });
            }
        }

        let attached: HashSet<&str> = attachments
            .iter()
            .map(|a| a.attribute_slug.as_str())
            .collect();
        let mut reported = HashSet::new();
        for slug in product_slugs {
            if !attached.contains(slug.as_str()) && reported.insert(slug.as_str()) {
                errors.push(CategoryViolation::AttributeNotAllowedForCategory {
                    attribute_slug: slug.clone(),
                });
            }
        }
    }

    AttachmentReport {
        ok: errors.is_empty(),
        errors,
    }
}
