//! Category error types

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::attribute::{AgeGroup, SizeType};

/// A single category policy violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryViolation {
    // ==================
    // Product scope
    // ==================
    /// Required attribute absent from the product
    #[error("Missing required product attribute: {attribute_slug}")]
    MissingRequiredAttribute { attribute_slug: String },

    /// Attribute used on the product or a variant but forbidden by the category
    #[error("Attribute {attribute_slug} is forbidden for this category")]
    ForbiddenAttributeUsed { attribute_slug: String },

    /// Attribute not attached to the category
    #[error("Attribute {attribute_slug} is not allowed for this category")]
    AttributeNotAllowedForCategory { attribute_slug: String },

    // ==================
    // Variant scope
    // ==================
    /// Required variant attribute absent from one variant
    #[error("Variant {variant_index}: missing required variant attribute: {attribute_slug}")]
    MissingRequiredVariantAttribute {
        variant_index: usize,
        attribute_slug: String,
    },

    /// Category mandates a size type and the variant declares none
    #[error("Variant {variant_index}: sizeType must be provided (expected {expected})")]
    SizeTypeMissing {
        variant_index: usize,
        expected: SizeType,
    },

    /// Declared size type differs from the mandated one
    #[error("Variant {variant_index}: sizeType mismatch, expected {expected} but got {actual}")]
    SizeTypeMismatch {
        variant_index: usize,
        expected: SizeType,
        actual: String,
    },

    /// Variant carries none of the size attributes
    #[error("Variant {variant_index}: must include a size attribute ({})", .slugs.join(" or "))]
    SizeAttributeMissing {
        variant_index: usize,
        slugs: Vec<String>,
    },

    // ==================
    // Age group
    // ==================
    #[error("ageGroup must be provided (allowed: {})", join_groups(.allowed))]
    AgeGroupMissing { allowed: Vec<AgeGroup> },

    #[error("ageGroup {age_group} is not allowed (allowed: {})", join_groups(.allowed))]
    AgeGroupNotAllowed {
        age_group: AgeGroup,
        allowed: Vec<AgeGroup>,
    },
}

fn join_groups(groups: &[AgeGroup]) -> String {
    groups
        .iter()
        .map(AgeGroup::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl CategoryViolation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRequiredAttribute { .. } => "CATEGORY_MISSING_REQUIRED_ATTRIBUTE",
            Self::ForbiddenAttributeUsed { .. } => "CATEGORY_FORBIDDEN_ATTRIBUTE",
            Self::AttributeNotAllowedForCategory { .. } => "CATEGORY_ATTRIBUTE_NOT_ALLOWED",
            Self::MissingRequiredVariantAttribute { .. } => {
                "CATEGORY_MISSING_REQUIRED_VARIANT_ATTRIBUTE"
            }
            Self::SizeTypeMissing { .. } => "CATEGORY_SIZE_TYPE_MISSING",
            Self::SizeTypeMismatch { .. } => "CATEGORY_SIZE_TYPE_MISMATCH",
            Self::SizeAttributeMissing { .. } => "CATEGORY_SIZE_ATTRIBUTE_MISSING",
            Self::AgeGroupMissing { .. } => "CATEGORY_AGE_GROUP_MISSING",
            Self::AgeGroupNotAllowed { .. } => "CATEGORY_AGE_GROUP_NOT_ALLOWED",
        }
    }
}

/// Every violation found for one category in one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryViolations {
    pub category: String,
    pub violations: Vec<CategoryViolation>,
}

impl CategoryViolations {
    pub fn new(category: impl Into<String>, violations: Vec<CategoryViolation>) -> Self {
        Self {
            category: category.into(),
            violations,
        }
    }

    pub fn single(category: impl Into<String>, violation: CategoryViolation) -> Self {
        Self::new(category, vec![violation])
    }

    /// `Ok(())` when no violation was recorded.
    pub fn check(category: &str, violations: Vec<CategoryViolation>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self::new(category, violations))
        }
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.violations.iter().map(CategoryViolation::code).collect()
    }

    pub fn contains(&self, violation: &CategoryViolation) -> bool {
        self.violations.contains(violation)
    }
}

impl fmt::Display for CategoryViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category '{}' rules violated: ", self.category)?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl std::error::Error for CategoryViolations {}

/// Errors raised while building an attachment set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("Attribute {attribute_slug} ({attribute_id}) is attached to the category more than once")]
    DuplicateAttachment {
        attribute_id: Uuid,
        attribute_slug: String,
    },
}

impl AttachmentError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateAttachment { .. } => "CATEGORY_DUPLICATE_ATTACHMENT",
        }
    }
}
