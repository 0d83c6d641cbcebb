//! Variant error types

use thiserror::Error;

/// Result type for variant checks
pub type VariantResult<T> = Result<T, VariantError>;

/// Structural violations in a batch of variants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantError {
    /// Two variants share the same attribute combination
    #[error("Duplicate variant at index {index} (same attributes as variant {first_index})")]
    DuplicateVariant { index: usize, first_index: usize },

    #[error("Variant {variant_index}: duplicate attribute key {slug}")]
    DuplicateAttributeInVariant { variant_index: usize, slug: String },

    #[error("Variant {variant_index}: attribute not allowed as variant attribute -> {slug}")]
    AttributeNotAllowedAsVariantAttribute { variant_index: usize, slug: String },

    #[error("Duplicate SKU '{sku}' at index {index} (already used by variant {first_index})")]
    DuplicateSku {
        sku: String,
        index: usize,
        first_index: usize,
    },

    /// Price or inventory field out of range
    #[error("Variant {variant_index}: invalid {field}: {reason}")]
    InvalidVariantField {
        variant_index: usize,
        field: &'static str,
        reason: String,
    },
}

impl VariantError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateVariant { .. } => "VARIANT_DUPLICATE",
            Self::DuplicateAttributeInVariant { .. } => "VARIANT_DUPLICATE_ATTRIBUTE",
            Self::AttributeNotAllowedAsVariantAttribute { .. } => "VARIANT_ATTRIBUTE_NOT_ALLOWED",
            Self::DuplicateSku { .. } => "VARIANT_DUPLICATE_SKU",
            Self::InvalidVariantField { .. } => "VARIANT_INVALID_FIELD",
        }
    }

    /// Whether the violation is a conflict with another variant of the batch
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateVariant { .. } | Self::DuplicateSku { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_conflicts() {
        let dup = VariantError::DuplicateVariant {
            index: 1,
            first_index: 0,
        };
        assert_eq!(dup.code(), "VARIANT_DUPLICATE");
        assert!(dup.is_conflict());

        let not_allowed = VariantError::AttributeNotAllowedAsVariantAttribute {
            variant_index: 0,
            slug: "fabric".into(),
        };
        assert!(!not_allowed.is_conflict());
        assert_eq!(
            not_allowed.to_string(),
            "Variant 0: attribute not allowed as variant attribute -> fabric"
        );
    }
}
