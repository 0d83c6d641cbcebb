//! Pipeline error types

use thiserror::Error;

use super::lookup::LookupError;
use crate::attribute::{AttributeError, DefinitionErrors};
use crate::category::{AttachmentError, CategoryViolations};
use crate::variant::VariantError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure of one product validation run.
///
/// Every stage is fail-fast; the aggregated category reports travel as one
/// error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Category(#[from] CategoryViolations),

    #[error(transparent)]
    Variant(#[from] VariantError),

    /// A definition returned by the lookup breaks definition invariants
    #[error("Stored attribute definition '{slug}' is invalid: {errors}")]
    StoredDefinitionInvalid {
        slug: String,
        errors: DefinitionErrors,
    },

    /// Attachments returned by the lookup are inconsistent
    #[error("Invalid category attachments for '{category}': {source}")]
    Attachment {
        category: String,
        #[source]
        source: AttachmentError,
    },

    #[error("Catalog lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Attribute(e) => e.code(),
            Self::Category(_) => "CATEGORY_RULES_VIOLATED",
            Self::Variant(e) => e.code(),
            Self::StoredDefinitionInvalid { .. } => "PIPELINE_STORED_DEFINITION_INVALID",
            Self::Attachment { .. } => "PIPELINE_INVALID_ATTACHMENTS",
            Self::Lookup(_) => "PIPELINE_LOOKUP_FAILED",
        }
    }

    /// HTTP status for the API layer
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Attribute(_) => 400,
            Self::Variant(e) if e.is_conflict() => 409,
            Self::Variant(_) => 400,
            Self::Category(_) => 422,
            Self::StoredDefinitionInvalid { .. } | Self::Attachment { .. } | Self::Lookup(_) => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryViolation;

    #[test]
    fn test_status_codes() {
        let err: PipelineError = AttributeError::MissingReference.into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.code(), "ATTR_MISSING_REFERENCE");

        let err: PipelineError = VariantError::DuplicateVariant {
            index: 1,
            first_index: 0,
        }
        .into();
        assert_eq!(err.status_code(), 409);

        let err: PipelineError = CategoryViolations::single(
            "tops",
            CategoryViolation::MissingRequiredAttribute {
                attribute_slug: "fit".into(),
            },
        )
        .into();
        assert_eq!(err.status_code(), 422);

        let err: PipelineError = LookupError::Unavailable("timeout".into()).into();
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.to_string(), "Catalog lookup failed: catalog backend unavailable: timeout");
    }
}
