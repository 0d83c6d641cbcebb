//! Attribute error types
//!
//! Error codes:
//! - ATTR_DEFINITION_SHAPE (definition rejected, all issues reported together)
//! - ATTR_UNKNOWN_ATTRIBUTE
//! - ATTR_MISSING_REFERENCE
//! - ATTR_UNPERSISTED_DEFINITION
//! - ATTR_INVALID_VALUE

use std::fmt;

use thiserror::Error;

use super::types::{AttributeRef, ATTRIBUTE_KINDS};

/// Classification of a single definition issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionIssueCode {
    /// Definition is not a JSON object
    InvalidShape,
    /// Envelope field (slug, name, flags, ...) is missing or malformed
    InvalidField,
    /// `kind` names no known attribute kind
    UnsupportedKind,
    /// `options` does not satisfy the kind's option schema
    InvalidOptions,
    /// `pattern` does not compile or is not allowed for the kind
    InvalidPattern,
}

impl DefinitionIssueCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidShape => "ATTR_DEF_INVALID_SHAPE",
            Self::InvalidField => "ATTR_DEF_INVALID_FIELD",
            Self::UnsupportedKind => "ATTR_DEF_UNSUPPORTED_KIND",
            Self::InvalidOptions => "ATTR_DEF_INVALID_OPTIONS",
            Self::InvalidPattern => "ATTR_DEF_INVALID_PATTERN",
        }
    }
}

/// One field-scoped problem found while validating a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionIssue {
    /// Field path, e.g. "options" or "slug"
    pub field: String,
    pub code: DefinitionIssueCode,
    pub message: String,
}

impl DefinitionIssue {
    pub fn new(
        field: impl Into<String>,
        code: DefinitionIssueCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, DefinitionIssueCode::InvalidField, message)
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("{} is required", field);
        Self::new(field, DefinitionIssueCode::InvalidField, message)
    }

    pub fn options(message: impl Into<String>) -> Self {
        Self::new("options", DefinitionIssueCode::InvalidOptions, message)
    }

    pub fn pattern(message: impl Into<String>) -> Self {
        Self::new("pattern", DefinitionIssueCode::InvalidPattern, message)
    }

    pub fn unsupported_kind(kind: &str) -> Self {
        Self::new(
            "kind",
            DefinitionIssueCode::UnsupportedKind,
            format!(
                "unsupported attribute kind '{}' (expected one of: {})",
                kind,
                ATTRIBUTE_KINDS.join(", ")
            ),
        )
    }
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every issue found in one definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DefinitionErrors {
    issues: Vec<DefinitionIssue>,
}

impl DefinitionErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: DefinitionIssue) {
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> &[DefinitionIssue] {
        &self.issues
    }

    /// Whether any issue is scoped to `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    /// Whether any issue carries `code`
    pub fn has_code(&self, code: DefinitionIssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// `Ok(value)` when no issue was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for DefinitionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for DefinitionErrors {}

/// Result type for attribute operations
pub type AttributeResult<T> = Result<T, AttributeError>;

/// Errors raised while validating definitions or normalizing attribute values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("Invalid attribute definition: {0}")]
    DefinitionShape(DefinitionErrors),

    #[error("Unknown attribute: {reference}")]
    UnknownAttribute { reference: AttributeRef },

    #[error("Either attributeId or attributeSlug must be provided")]
    MissingReference,

    #[error("Attribute definition '{slug}' has not been persisted (no id)")]
    UnpersistedDefinition { slug: String },

    #[error("Invalid value for attribute '{attribute_slug}': {reason}")]
    InvalidAttributeValue {
        attribute_slug: String,
        reason: String,
    },
}

impl AttributeError {
    pub fn invalid_value(attribute_slug: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttributeValue {
            attribute_slug: attribute_slug.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::DefinitionShape(_) => "ATTR_DEFINITION_SHAPE",
            Self::UnknownAttribute { .. } => "ATTR_UNKNOWN_ATTRIBUTE",
            Self::MissingReference => "ATTR_MISSING_REFERENCE",
            Self::UnpersistedDefinition { .. } => "ATTR_UNPERSISTED_DEFINITION",
            Self::InvalidAttributeValue { .. } => "ATTR_INVALID_VALUE",
        }
    }
}
