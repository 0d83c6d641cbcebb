//! Dynamic attribute definitions and value validation
//!
//! Attribute schemas are data. A definition declares its kind and the kind's
//! options; values are checked against that grammar before they reach storage.
//!
//! # Design Principles
//!
//! - Definitions are validated as a whole, every issue reported at once
//! - Values are validated fail-fast, first failure aborts the batch
//! - Kind dispatch is exhaustive, an unknown kind cannot be represented
//! - No coercion beyond trimming of string values
//! - Deterministic normalization

mod definition;
mod errors;
mod resolver;
mod size;
mod types;
mod value;

pub use definition::validate_definition;
pub use errors::{
    AttributeError, AttributeResult, DefinitionErrors, DefinitionIssue, DefinitionIssueCode,
};
pub use resolver::{
    attribute_slugs, normalize_attributes, normalize_with_index, AttributeValueInput,
    DefinitionIndex, NormalizedAttribute,
};
pub use size::{validate_size, ALPHA_SIZES, FREE_SIZE, SHOE_SIZE_MAX, SHOE_SIZE_MIN};
pub use types::{
    canonical_number, AgeGroup, AttributeDefinition, AttributeKind, AttributeRef, AttributeValue, ColorFormat,
    ColorOptions, EnumOptions, MultiselectOptions, RangeOptions, Scalar, SizeOptions, SizeType,
    ATTRIBUTE_KINDS,
};
pub use value::{validate_attribute_value, ValueValidator};
