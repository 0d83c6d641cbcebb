//! Attribute type definitions
//!
//! Supported kinds:
//! - string: UTF-8 text, optionally constrained by a regex `pattern`
//! - number: finite JSON number
//! - boolean: literal true / false
//! - enum: single choice from `choices`
//! - multiselect: non-empty list of choices
//! - color: free text, hex code or palette member
//! - range: number within `[min, max]`
//! - size: explicit `sizes` list or a size grammar (`type`)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use uuid::Uuid;

use super::definition::validate_definition;
use super::errors::{AttributeError, DefinitionErrors};

/// Every kind tag accepted on the wire.
pub const ATTRIBUTE_KINDS: [&str; 8] = [
    "string",
    "number",
    "boolean",
    "enum",
    "multiselect",
    "color",
    "range",
    "size",
];

/// Size grammar selected by a size attribute or mandated by a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizeType {
    /// XS, S, M, L, XL, XXL
    Alpha,
    /// Any integer
    Numeric,
    /// Integer shoe size in [4, 15]
    Shoes,
    /// One size: the literal "FREE"
    Free,
}

impl SizeType {
    pub const ALL: [SizeType; 4] = [
        SizeType::Alpha,
        SizeType::Numeric,
        SizeType::Shoes,
        SizeType::Free,
    ];

    /// Returns the wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeType::Alpha => "ALPHA",
            SizeType::Numeric => "NUMERIC",
            SizeType::Shoes => "SHOES",
            SizeType::Free => "FREE",
        }
    }
}

impl fmt::Display for SizeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SizeType {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        SizeType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| format!("unknown size type '{}'", s))
    }
}

/// Age group a category may be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgeGroup {
    Adult,
    Teen,
    Kids,
    Toddler,
    Infant,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Adult => "ADULT",
            AgeGroup::Teen => "TEEN",
            AgeGroup::Kids => "KIDS",
            AgeGroup::Toddler => "TODDLER",
            AgeGroup::Infant => "INFANT",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    Hex,
    Name,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Options for `enum` attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumOptions {
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_custom: bool,
}

/// Options for `multiselect` attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiselectOptions {
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selected: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_custom: bool,
}

/// Options for `range` attributes. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeOptions {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Options for `size` attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeOptions {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub size_type: Option<SizeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
}

impl SizeOptions {
    /// The explicit size list, if one is declared and non-empty.
    pub fn explicit_sizes(&self) -> Option<&[String]> {
        self.sizes.as_deref().filter(|s| !s.is_empty())
    }
}

/// Options for `color` attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_format: Option<ColorFormat>,
}

impl ColorOptions {
    pub fn palette(&self) -> Option<&[String]> {
        self.palette.as_deref().filter(|p| !p.is_empty())
    }
}

/// Attribute kind together with its kind-specific options.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    String,
    Number,
    Boolean,
    Enum(EnumOptions),
    Multiselect(MultiselectOptions),
    Color(ColorOptions),
    Range(RangeOptions),
    Size(SizeOptions),
}

impl AttributeKind {
    /// Returns the wire tag for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Number => "number",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Enum(_) => "enum",
            AttributeKind::Multiselect(_) => "multiselect",
            AttributeKind::Color(_) => "color",
            AttributeKind::Range(_) => "range",
            AttributeKind::Size(_) => "size",
        }
    }

    /// Options payload as it appears on the wire, `None` for kinds without options.
    pub fn options_json(&self) -> Option<Value> {
        let options = match self {
            AttributeKind::String | AttributeKind::Number | AttributeKind::Boolean => {
                return None
            }
            AttributeKind::Enum(o) => serde_json::to_value(o),
            AttributeKind::Multiselect(o) => serde_json::to_value(o),
            AttributeKind::Color(o) => serde_json::to_value(o),
            AttributeKind::Range(o) => serde_json::to_value(o),
            AttributeKind::Size(o) => serde_json::to_value(o),
        };
        options.ok()
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A named, typed property attachable to products, variants and categories.
///
/// Deserializing goes through [`validate_definition`], so a definition read
/// from the wire always satisfies the option schema of its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct AttributeDefinition {
    /// Absent before the definition is persisted
    pub id: Option<Uuid>,
    /// Unique business key
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: AttributeKind,
    /// Regex for `string` attributes
    pub pattern: Option<String>,
    pub required: bool,
    pub searchable: bool,
    pub filterable: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl AttributeDefinition {
    /// Creates a definition with default flags and no id.
    pub fn new(slug: impl Into<String>, name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            id: None,
            slug: slug.into(),
            name: name.into(),
            description: None,
            kind,
            pattern: None,
            required: false,
            searchable: true,
            filterable: true,
            created_at: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Re-checks the definition invariants on an already typed value.
    pub fn validate(&self) -> Result<(), DefinitionErrors> {
        super::definition::check_definition(self)
    }

    /// Wire representation (camelCase keys, `kind` + `options`).
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(id) = self.id {
            obj.insert("id".into(), json!(id));
        }
        obj.insert("slug".into(), json!(self.slug));
        obj.insert("name".into(), json!(self.name));
        if let Some(description) = &self.description {
            obj.insert("description".into(), json!(description));
        }
        obj.insert("kind".into(), json!(self.kind.tag()));
        if let Some(options) = self.kind.options_json() {
            obj.insert("options".into(), options);
        }
        if let Some(pattern) = &self.pattern {
            obj.insert("pattern".into(), json!(pattern));
        }
        obj.insert("required".into(), json!(self.required));
        obj.insert("searchable".into(), json!(self.searchable));
        obj.insert("filterable".into(), json!(self.filterable));
        if let Some(created_at) = self.created_at {
            obj.insert("createdAt".into(), json!(created_at.to_rfc3339()));
        }
        Value::Object(obj)
    }
}

impl TryFrom<Value> for AttributeDefinition {
    type Error = AttributeError;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        validate_definition(&raw).map_err(AttributeError::DefinitionShape)
    }
}

impl From<AttributeDefinition> for Value {
    fn from(def: AttributeDefinition) -> Self {
        def.to_json()
    }
}

/// Explicit reference to an attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeRef {
    ById(Uuid),
    BySlug(String),
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeRef::ById(id) => write!(f, "{}", id),
            AttributeRef::BySlug(slug) => write!(f, "{}", slug),
        }
    }
}

/// Scalar attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
}

/// A validated attribute value.
///
/// The variant declares how the value is encoded for storage:
/// scalars as plain text, lists and JSON values as compact JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Scalar(Scalar),
    List(Vec<String>),
    Json(Value),
}

impl AttributeValue {
    pub fn text(s: impl Into<String>) -> Self {
        AttributeValue::Scalar(Scalar::Text(s.into()))
    }

    /// Numeric value in canonical form: integral numbers drop any
    /// fractional spelling, so `10` and `10.0` are the same value.
    pub fn number(n: Number) -> Self {
        AttributeValue::Scalar(Scalar::Number(canonical_number(n)))
    }

    pub fn boolean(b: bool) -> Self {
        AttributeValue::Scalar(Scalar::Bool(b))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// The value as plain JSON
    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            AttributeValue::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            AttributeValue::Scalar(Scalar::Text(s)) => Value::String(s.clone()),
            AttributeValue::List(items) => json!(items),
            AttributeValue::Json(v) => v.clone(),
        }
    }

    /// Canonical JSON text, used for variant identity keys.
    pub fn canonical_json(&self) -> String {
        self.to_json().to_string()
    }

    /// Text handed to the storage collaborator.
    pub fn to_storage_text(&self) -> String {
        match self {
            AttributeValue::Scalar(Scalar::Text(s)) => s.clone(),
            AttributeValue::Scalar(Scalar::Number(n)) => n.to_string(),
            AttributeValue::Scalar(Scalar::Bool(b)) => b.to_string(),
            AttributeValue::List(_) | AttributeValue::Json(_) => self.canonical_json(),
        }
    }

    /// Parses stored text back into a value, guided by the attribute kind.
    ///
    /// Text that does not parse under the kind's encoding is returned as text.
    pub fn from_storage_text(kind: &AttributeKind, text: &str) -> Self {
        match kind {
            AttributeKind::String | AttributeKind::Enum(_) | AttributeKind::Color(_) => {
                AttributeValue::text(text)
            }
            AttributeKind::Number | AttributeKind::Range(_) => parse_number(text),
            AttributeKind::Boolean => match text {
                "true" => AttributeValue::boolean(true),
                "false" => AttributeValue::boolean(false),
                _ => AttributeValue::text(text),
            },
            AttributeKind::Multiselect(_) => {
                if let Ok(items) = serde_json::from_str::<Vec<String>>(text) {
                    return AttributeValue::List(items);
                }
                match serde_json::from_str::<Value>(text) {
                    Ok(v @ (Value::Array(_) | Value::Object(_))) => AttributeValue::Json(v),
                    _ => AttributeValue::text(text),
                }
            }
            AttributeKind::Size(options) => {
                if options.explicit_sizes().is_some() {
                    return AttributeValue::text(text);
                }
                match options.size_type {
                    Some(SizeType::Numeric) | Some(SizeType::Shoes) => parse_number(text),
                    _ => AttributeValue::text(text),
                }
            }
        }
    }
}

/// One spelling per numeric value.
///
/// Integers stay as they are. Floats with no fractional part inside the
/// `i64` range become integers; other floats keep their shortest form.
pub fn canonical_number(n: Number) -> Number {
    if n.is_i64() || n.is_u64() {
        return n;
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Number::from(f as i64)
        }
        Some(f) => Number::from_f64(f).unwrap_or(n),
        None => n,
    }
}

fn parse_number(text: &str) -> AttributeValue {
    match serde_json::from_str::<Number>(text.trim()) {
        Ok(n) => AttributeValue::number(n),
        Err(_) => AttributeValue::text(text),
    }
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
