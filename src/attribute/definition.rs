//! Attribute definition validation
//!
//! A proposed definition is checked as a whole and every problem is
//! reported at once, scoped to the field it concerns:
//! - envelope: slug format, non-empty name, id, description, flags, createdAt
//! - kind: must be one of the known kinds
//! - options: must satisfy the option schema of the kind
//! - pattern: must compile, string kind only
//!
//! Nothing is partially applied: the definition is returned only when no
//! issue was found.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::errors::{DefinitionErrors, DefinitionIssue, DefinitionIssueCode};
use super::types::{
    json_type_name, AttributeDefinition, AttributeKind, ColorOptions, EnumOptions,
    MultiselectOptions, RangeOptions, SizeOptions,
};

const MAX_DESCRIPTION_CHARS: usize = 1000;

static SLUG_PATTERN: OnceLock<Regex> = OnceLock::new();

fn slug_pattern() -> &'static Regex {
    SLUG_PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").expect("slug pattern is a valid regex")
    })
}

/// Validates a raw (wire) attribute definition.
///
/// # Errors
///
/// Returns every issue found; see [`DefinitionIssueCode`] for the classes.
pub fn validate_definition(raw: &Value) -> Result<AttributeDefinition, DefinitionErrors> {
    let mut errors = DefinitionErrors::new();

    let Some(obj) = raw.as_object() else {
        errors.push(DefinitionIssue::new(
            "$root",
            DefinitionIssueCode::InvalidShape,
            format!("expected object, got {}", json_type_name(raw)),
        ));
        return Err(errors);
    };

    let id = read_id(obj, &mut errors);
    let slug = read_slug(obj, &mut errors);
    let name = read_name(obj, &mut errors);
    let description = read_description(obj, &mut errors);
    let pattern = read_optional_string(obj, "pattern", &mut errors);
    let required = read_flag(obj, "required", false, &mut errors);
    let searchable = read_flag(obj, "searchable", true, &mut errors);
    let filterable = read_flag(obj, "filterable", true, &mut errors);
    let created_at = read_created_at(obj, &mut errors);
    let kind = read_kind(obj, &mut errors);

    if let Some(kind) = &kind {
        check_options(kind, &mut errors);
    }
    if let Some(pattern) = &pattern {
        check_pattern(pattern, kind.as_ref(), &mut errors);
    }

    match (slug, name, kind) {
        (Some(slug), Some(name), Some(kind)) => errors.into_result(AttributeDefinition {
            id,
            slug,
            name,
            description,
            kind,
            pattern,
            required,
            searchable,
            filterable,
            created_at,
        }),
        _ => {
            if errors.is_empty() {
                errors.push(DefinitionIssue::new(
                    "$root",
                    DefinitionIssueCode::InvalidShape,
                    "incomplete definition",
                ));
            }
            Err(errors)
        }
    }
}

/// Checks the invariants of an already typed definition.
pub(crate) fn check_definition(def: &AttributeDefinition) -> Result<(), DefinitionErrors> {
    let mut errors = DefinitionErrors::new();

    if let Some(message) = slug_issue(&def.slug) {
        errors.push(DefinitionIssue::invalid_field("slug", message));
    }
    if def.name.trim().is_empty() {
        errors.push(DefinitionIssue::invalid_field("name", "name must not be empty"));
    }
    if let Some(description) = &def.description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            errors.push(description_too_long());
        }
    }
    check_options(&def.kind, &mut errors);
    if let Some(pattern) = &def.pattern {
        check_pattern(pattern, Some(&def.kind), &mut errors);
    }

    errors.into_result(())
}

fn read_id(obj: &Map<String, Value>, errors: &mut DefinitionErrors) -> Option<Uuid> {
    match obj.get("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match Uuid::parse_str(s) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(DefinitionIssue::invalid_field("id", "id must be a UUID"));
                None
            }
        },
        Some(other) => {
            errors.push(type_issue("id", "string", other));
            None
        }
    }
}

fn read_slug(obj: &Map<String, Value>, errors: &mut DefinitionErrors) -> Option<String> {
    match obj.get("slug") {
        Some(Value::String(s)) => {
            let slug = s.trim();
            match slug_issue(slug) {
                Some(message) => {
                    errors.push(DefinitionIssue::invalid_field("slug", message));
                    None
                }
                None => Some(slug.to_string()),
            }
        }
        None | Some(Value::Null) => {
            errors.push(DefinitionIssue::missing_field("slug"));
            None
        }
        Some(other) => {
            errors.push(type_issue("slug", "string", other));
            None
        }
    }
}

fn slug_issue(slug: &str) -> Option<String> {
    if slug_pattern().is_match(slug) {
        None
    } else {
        Some(format!("invalid slug format '{}'", slug))
    }
}

fn read_name(obj: &Map<String, Value>, errors: &mut DefinitionErrors) -> Option<String> {
    match obj.get("name") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::String(_)) => {
            errors.push(DefinitionIssue::invalid_field("name", "name must not be empty"));
            None
        }
        None | Some(Value::Null) => {
            errors.push(DefinitionIssue::missing_field("name"));
            None
        }
        Some(other) => {
            errors.push(type_issue("name", "string", other));
            None
        }
    }
}

fn read_description(obj: &Map<String, Value>, errors: &mut DefinitionErrors) -> Option<String> {
    let description = read_optional_string(obj, "description", errors)?;
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        errors.push(description_too_long());
        return None;
    }
    Some(description)
}

fn description_too_long() -> DefinitionIssue {
    DefinitionIssue::invalid_field(
        "description",
        format!("description exceeds {} characters", MAX_DESCRIPTION_CHARS),
    )
}

fn read_optional_string(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut DefinitionErrors,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(type_issue(field, "string", other));
            None
        }
    }
}

fn read_flag(
    obj: &Map<String, Value>,
    field: &str,
    default: bool,
    errors: &mut DefinitionErrors,
) -> bool {
    match obj.get(field) {
        None | Some(Value::Null) => default,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            errors.push(type_issue(field, "boolean", other));
            default
        }
    }
}

fn read_created_at(
    obj: &Map<String, Value>,
    errors: &mut DefinitionErrors,
) -> Option<DateTime<Utc>> {
    let raw = read_optional_string(obj, "createdAt", errors)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            errors.push(DefinitionIssue::invalid_field(
                "createdAt",
                format!("createdAt must be an RFC 3339 timestamp: {}", e),
            ));
            None
        }
    }
}

fn read_kind(obj: &Map<String, Value>, errors: &mut DefinitionErrors) -> Option<AttributeKind> {
    let tag = match obj.get("kind") {
        Some(Value::String(s)) => s.as_str(),
        None | Some(Value::Null) => {
            errors.push(DefinitionIssue::missing_field("kind"));
            return None;
        }
        Some(other) => {
            errors.push(type_issue("kind", "string", other));
            return None;
        }
    };
    let options = obj.get("options").filter(|v| !v.is_null());

    match tag {
        "string" => no_options(tag, options, errors).then_some(AttributeKind::String),
        "number" => no_options(tag, options, errors).then_some(AttributeKind::Number),
        "boolean" => no_options(tag, options, errors).then_some(AttributeKind::Boolean),
        "enum" => parse_options::<EnumOptions>(options, errors).map(AttributeKind::Enum),
        "multiselect" => {
            parse_options::<MultiselectOptions>(options, errors).map(AttributeKind::Multiselect)
        }
        "color" => parse_options::<ColorOptions>(options, errors).map(AttributeKind::Color),
        "range" => parse_options::<RangeOptions>(options, errors).map(AttributeKind::Range),
        "size" => parse_options::<SizeOptions>(options, errors).map(AttributeKind::Size),
        other => {
            errors.push(DefinitionIssue::unsupported_kind(other));
            None
        }
    }
}

/// Kinds without options accept an absent, null or empty `options` object.
fn no_options(tag: &str, options: Option<&Value>, errors: &mut DefinitionErrors) -> bool {
    match options {
        None => true,
        Some(Value::Object(map)) if map.is_empty() => true,
        Some(_) => {
            errors.push(DefinitionIssue::options(format!(
                "kind '{}' takes no options",
                tag
            )));
            false
        }
    }
}

fn parse_options<T: DeserializeOwned>(
    options: Option<&Value>,
    errors: &mut DefinitionErrors,
) -> Option<T> {
    let raw = options
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    match serde_json::from_value::<T>(raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            errors.push(DefinitionIssue::options(e.to_string()));
            None
        }
    }
}

/// Semantic option checks that serde cannot express.
fn check_options(kind: &AttributeKind, errors: &mut DefinitionErrors) {
    match kind {
        AttributeKind::String | AttributeKind::Number | AttributeKind::Boolean => {}
        AttributeKind::Enum(o) => check_choices(&o.choices, errors),
        AttributeKind::Multiselect(o) => {
            check_choices(&o.choices, errors);
            if o.max_selected == Some(0) {
                errors.push(DefinitionIssue::options(
                    "maxSelected must be a positive integer",
                ));
            }
        }
        AttributeKind::Range(o) => {
            if !o.min.is_finite() || !o.max.is_finite() {
                errors.push(DefinitionIssue::options(
                    "range attributes must declare finite min and max",
                ));
            } else if o.min > o.max {
                errors.push(DefinitionIssue::options(format!(
                    "range min ({}) must be less than or equal to max ({})",
                    o.min, o.max
                )));
            }
            if let Some(step) = o.step {
                if !(step.is_finite() && step > 0.0) {
                    errors.push(DefinitionIssue::options("step must be a positive number"));
                }
            }
        }
        AttributeKind::Size(o) => {
            if o.size_type.is_none() && o.explicit_sizes().is_none() {
                errors.push(DefinitionIssue::options(
                    "size kind requires either type (ALPHA/NUMERIC/SHOES/FREE) or an explicit sizes list",
                ));
            }
            if o.sizes.iter().flatten().any(|s| s.is_empty()) {
                errors.push(DefinitionIssue::options("sizes must not contain empty strings"));
            }
        }
        AttributeKind::Color(_) => {}
    }
}

fn check_choices(choices: &[String], errors: &mut DefinitionErrors) {
    if choices.is_empty() {
        errors.push(DefinitionIssue::options("choices must not be empty"));
        return;
    }
    if choices.iter().any(|c| c.is_empty()) {
        errors.push(DefinitionIssue::options("choices must not contain empty strings"));
    }
    let mut seen = HashSet::new();
    for choice in choices {
        if !seen.insert(choice.as_str()) {
            errors.push(DefinitionIssue::options(format!(
                "duplicate choice '{}'",
                choice
            )));
        }
    }
}

fn check_pattern(pattern: &str, kind: Option<&AttributeKind>, errors: &mut DefinitionErrors) {
    if let Err(e) = Regex::new(pattern) {
        errors.push(DefinitionIssue::pattern(format!("invalid regex pattern: {}", e)));
    }
    if let Some(kind) = kind {
        if !matches!(kind, AttributeKind::String) {
            errors.push(DefinitionIssue::pattern(format!(
                "pattern is only supported for string attributes, not '{}'",
                kind.tag()
            )));
        }
    }
}

fn type_issue(field: &str, expected: &str, actual: &Value) -> DefinitionIssue {
    DefinitionIssue::invalid_field(
        field,
        format!("expected {}, got {}", expected, json_type_name(actual)),
    )
}
