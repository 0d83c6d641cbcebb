//! Value validator factory
//!
//! Builds a value-level validator from a validated definition. The grammar is
//! selected by an exhaustive match on the attribute kind, so a kind without a
//! grammar does not compile.
//!
//! Validation does not coerce between JSON types: a number is never accepted
//! as a string and vice versa. Strings are trimmed.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::errors::{AttributeError, AttributeResult, DefinitionErrors, DefinitionIssue};
use super::size::validate_size;
use super::types::{
    json_type_name, AttributeDefinition, AttributeKind, AttributeValue, ColorFormat,
    ColorOptions, EnumOptions, MultiselectOptions, RangeOptions,
};

const STEP_TOLERANCE: f64 = 1e-9;

static HEX_COLOR: OnceLock<Regex> = OnceLock::new();

fn hex_color() -> &'static Regex {
    HEX_COLOR.get_or_init(|| {
        Regex::new(r"^#?([A-Fa-f0-9]{3}|[A-Fa-f0-9]{6})$").expect("hex color pattern is a valid regex")
    })
}

/// Validator for the values of one attribute definition.
///
/// Borrows the definition; the string pattern is compiled once at build time.
pub struct ValueValidator<'a> {
    definition: &'a AttributeDefinition,
    pattern: Option<Regex>,
}

impl<'a> ValueValidator<'a> {
    /// Builds the validator for `definition`.
    ///
    /// # Errors
    ///
    /// `DefinitionShape` if the definition's pattern does not compile.
    pub fn for_definition(definition: &'a AttributeDefinition) -> AttributeResult<Self> {
        let pattern = match (&definition.kind, &definition.pattern) {
            (AttributeKind::String, Some(p)) => Some(Regex::new(p).map_err(|e| {
                let mut errors = DefinitionErrors::new();
                errors.push(DefinitionIssue::pattern(format!(
                    "invalid regex pattern: {}",
                    e
                )));
                AttributeError::DefinitionShape(errors)
            })?),
            _ => None,
        };
        Ok(Self {
            definition,
            pattern,
        })
    }

    pub fn definition(&self) -> &AttributeDefinition {
        self.definition
    }

    /// Validates and coerces a raw value.
    ///
    /// # Errors
    ///
    /// `InvalidAttributeValue` carrying the attribute slug and the reason.
    pub fn validate(&self, raw: &Value) -> AttributeResult<AttributeValue> {
        self.check(raw)
            .map_err(|reason| AttributeError::invalid_value(&self.definition.slug, reason))
    }

    fn check(&self, raw: &Value) -> Result<AttributeValue, String> {
        match &self.definition.kind {
            AttributeKind::String => self.check_string(raw),
            AttributeKind::Number => match raw {
                Value::Number(n) if n.as_f64().map_or(false, f64::is_finite) => {
                    Ok(AttributeValue::number(n.clone()))
                }
                other => Err(expected("number", other)),
            },
            AttributeKind::Boolean => match raw {
                Value::Bool(b) => Ok(AttributeValue::boolean(*b)),
                other => Err(expected("boolean", other)),
            },
            AttributeKind::Enum(options) => check_enum(options, raw),
            AttributeKind::Multiselect(options) => check_multiselect(options, raw),
            AttributeKind::Color(options) => check_color(options, raw),
            AttributeKind::Range(options) => check_range(options, raw),
            AttributeKind::Size(options) => validate_size(options, raw),
        }
    }

    fn check_string(&self, raw: &Value) -> Result<AttributeValue, String> {
        let Value::String(s) = raw else {
            return Err(expected("string", raw));
        };
        let trimmed = s.trim();
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(trimmed) {
                return Err(format!(
                    "'{}' does not match pattern {}",
                    trimmed,
                    pattern.as_str()
                ));
            }
        }
        Ok(AttributeValue::text(trimmed))
    }
}

/// Validates one value against a definition.
pub fn validate_attribute_value(
    definition: &AttributeDefinition,
    raw: &Value,
) -> AttributeResult<AttributeValue> {
    ValueValidator::for_definition(definition)?.validate(raw)
}

fn check_enum(options: &EnumOptions, raw: &Value) -> Result<AttributeValue, String> {
    let Value::String(s) = raw else {
        return Err(expected("string", raw));
    };
    if options.choices.is_empty() || options.allow_custom || options.choices.contains(s) {
        return Ok(AttributeValue::text(s.clone()));
    }
    Err(format!(
        "Invalid enum value '{}'. Expected one of: {}",
        s,
        options.choices.join(", ")
    ))
}

fn check_multiselect(options: &MultiselectOptions, raw: &Value) -> Result<AttributeValue, String> {
    let Value::Array(items) = raw else {
        return Err(expected("array", raw));
    };
    if items.is_empty() {
        return Err("at least one value must be selected".into());
    }

    let mut selected = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::String(s) if !s.is_empty() => selected.push(s.clone()),
            Value::String(_) => return Err(format!("item [{}] must not be empty", i)),
            other => return Err(format!("item [{}]: {}", i, expected("string", other))),
        }
    }

    if !options.allow_custom && !options.choices.is_empty() {
        if let Some(bad) = selected.iter().find(|s| !options.choices.contains(s)) {
            return Err(format!(
                "Invalid multiselect value '{}'. Expected any of: {}",
                bad,
                options.choices.join(", ")
            ));
        }
    }

    if let Some(max) = options.max_selected {
        if selected.len() > max as usize {
            return Err(format!(
                "at most {} values may be selected, got {}",
                max,
                selected.len()
            ));
        }
    }

    Ok(AttributeValue::List(selected))
}

fn check_color(options: &ColorOptions, raw: &Value) -> Result<AttributeValue, String> {
    let Value::String(s) = raw else {
        return Err(expected("string", raw));
    };
    if options.color_format == Some(ColorFormat::Hex) {
        if !hex_color().is_match(s) {
            return Err(format!("'{}' is not a 3- or 6-digit hex color", s));
        }
    } else if let Some(palette) = options.palette() {
        if !palette.contains(s) {
            return Err(format!("Color '{}' not in palette", s));
        }
    }
    Ok(AttributeValue::text(s.clone()))
}

fn check_range(options: &RangeOptions, raw: &Value) -> Result<AttributeValue, String> {
    let Value::Number(n) = raw else {
        return Err(expected("number", raw));
    };
    let v = n.as_f64().filter(|v| v.is_finite()).ok_or("expected finite number")?;
    if v < options.min || v > options.max {
        return Err(format!(
            "Value must be between {} and {}",
            options.min, options.max
        ));
    }
    if let Some(step) = options.step {
        let steps = (v - options.min) / step;
        if (steps - steps.round()).abs() > STEP_TOLERANCE {
            return Err(format!(
                "Value must be a multiple of {} from {}",
                step, options.min
            ));
        }
    }
    Ok(AttributeValue::number(n.clone()))
}

fn expected(kind: &str, actual: &Value) -> String {
    format!("expected {}, got {}", kind, json_type_name(actual))
}
