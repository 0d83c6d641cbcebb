//! Size value grammar
//!
//! An explicit `sizes` list always takes priority over `type`, even when the
//! value would satisfy the type's grammar. Without a list, `type` selects:
//! - ALPHA: XS, S, M, L, XL, XXL
//! - NUMERIC: any integer
//! - SHOES: integer in [4, 15]
//! - FREE: the literal "FREE"

use serde_json::{Number, Value};

use super::types::{json_type_name, AttributeValue, SizeOptions, SizeType};

pub const ALPHA_SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];
pub const SHOE_SIZE_MIN: i64 = 4;
pub const SHOE_SIZE_MAX: i64 = 15;
pub const FREE_SIZE: &str = "FREE";

/// Validates a size value, returning the reason on failure.
pub fn validate_size(options: &SizeOptions, raw: &Value) -> Result<AttributeValue, String> {
    if let Some(sizes) = options.explicit_sizes() {
        let value = match raw {
            Value::String(s) if !s.is_empty() => s,
            Value::String(_) => return Err("size must not be empty".into()),
            other => return Err(format!("expected string, got {}", json_type_name(other))),
        };
        if !sizes.iter().any(|s| s == value) {
            return Err(format!(
                "Invalid size '{}'. Allowed: {}",
                value,
                sizes.join(", ")
            ));
        }
        return Ok(AttributeValue::text(value.clone()));
    }

    let Some(size_type) = options.size_type else {
        return Err("Size attribute missing 'type' and no explicit sizes list".into());
    };

    match size_type {
        SizeType::Alpha => match raw {
            Value::String(s) if ALPHA_SIZES.contains(&s.as_str()) => {
                Ok(AttributeValue::text(s.clone()))
            }
            Value::String(s) => Err(format!(
                "Invalid size '{}'. Expected one of: {}",
                s,
                ALPHA_SIZES.join(", ")
            )),
            other => Err(format!("expected string, got {}", json_type_name(other))),
        },
        SizeType::Numeric => match raw {
            Value::Number(n) if is_integral(n) => Ok(AttributeValue::number(n.clone())),
            _ => Err(format!("expected integer size, got {}", describe(raw))),
        },
        SizeType::Shoes => match (raw, as_integer(raw)) {
            (Value::Number(n), Some(size)) if (SHOE_SIZE_MIN..=SHOE_SIZE_MAX).contains(&size) => {
                Ok(AttributeValue::number(n.clone()))
            }
            (Value::Number(_), Some(size)) => Err(format!(
                "Shoe size {} out of range [{}, {}]",
                size, SHOE_SIZE_MIN, SHOE_SIZE_MAX
            )),
            _ => Err(format!("expected integer shoe size, got {}", describe(raw))),
        },
        SizeType::Free => match raw {
            Value::String(s) if s == FREE_SIZE => Ok(AttributeValue::text(FREE_SIZE)),
            _ => Err(format!("expected \"{}\", got {}", FREE_SIZE, describe(raw))),
        },
    }
}

/// Integral JSON numbers, including floats with no fractional part.
fn as_integer(raw: &Value) -> Option<i64> {
    let Value::Number(n) = raw else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn is_integral(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

fn describe(raw: &Value) -> String {
    match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s),
        other => json_type_name(other).to_string(),
    }
}
