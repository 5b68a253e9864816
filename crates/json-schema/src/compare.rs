//! JSON value comparison helpers.
//!
//! `serde_json`'s `PartialEq` distinguishes `1` from `1.0`; JSON Schema's
//! `enum`/`const`/`uniqueItems` compare numbers by mathematical value, so
//! equality here goes through a numeric-aware walk.

use serde_json::Value;

/// Deep equality with numeric comparison by value.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| json_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Whether `n` is a whole multiple of `divisor`, with a relative tolerance
/// for float division noise.
pub fn is_multiple_of(n: f64, divisor: f64) -> bool {
    if divisor == 0.0 {
        return false;
    }
    let quotient = n / divisor;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= 1e-8 * quotient.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_equality() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!([1, 2]), &json!([1.0, 2.0])));
        assert!(json_equal(&json!({"a": 1}), &json!({"a": 1.0})));
        assert!(!json_equal(&json!(1), &json!(2)));
        assert!(!json_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_multiple_of() {
        assert!(is_multiple_of(10.0, 2.0));
        assert!(is_multiple_of(0.0075, 0.0001));
        assert!(!is_multiple_of(10.0, 3.0));
        assert!(!is_multiple_of(1.0, 0.0));
    }
}
