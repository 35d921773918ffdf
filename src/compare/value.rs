//! Type-aware value comparison
//!
//! The declared [`FieldType`] decides how two JSON values are compared:
//! exactly for integers and big numbers, as floating point for numbers,
//! chronologically for dates and timestamps, as booleans for booleans, and
//! lexicographically otherwise.
//!
//! The ordering is total. Values fall into three classes that never mix:
//! nulls first, then values readable as the declared type, then unreadable
//! values compared as text.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;
use std::cmp::Ordering;

use crate::models::FieldType;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Compare two values of the given type
///
/// Nulls sort before every non-null value and are equal to each other.
pub fn compare_values(field_type: FieldType, left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    let typed = match field_type {
        FieldType::Integer | FieldType::BigNumber => {
            compare_readable(left, right, as_decimal, Ord::cmp)
        }
        FieldType::Number => compare_readable(left, right, as_f64, compare_floats),
        FieldType::Date | FieldType::Timestamp => {
            compare_readable(left, right, as_timestamp, Ord::cmp)
        }
        FieldType::Boolean => compare_readable(left, right, as_bool, Ord::cmp),
        FieldType::String | FieldType::Binary | FieldType::Internet | FieldType::Json => None,
    };

    typed.unwrap_or_else(|| value_text(left).cmp(&value_text(right)))
}

/// Type-aware equality
pub fn values_equal(field_type: FieldType, left: &Value, right: &Value) -> bool {
    compare_values(field_type, left, right) == Ordering::Equal
}

/// Render a value for messages: strings unquoted, null as `null`
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// `None` when neither value is readable, leaving both to text comparison
fn compare_readable<T>(
    left: &Value,
    right: &Value,
    read: fn(&Value) -> Option<T>,
    cmp: fn(&T, &T) -> Ordering,
) -> Option<Ordering> {
    match (read(left), read(right)) {
        (Some(l), Some(r)) => Some(cmp(&l, &r)),
        (Some(_), None) => Some(Ordering::Less),
        (None, Some(_)) => Some(Ordering::Greater),
        (None, None) => None,
    }
}

/// Negative zero equals zero; NaN sorts by `total_cmp`
fn compare_floats(left: &f64, right: &f64) -> Ordering {
    if *left == 0.0 && *right == 0.0 {
        return Ordering::Equal;
    }
    left.total_cmp(right)
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    let decimal = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else if let Some(u) = n.as_u64() {
                Decimal::from(u)
            } else {
                Decimal::from_f64(n.as_f64()?)?
            }
        }
        Value::String(s) => {
            let text = s.trim();
            Decimal::from_str_exact(text)
                .or_else(|_| Decimal::from_scientific(text))
                .ok()?
        }
        Value::Bool(b) => Decimal::from(u8::from(*b)),
        _ => return None,
    };
    Some(if decimal.is_zero() { Decimal::ZERO } else { decimal })
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "y" | "yes" | "1" => Some(true),
            "false" | "n" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        // Epoch milliseconds
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        Value::String(s) => parse_timestamp(s.trim()),
        _ => None,
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_compare_is_not_lexicographic() {
        assert_eq!(
            compare_values(FieldType::Integer, &json!(9), &json!(10)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(FieldType::String, &json!("9"), &json!("10")),
            Ordering::Greater
        );
    }

    #[test]
    fn test_numeric_equality_across_representations() {
        assert!(values_equal(FieldType::Integer, &json!("123456"), &json!(123456)));
        assert!(values_equal(FieldType::Number, &json!(1.5), &json!("1.50")));
        assert!(!values_equal(FieldType::Number, &json!(1.5), &json!(1.51)));
    }

    #[test]
    fn test_dates_compare_chronologically() {
        assert_eq!(
            compare_values(FieldType::Date, &json!("2023/12/31"), &json!("2024-01-01")),
            Ordering::Less
        );
        assert!(values_equal(
            FieldType::Timestamp,
            &json!("2024-01-01T10:00:00Z"),
            &json!("2024-01-01 10:00:00")
        ));
    }

    #[test]
    fn test_nulls_sort_first() {
        assert_eq!(
            compare_values(FieldType::String, &Value::Null, &json!("a")),
            Ordering::Less
        );
        assert!(values_equal(FieldType::Integer, &Value::Null, &Value::Null));
    }

    #[test]
    fn test_booleans() {
        assert!(values_equal(FieldType::Boolean, &json!("Y"), &json!(true)));
        assert_eq!(
            compare_values(FieldType::Boolean, &json!(false), &json!(true)),
            Ordering::Less
        );
    }

    #[test]
    fn test_unparseable_falls_back_to_text() {
        assert_eq!(
            compare_values(FieldType::Integer, &json!("abc"), &json!("abd")),
            Ordering::Less
        );
    }

    #[test]
    fn test_readable_values_sort_before_unreadable() {
        assert_eq!(
            compare_values(FieldType::Integer, &json!(10), &json!("5x")),
            Ordering::Less
        );
        assert_eq!(
            compare_values(FieldType::Integer, &json!("5x"), &json!(9)),
            Ordering::Greater
        );
        assert!(!values_equal(FieldType::Integer, &json!(1), &json!("1x")));
    }

    #[test]
    fn test_big_numbers_compare_exactly() {
        assert!(!values_equal(
            FieldType::BigNumber,
            &json!("12345678901234567890.01"),
            &json!("12345678901234567890.02")
        ));
        assert!(values_equal(
            FieldType::BigNumber,
            &json!("12345678901234567890.10"),
            &json!("12345678901234567890.1")
        ));
        assert_eq!(
            compare_values(FieldType::BigNumber, &json!("0.30"), &json!(0.3)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_integers_beyond_i64_compare_exactly() {
        assert!(!values_equal(
            FieldType::Integer,
            &json!(18446744073709551615u64),
            &json!(18446744073709551614u64)
        ));
        assert_eq!(
            compare_values(FieldType::Integer, &json!(i64::MAX), &json!(u64::MAX)),
            Ordering::Less
        );
    }

    #[test]
    fn test_negative_zero_equals_zero() {
        assert!(values_equal(FieldType::Number, &json!(-0.0), &json!(0)));
        assert!(values_equal(FieldType::BigNumber, &json!("-0.00"), &json!(0)));
        assert_eq!(
            compare_values(FieldType::Number, &json!(-0.0), &json!(-1)),
            Ordering::Greater
        );
    }
}
