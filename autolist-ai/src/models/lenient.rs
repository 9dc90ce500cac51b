//! Lenient deserializers for loosely typed JSON
//!
//! Model output and browser form state both arrive with numbers as strings,
//! nulls where strings are expected, and arrays mixing objects with junk.
//! These helpers accept what can be understood and drop the rest.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Read a number from a JSON number or a numeric string
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Read an integer; fractional numbers are not integers
pub fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Render scalars as text; null and containers become empty
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(&Value::deserialize(deserializer)?))
}

pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(string(deserializer)?).filter(|s| !s.is_empty()))
}

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_of(&Value::deserialize(deserializer)?))
}

pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_f64(deserializer)?.unwrap_or(0.0))
}

pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(integer_of(&Value::deserialize(deserializer)?))
}

pub fn opt_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_i64(deserializer)?.and_then(|n| i32::try_from(n).ok()))
}

/// Parse a string through `FromStr`, `None` when absent or unrecognized
pub fn opt_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Keep the array elements that are objects and deserialize as `T`
pub fn objects<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Deserialize an object as `T`; anything else (or a malformed object) is `T::default()`
pub fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        object @ Value::Object(_) => serde_json::from_value(object).unwrap_or_default(),
        _ => T::default(),
    })
}

/// Strings from an array, skipping blanks and non-scalars
pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .map(text_of)
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_from_strings() {
        assert_eq!(number_of(&json!("2.5")), Some(2.5));
        assert_eq!(number_of(&json!("1,6")), Some(1.6));
        assert_eq!(number_of(&json!(3)), Some(3.0));
        assert_eq!(number_of(&json!("n/a")), None);
        assert_eq!(number_of(&Value::Null), None);
    }

    #[test]
    fn test_integers_reject_fractions() {
        assert_eq!(integer_of(&json!(2015)), Some(2015));
        assert_eq!(integer_of(&json!(2015.0)), Some(2015));
        assert_eq!(integer_of(&json!("120000")), Some(120000));
        assert_eq!(integer_of(&json!(2015.5)), None);
        assert_eq!(integer_of(&json!("12 000 km")), None);
    }

    #[test]
    fn test_text_of_scalars() {
        assert_eq!(text_of(&json!("  sedan ")), "sedan");
        assert_eq!(text_of(&json!(4)), "4");
        assert_eq!(text_of(&Value::Null), "");
        assert_eq!(text_of(&json!({"a": 1})), "");
    }
}
