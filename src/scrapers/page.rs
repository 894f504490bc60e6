use chrono::NaiveDate;
use serde_json::Value;

use super::traits::Driver;
use crate::error::ExtractError;
use crate::models::parse_loose_date;

/// Evaluate `expression`; a driver failure means the page isn't usable yet.
pub async fn read(driver: &dyn Driver, expression: &str) -> Result<Value, ExtractError> {
    driver
        .evaluate(expression)
        .await
        .map_err(|e| ExtractError::NotReady(format!("{}: {:#}", expression, e)))
}

/// Like [`read`], but a missing value also means the page isn't ready.
pub async fn read_required(driver: &dyn Driver, expression: &str) -> Result<Value, ExtractError> {
    match read(driver, expression).await? {
        Value::Null => Err(ExtractError::NotReady(format!("{} is missing", expression))),
        value => Ok(value),
    }
}

pub async fn read_text(driver: &dyn Driver, selector: &str) -> Result<String, ExtractError> {
    driver
        .select_text(selector)
        .await
        .map_err(|e| ExtractError::NotReady(format!("{}: {:#}", selector, e)))
}

fn malformed(what: &str, value: &Value) -> ExtractError {
    ExtractError::Malformed(format!("{} has unexpected value {}", what, value))
}

pub fn as_str<'a>(value: &'a Value, what: &str) -> Result<&'a str, ExtractError> {
    value.as_str().ok_or_else(|| malformed(what, value))
}

pub fn as_date(value: &Value, what: &str) -> Result<NaiveDate, ExtractError> {
    as_str(value, what).and_then(|s| parse_loose_date(s).ok_or_else(|| malformed(what, value)))
}

/// Numbers, or numeric strings as some pages embed them
pub fn as_f64(value: &Value, what: &str) -> Result<f64, ExtractError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    };
    parsed.ok_or_else(|| malformed(what, value))
}

pub fn as_f64_list(value: &Value, what: &str) -> Result<Vec<f64>, ExtractError> {
    value
        .as_array()
        .ok_or_else(|| malformed(what, value))?
        .iter()
        .map(|item| as_f64(item, what))
        .collect()
}

pub fn as_opt_f64(value: &Value, what: &str) -> Result<Option<f64>, ExtractError> {
    match value {
        Value::Null => Ok(None),
        other => as_f64(other, what).map(Some),
    }
}

pub fn as_opt_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a displayed amount such as `$1,234.50`
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn amounts_drop_currency_and_separators() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.5));
        assert_eq!(parse_amount(" 99 "), Some(99.0));
        assert_eq!(parse_amount("call us"), None);
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        assert_eq!(as_f64(&json!(12), "x").unwrap(), 12.0);
        assert_eq!(as_f64(&json!("$80"), "x").unwrap(), 80.0);
        assert!(matches!(as_f64(&json!(true), "x"), Err(ExtractError::Malformed(_))));
        assert_eq!(as_opt_f64(&Value::Null, "x").unwrap(), None);
    }

    #[test]
    fn lists_reject_non_numeric_entries() {
        assert_eq!(as_f64_list(&json!([1, 2.5]), "rents").unwrap(), vec![1.0, 2.5]);
        assert!(as_f64_list(&json!([1, "n/a"]), "rents").is_err());
        assert!(as_f64_list(&json!({}), "rents").is_err());
    }

    #[test]
    fn dates_must_parse() {
        assert_eq!(
            as_date(&json!("2024-06-09T10:00:00Z"), "updated").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 9).unwrap()
        );
        assert!(matches!(as_date(&json!("tomorrow"), "updated"), Err(ExtractError::Malformed(_))));
    }
}
