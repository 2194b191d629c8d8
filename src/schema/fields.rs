use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use std::sync::OnceLock;
use thiserror::Error;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            code,
            message: message.into(),
        }
    }
}

/// Every field of a payload that failed validation, in schema order.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} field(s) failed validation: {}", .fields.len(), summarize(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError::new(field, code, message)],
        }
    }

    /// Whether `field` is among the failures
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ({})", f.field, f.code))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reads typed values out of an untyped JSON object, collecting every
/// failure instead of stopping at the first one.
///
/// Each accessor returns a placeholder when the field is invalid so a record
/// can still be assembled; [`FieldReader::finish`] discards it if anything
/// failed. Keys the schema never asks for are ignored.
pub struct FieldReader<'a> {
    input: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    pub fn new(input: &'a Value) -> Result<Self, ValidationError> {
        match input {
            Value::Object(map) => Ok(Self {
                input: map,
                errors: Vec::new(),
            }),
            other => Err(ValidationError::single(
                "body",
                "type_error",
                format!("expected a JSON object, got {}", type_name(other)),
            )),
        }
    }

    pub fn finish<T>(self, record: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(record)
        } else {
            Err(ValidationError {
                fields: self.errors,
            })
        }
    }

    /// Present and non-null value, or `None` when absent or null
    fn present(&self, name: &str) -> Option<&'a Value> {
        match self.input.get(name) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn fail(&mut self, name: &str, code: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError::new(name, code, message));
    }

    fn missing(&mut self, name: &str) {
        self.fail(name, "missing", "field required");
    }

    fn wrong_type(&mut self, name: &str, expected: &str, got: &Value) {
        self.fail(
            name,
            "type_error",
            format!("expected {}, got {}", expected, type_name(got)),
        );
    }

    /// Rejects an explicit null on a field whose default is not null.
    fn defaulted(&mut self, name: &str, expected: &str) -> Option<&'a Value> {
        match self.input.get(name) {
            None => None,
            Some(Value::Null) => {
                self.wrong_type(name, expected, &Value::Null);
                None
            }
            Some(value) => Some(value),
        }
    }

    pub fn required_text(&mut self, name: &str) -> String {
        match self.present(name) {
            None => {
                self.missing(name);
                String::new()
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.fail(name, "blank", "must not be empty");
                String::new()
            }
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                self.wrong_type(name, "a string", other);
                String::new()
            }
        }
    }

    pub fn optional_text(&mut self, name: &str) -> Option<String> {
        match self.present(name)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.wrong_type(name, "a string", other);
                None
            }
        }
    }

    pub fn email(&mut self, name: &str) -> String {
        let value = self.required_text(name);
        if !value.is_empty() && !is_valid_email(&value) {
            self.fail(name, "invalid_email", "not a valid email address");
        }
        value
    }

    pub fn integer(&mut self, name: &str, range: RangeInclusive<i64>, default: i64) -> i64 {
        match self.defaulted(name, "an integer") {
            None => default,
            Some(value) => self.check_integer(name, value, &range).unwrap_or(default),
        }
    }

    pub fn optional_integer(&mut self, name: &str, range: RangeInclusive<i64>) -> Option<i64> {
        let value = self.present(name)?;
        self.check_integer(name, value, &range)
    }

    fn check_integer(
        &mut self,
        name: &str,
        value: &Value,
        range: &RangeInclusive<i64>,
    ) -> Option<i64> {
        let n = match as_integer(value) {
            Integral::Fits(n) => Some(n),
            Integral::TooLarge => None,
            Integral::NotIntegral => {
                self.wrong_type(name, "an integer", value);
                return None;
            }
        };
        if !n.is_some_and(|n| range.contains(&n)) {
            self.fail(
                name,
                "out_of_range",
                format!("must be between {} and {}", range.start(), range.end()),
            );
            return None;
        }
        n
    }

    pub fn number_at_least(&mut self, name: &str, min: f64) -> f64 {
        match self.present(name) {
            None => {
                self.missing(name);
                min
            }
            Some(Value::Number(n)) => {
                let n = n.as_f64().unwrap_or(f64::NAN);
                if n.is_nan() || n < min {
                    self.fail(name, "out_of_range", format!("must be at least {}", min));
                    min
                } else {
                    n
                }
            }
            Some(other) => {
                self.wrong_type(name, "a number", other);
                min
            }
        }
    }

    pub fn boolean(&mut self, name: &str, default: bool) -> bool {
        match self.defaulted(name, "a boolean") {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                self.wrong_type(name, "a boolean", other);
                default
            }
        }
    }

    pub fn optional_date(&mut self, name: &str) -> Option<NaiveDate> {
        match self.present(name)? {
            Value::String(s) => match parse_strict_date(s) {
                Some(date) => Some(date),
                None => {
                    self.fail(name, "invalid_date", "expected a date as YYYY-MM-DD");
                    None
                }
            },
            other => {
                self.wrong_type(name, "a date string", other);
                None
            }
        }
    }

    pub fn text_list(&mut self, name: &str, default: impl FnOnce() -> Vec<String>) -> Vec<String> {
        let Some(value) = self.defaulted(name, "a list of strings") else {
            return default();
        };
        let Value::Array(items) = value else {
            self.wrong_type(name, "a list of strings", value);
            return default();
        };

        let mut list = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::String(s) => list.push(s.clone()),
                other => {
                    let field = format!("{}.{}", name, index);
                    self.wrong_type(&field, "a string", other);
                }
            }
        }
        list
    }
}

enum Integral {
    Fits(i64),
    /// Whole number outside the i64 range
    TooLarge,
    NotIntegral,
}

fn as_integer(value: &Value) -> Integral {
    let Value::Number(n) = value else {
        return Integral::NotIntegral;
    };
    if let Some(i) = n.as_i64() {
        return Integral::Fits(i);
    }
    if n.as_u64().is_some() {
        return Integral::TooLarge;
    }
    // 6.0 is an integer, 6.5 is not
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 => {
            if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Integral::Fits(f as i64)
            } else {
                Integral::TooLarge
            }
        }
        _ => Integral::NotIntegral,
    }
}

/// `YYYY-MM-DD` exactly; chrono alone also takes `2025-3-1` or `+2025-03-01`.
fn parse_strict_date(text: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    (date.format("%Y-%m-%d").to_string() == text).then_some(date)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
        )
        .expect("email pattern is a valid regex")
    })
}

pub fn is_valid_email(candidate: &str) -> bool {
    candidate.len() <= 254 && email_pattern().is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("jo@example.com"));
        assert!(is_valid_email("first.last+league@mail.example.org"));
        assert!(is_valid_email("a_b@sub-domain.io"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("")); // Empty
        assert!(!is_valid_email("jo")); // No @
        assert!(!is_valid_email("jo@example")); // No dot in domain
        assert!(!is_valid_email("jo@@example.com"));
        assert!(!is_valid_email("jo lee@example.com")); // Whitespace
        assert!(!is_valid_email(".jo@example.com"));
        assert!(!is_valid_email("jo..lee@example.com"));
        assert!(!is_valid_email("jo@-example.com"));
        assert!(!is_valid_email("jo@example..com"));
    }

    #[test]
    fn test_non_object_body() {
        let err = FieldReader::new(&json!([1, 2, 3])).err().unwrap();
        assert_eq!(err.fields.len(), 1);
        assert_eq!(err.fields[0].field, "body");
        assert_eq!(err.fields[0].code, "type_error");
    }

    #[test]
    fn test_collects_every_failure() {
        let input = json!({"a": 5, "b": "yes", "c": "2024-02-30"});
        let mut reader = FieldReader::new(&input).unwrap();
        reader.required_text("a");
        reader.boolean("b", true);
        reader.optional_date("c");
        reader.required_text("d");
        let err = reader.finish(()).unwrap_err();

        let fields: Vec<&str> = err.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "b", "c", "d"]);
        assert_eq!(err.fields[2].code, "invalid_date");
        assert_eq!(err.fields[3].code, "missing");
    }

    #[test]
    fn test_null_handling() {
        let input = json!({"opt": null, "flag": null, "name": null});
        let mut reader = FieldReader::new(&input).unwrap();
        assert_eq!(reader.optional_text("opt"), None);
        reader.boolean("flag", true);
        reader.required_text("name");
        let err = reader.finish(()).unwrap_err();

        assert_eq!(err.fields[0].field, "flag");
        assert_eq!(err.fields[0].code, "type_error");
        assert_eq!(err.fields[1].field, "name");
        assert_eq!(err.fields[1].code, "missing");
    }

    #[test]
    fn test_integer_rules() {
        let input = json!({"whole": 6.0, "frac": 6.5, "flag": true, "big": 13});
        let mut reader = FieldReader::new(&input).unwrap();
        assert_eq!(reader.integer("whole", 1..=12, 6), 6);
        reader.integer("frac", 1..=12, 6);
        reader.integer("flag", 1..=12, 6);
        reader.integer("big", 1..=12, 6);
        assert_eq!(reader.integer("absent", 1..=12, 6), 6);
        let err = reader.finish(()).unwrap_err();

        let codes: Vec<&str> = err.fields.iter().map(|f| f.code).collect();
        assert_eq!(codes, vec!["type_error", "type_error", "out_of_range"]);
    }

    #[test]
    fn test_huge_integer_is_out_of_range() {
        let input = json!({"a": 18446744073709551615u64, "b": 1e30, "c": -1e30});
        let mut reader = FieldReader::new(&input).unwrap();
        reader.integer("a", 1..=12, 6);
        reader.integer("b", 1..=12, 6);
        reader.optional_integer("c", 0..=120);
        let err = reader.finish(()).unwrap_err();

        let codes: Vec<&str> = err.fields.iter().map(|f| f.code).collect();
        assert_eq!(codes, vec!["out_of_range", "out_of_range", "out_of_range"]);
    }

    #[test]
    fn test_dates_must_be_exact() {
        let input = json!({"ok": "2025-03-01"});
        let mut reader = FieldReader::new(&input).unwrap();
        assert_eq!(reader.optional_date("ok"), NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(reader.finish(()).is_ok());

        for bad in ["2025-3-1", "25-03-01", " 2025-03-01", "+2025-03-01", "2025-03-01 ", "2025/03/01"] {
            let input = json!({"d": bad});
            let mut reader = FieldReader::new(&input).unwrap();
            assert_eq!(reader.optional_date("d"), None, "{:?} should be rejected", bad);
            let err = reader.finish(()).unwrap_err();
            assert_eq!(err.fields[0].code, "invalid_date");
        }
    }

    #[test]
    fn test_text_list_reports_bad_items() {
        let input = json!({"divisions": ["A", 2, "C"]});
        let mut reader = FieldReader::new(&input).unwrap();
        reader.text_list("divisions", Vec::new);
        let err = reader.finish(()).unwrap_err();
        assert!(err.has_field("divisions.1"));
    }

    #[test]
    fn test_blank_required_text() {
        let input = json!({"title": "   "});
        let mut reader = FieldReader::new(&input).unwrap();
        reader.required_text("title");
        let err = reader.finish(()).unwrap_err();
        assert_eq!(err.fields[0].code, "blank");
    }
}
