//! Request validation.
//!
//! Every request type implements [`Validate`] by listing its rules as plain
//! code. All rules run; violations are collected into one
//! [`ValidationErrors`] keyed by field name instead of stopping at the first
//! failure. Nested payloads report their fields under a dotted prefix.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

pub(crate) const BLANK: &str = "cannot be blank";

/// Layout accepted by report date filters, e.g. `2021-12-04T00:00:00Z` or
/// `2021-12-04T00:00:00.250Z`.
const REPORT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Field-level violations of a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.insert(field.into(), message.into());
    }

    /// Record `rule`'s failure, if any, under `field`.
    pub fn check(&mut self, field: &str, rule: Result<(), String>) -> &mut Self {
        if let Err(message) = rule {
            self.add(field, message);
        }
        self
    }

    /// Merge a nested payload's violations under `prefix.`.
    pub fn nest(&mut self, prefix: &str, nested: Result<(), ValidationErrors>) -> &mut Self {
        if let Err(inner) = nested {
            for (field, message) in inner.fields {
                self.add(format!("{prefix}.{field}"), message);
            }
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .fields
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{rendered}.")
    }
}

impl std::error::Error for ValidationErrors {}

/// Implemented by every request type; evaluated before any network call.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

pub(crate) fn required_id(value: u64) -> Result<(), String> {
    if value == 0 {
        Err(BLANK.to_string())
    } else {
        Ok(())
    }
}

pub(crate) fn required_str(value: &str) -> Result<(), String> {
    if value.is_empty() {
        Err(BLANK.to_string())
    } else {
        Ok(())
    }
}

pub(crate) fn required<T>(value: &Option<T>) -> Result<(), String> {
    match value {
        Some(_) => Ok(()),
        None => Err(BLANK.to_string()),
    }
}

/// Required string whose length is within `min..=max` characters.
pub(crate) fn required_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    required_str(value)?;
    let len = value.chars().count();
    if len < min || len > max {
        return Err(format!("the length must be between {min} and {max}"));
    }
    Ok(())
}

pub(crate) fn in_range(value: i64, min: i64, max: i64) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

/// Optional report timestamp; an empty value passes.
pub(crate) fn report_date(value: &str) -> Result<(), String> {
    if value.is_empty() || NaiveDateTime::parse_from_str(value, REPORT_DATE_FORMAT).is_ok() {
        return Ok(());
    }
    Err(format!(
        "value '{value}' is invalid. It must have format 'YYYY-MM-DDThh:mm:ss[.fff]Z'"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_violation() {
        let mut errors = ValidationErrors::new();
        errors
            .check("edge_worker_id", required_id(0))
            .check("version", required_str(""))
            .check("name", required_length("ok", 1, 32));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("edge_worker_id"), Some(BLANK));
        assert_eq!(errors.get("version"), Some(BLANK));
        assert!(!errors.contains("name"));
    }

    #[test]
    fn display_lists_fields_in_order() {
        let mut errors = ValidationErrors::new();
        errors.add("version", "cannot be blank");
        errors.add("network", "cannot be blank");
        assert_eq!(errors.to_string(), "network: cannot be blank; version: cannot be blank.");
    }

    #[test]
    fn nested_fields_get_a_prefix() {
        let mut inner = ValidationErrors::new();
        inner.add("version", BLANK);
        let mut outer = ValidationErrors::new();
        outer.nest("activation", Err(inner)).nest("ignored", Ok(()));
        assert_eq!(outer.get("activation.version"), Some(BLANK));
        assert_eq!(outer.len(), 1);
    }

    #[test]
    fn length_bounds() {
        assert!(required_length(&"a".repeat(32), 1, 32).is_ok());
        assert_eq!(
            required_length(&"a".repeat(33), 1, 32).unwrap_err(),
            "the length must be between 1 and 32"
        );
        assert_eq!(required_length("", 1, 32).unwrap_err(), BLANK);
    }

    #[test]
    fn report_dates() {
        assert!(report_date("2021-12-04T00:00:00Z").is_ok());
        assert!(report_date("2021-12-04T00:00:00.999Z").is_ok());
        assert!(report_date("").is_ok());
        assert!(report_date("2021-12-04").is_err());
        assert!(report_date("2021-12-04T00:00:00+01:00").is_err());
    }

    #[test]
    fn range_rule() {
        assert!(in_range(15, 1, 720).is_ok());
        assert_eq!(in_range(1440, 1, 720).unwrap_err(), "must be between 1 and 720");
    }

    #[test]
    fn empty_errors_convert_to_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
