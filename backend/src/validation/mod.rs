//! JSON Schema validation for search requests.
//!
//! Criteria arriving as JSON (HTTP body or `--criteria` file) are checked
//! against an embedded JSON Schema Draft 7 before being deserialized, so a
//! malformed request is reported with all of its errors at once instead
//! of the first serde error.
//!
//! # Embedded Schemas
//!
//! Embedded at compile time from the `schemas/` directory:
//! - `filter-criteria.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use buscador::validation::parse_criteria;
//!
//! let criteria = parse_criteria(&json!({
//!     "keywords": "agua, saneamiento",
//!     "departments": ["Cauca"],
//!     "startYears": ["Todos"]
//! }))?;
//! assert_eq!(criteria.departments.values(), ["Cauca"]);
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{CriteriaError, CriteriaResult};
use crate::transform::filter::FilterCriteria;

static FILTER_CRITERIA_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/filter-criteria.json"))
        .expect("Invalid embedded schema")
});

/// The embedded criteria schema, as served by `GET /api/schema`.
pub fn criteria_schema() -> &'static Value {
    &FILTER_CRITERIA_SCHEMA
}

/// Validate a JSON value against a schema.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with every error otherwise
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use buscador::validation::validate;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["keywords"],
///     "properties": { "keywords": { "type": "string" } }
/// });
///
/// assert!(validate(&schema, &json!({ "keywords": "agua" })).is_ok());
/// assert!(validate(&schema, &json!({ "keywords": 42 })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate against the criteria schema.
pub fn validate_criteria(data: &Value) -> Result<(), Vec<String>> {
    validate(criteria_schema(), data)
}

/// Validate then deserialize search criteria.
///
/// Dates must be real calendar days and an end-date range must not be
/// inverted; both are reported as [`CriteriaError`]s.
pub fn parse_criteria(data: &Value) -> CriteriaResult<FilterCriteria> {
    validate_criteria(data).map_err(|errors| CriteriaError::Schema { errors })?;

    let criteria: FilterCriteria = serde_json::from_value(data.clone())?;
    if let Some(range) = &criteria.end_date_range {
        range.check()?;
    }
    Ok(criteria)
}

/// Parse criteria from a JSON document.
pub fn parse_criteria_str(json: &str) -> CriteriaResult<FilterCriteria> {
    let value: Value = serde_json::from_str(json)?;
    parse_criteria(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::filter::Selection;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_full_request() {
        let criteria = parse_criteria(&json!({
            "keywords": "agua, saneamiento",
            "startYears": [2020, "Todos"],
            "endDateRange": { "min": "2021-01-01", "max": "2023-12-31" },
            "departments": ["Cauca", "Nariño"],
            "ods": ["6"]
        }))
        .unwrap();

        assert_eq!(criteria.keywords, "agua, saneamiento");
        assert!(criteria.start_years.has_all_marker());
        assert!(!criteria.start_years.is_active());
        assert_eq!(
            criteria.end_date_range.unwrap().max,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
        assert_eq!(criteria.departments, Selection::of(["Cauca".to_string(), "Nariño".to_string()]));
        assert_eq!(criteria.municipalities, Selection::none());
    }

    #[test]
    fn test_sectors_accepted() {
        let criteria = parse_criteria(&json!({ "sectors": ["Salud", "Todos"] })).unwrap();
        assert!(criteria.sectors.has_all_marker());
        assert_eq!(criteria.sectors.values(), ["Salud".to_string()]);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(parse_criteria(&json!({})).unwrap(), FilterCriteria::default());
        assert!(validate_criteria(&json!({ "endDateRange": null })).is_ok());
    }

    #[test]
    fn test_schema_errors_collected() {
        let err = parse_criteria(&json!({
            "keywords": 7,
            "startYears": ["dos mil"],
            "colour": "red"
        }))
        .unwrap_err();

        match err {
            CriteriaError::Schema { errors } => assert!(errors.len() >= 3, "{errors:?}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_date_shape() {
        assert!(validate_criteria(&json!({
            "endDateRange": { "min": "01/02/2021", "max": "2021-03-01" }
        }))
        .is_err());
    }

    #[test]
    fn test_impossible_date_is_json_error() {
        let err = parse_criteria(&json!({
            "endDateRange": { "min": "2021-02-30", "max": "2021-03-01" }
        }))
        .unwrap_err();
        assert!(matches!(err, CriteriaError::Json(_)));
    }

    #[test]
    fn test_inverted_range() {
        let err = parse_criteria_str(r#"{"endDateRange": {"min": "2022-01-01", "max": "2021-01-01"}}"#)
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvertedRange { .. }));
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["keywords"],
            "properties": { "keywords": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "keywords": "agua" })).is_ok());
        assert!(validate(&schema, &json!({})).is_err());
        assert!(validate(&schema, &json!({ "keywords": 1 })).is_err());
    }
}
