//! Free-text keyword matching over the project description columns.

use regex::{Regex, RegexBuilder};

use crate::error::CriteriaResult;
use crate::models::{Field, Record, Schema};
use crate::text::{normalize, normalize_str};

/// Columns searched by keywords, in order.
pub const KEYWORD_FIELDS: [Field; 2] = [Field::InterventionName, Field::GeneralObjective];

/// Split a comma-separated query into folded, non-empty tokens.
pub fn split_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|token| normalize_str(token.trim()))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Matches a record when any token occurs in any searched column.
///
/// Tokens are literal substrings: regex metacharacters typed by the user
/// are escaped, and whole-word boundaries are not required.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Regex,
    columns: Vec<usize>,
}

impl KeywordMatcher {
    /// Build a matcher for `input`.
    ///
    /// Returns `Ok(None)` when there is nothing to filter on: the query has
    /// no tokens, or none of the searched columns exist.
    pub fn new(input: &str, schema: &Schema) -> CriteriaResult<Option<Self>> {
        let tokens = split_keywords(input);
        if tokens.is_empty() {
            return Ok(None);
        }

        let columns: Vec<usize> = KEYWORD_FIELDS
            .iter()
            .filter_map(|f| schema.column(*f))
            .collect();
        if columns.is_empty() {
            return Ok(None);
        }

        let alternation = tokens
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()?;

        Ok(Some(Self { pattern, columns }))
    }

    pub fn is_match(&self, record: &Record) -> bool {
        self.columns
            .iter()
            .any(|&col| self.pattern.is_match(&normalize(record.get(col))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, Dataset};

    fn dataset(rows: &[(&str, &str)]) -> Dataset {
        Dataset::new(
            vec!["NOMBRE INTERVENCION".into(), "OBJETIVO GENERAL".into()],
            rows.iter()
                .map(|(name, goal)| vec![CellValue::text(*name), CellValue::text(*goal)])
                .collect(),
        )
    }

    #[test]
    fn test_split_keywords() {
        assert_eq!(split_keywords(" Bonos Verdes , CONSERVACIÓN forestal,, "), vec![
            "bonos verdes".to_string(),
            "conservacion forestal".to_string(),
        ]);
        assert!(split_keywords(" , ,").is_empty());
    }

    #[test]
    fn test_blank_query_is_no_filter() {
        let data = dataset(&[("a", "b")]);
        assert!(KeywordMatcher::new("   ", data.schema()).unwrap().is_none());
        assert!(KeywordMatcher::new("", data.schema()).unwrap().is_none());
    }

    #[test]
    fn test_accent_and_case_insensitive() {
        let data = dataset(&[("CAFE especial", ""), ("Café de origen", ""), ("Cacao", "")]);
        let matcher = KeywordMatcher::new("café", data.schema()).unwrap().unwrap();

        let hits: Vec<bool> = data.records().iter().map(|r| matcher.is_match(r)).collect();
        assert_eq!(hits, vec![true, true, false]);
    }

    #[test]
    fn test_any_token_any_column() {
        let data = dataset(&[("Agua potable", ""), ("", "Reforestación"), ("Vías", "Transporte")]);
        let matcher = KeywordMatcher::new("agua, bosque, reforest", data.schema())
            .unwrap()
            .unwrap();

        let hits: Vec<bool> = data.records().iter().map(|r| matcher.is_match(r)).collect();
        assert_eq!(hits, vec![true, true, false]);
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let data = dataset(&[("Fase (1)", ""), ("Fase 1", ""), ("a.b", ""), ("axb", "")]);
        let matcher = KeywordMatcher::new("(1), a.b", data.schema()).unwrap().unwrap();

        let hits: Vec<bool> = data.records().iter().map(|r| matcher.is_match(r)).collect();
        assert_eq!(hits, vec![true, false, true, false]);
    }

    #[test]
    fn test_missing_columns_skip_filter() {
        let data = Dataset::new(vec!["DEPARTAMENTO".into()], vec![vec![CellValue::text("X")]]);
        assert!(KeywordMatcher::new("agua", data.schema()).unwrap().is_none());
    }

    #[test]
    fn test_only_present_columns_searched() {
        let data = Dataset::new(
            vec!["OBJETIVO GENERAL".into()],
            vec![vec![CellValue::text("Bonos verdes")], vec![CellValue::Empty]],
        );
        let matcher = KeywordMatcher::new("verde", data.schema()).unwrap().unwrap();
        assert!(matcher.is_match(&data.records()[0]));
        assert!(!matcher.is_match(&data.records()[1]));
    }
}
