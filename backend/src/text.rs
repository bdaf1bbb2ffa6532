//! Case and accent folding for search.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization as _;

use crate::models::CellValue;

/// Fold a string to lowercase without diacritics.
///
/// Lowercases, decomposes with NFD and drops combining marks, so
/// `"Café"`, `"CAFE"` and `"cafe"` all fold to `"cafe"`. Idempotent.
pub fn normalize_str(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Fold a cell; empty cells fold to `""`.
pub fn normalize(value: &CellValue) -> String {
    value
        .to_text()
        .map(|text| normalize_str(&text))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_accents() {
        assert_eq!(normalize_str("Café"), "cafe");
        assert_eq!(normalize_str("CAFÉ"), "cafe");
        assert_eq!(normalize_str("Nariño"), "narino");
        assert_eq!(normalize_str("vérde"), "verde");
    }

    #[test]
    fn test_idempotent() {
        for input in ["Bonos Verdes", "ÁRBOLES Ñandú", "İstanbul", "ǅemal", ""] {
            let once = normalize_str(input);
            assert_eq!(normalize_str(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_null_is_empty() {
        assert_eq!(normalize(&CellValue::Empty), "");
        assert_eq!(normalize(&CellValue::Number(13.0)), "13");
    }
}
