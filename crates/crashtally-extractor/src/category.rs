//! Category tally extraction
//!
//! Classifies one row field against a fixed vocabulary:
//! - exact match: the trimmed value equals a code, one increment
//! - substring fan-out: every code found inside the value is incremented
//! - fallback: optional catch-all code for values matching nothing

use crashtally_core::{Row, TallyTable, Vocabulary};

/// How a single row was classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Field absent or empty
    Skipped,
    /// Trimmed value equals the code at this index
    Exact(usize),
    /// Codes at these indices occur inside the value
    Substring(Vec<usize>),
    /// No code matched; counted into the fallback code at this index
    Fallback(usize),
    /// No code matched and no fallback is configured
    Unmatched,
}

impl MatchOutcome {
    /// Number of table increments this outcome produces
    pub fn increments(&self) -> usize {
        match self {
            Self::Skipped | Self::Unmatched => 0,
            Self::Exact(_) | Self::Fallback(_) => 1,
            Self::Substring(indices) => indices.len(),
        }
    }

    /// Whether any code was incremented
    pub fn is_match(&self) -> bool {
        self.increments() > 0
    }

    /// Apply the increments to a table
    pub fn apply(&self, table: &mut TallyTable) {
        match self {
            Self::Skipped | Self::Unmatched => {}
            Self::Exact(index) | Self::Fallback(index) => table.increment_at(*index),
            Self::Substring(indices) => {
                for index in indices {
                    table.increment_at(*index);
                }
            }
        }
    }
}

/// Tally extractor for one vocabulary
#[derive(Debug, Clone)]
pub struct CategoryExtractor {
    vocabulary: Vocabulary,
}

impl CategoryExtractor {
    /// Create an extractor for a vocabulary
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Create a zeroed table for this extractor's codes
    pub fn new_table(&self) -> TallyTable {
        self.vocabulary.new_table()
    }

    /// Classify a raw field value
    pub fn classify(&self, raw: Option<&str>) -> MatchOutcome {
        // Whitespace-only values are not skipped; they trim to "" and
        // reach the fallback.
        let value = match raw {
            Some(v) if !v.is_empty() => v.trim(),
            _ => return MatchOutcome::Skipped,
        };

        if let Some(index) = self.vocabulary.position(value) {
            return MatchOutcome::Exact(index);
        }

        let hits: Vec<usize> = self
            .vocabulary
            .categories()
            .iter()
            .enumerate()
            .filter(|(_, category)| value.contains(category.code.as_str()))
            .map(|(index, _)| index)
            .collect();

        if !hits.is_empty() {
            return MatchOutcome::Substring(hits);
        }

        match self.vocabulary.fallback_index() {
            Some(index) => MatchOutcome::Fallback(index),
            None => MatchOutcome::Unmatched,
        }
    }

    /// Classify a row by its vocabulary field
    pub fn classify_row(&self, row: &Row) -> MatchOutcome {
        self.classify(row.get(self.vocabulary.field()))
    }

    /// Classify a row and apply the result to `table`
    pub fn tally_row(&self, row: &Row, table: &mut TallyTable) -> MatchOutcome {
        let outcome = self.classify_row(row);
        outcome.apply(table);
        outcome
    }

    /// Tally a row sequence into a fresh table
    pub fn extract<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> TallyTable {
        let mut table = self.new_table();
        for row in rows {
            self.tally_row(row, &mut table);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabularies;

    fn row(field: &str, value: &str) -> Row {
        Row::new().with_field(field, value)
    }

    fn weather() -> CategoryExtractor {
        CategoryExtractor::new(vocabularies::weather().unwrap())
    }

    fn lighting() -> CategoryExtractor {
        CategoryExtractor::new(vocabularies::lighting().unwrap())
    }

    #[test]
    fn test_exact_match() {
        let extractor = lighting();
        assert_eq!(
            extractor.classify(Some("lighting_c_1")),
            MatchOutcome::Exact(2)
        );
    }

    #[test]
    fn test_exact_match_after_trim() {
        let extractor = lighting();
        assert_eq!(
            extractor.classify(Some("  lighting_a_1\t")),
            MatchOutcome::Exact(0)
        );
    }

    #[test]
    fn test_empty_and_missing_values_are_skipped() {
        let extractor = weather();
        assert_eq!(extractor.classify(None), MatchOutcome::Skipped);
        assert_eq!(extractor.classify(Some("")), MatchOutcome::Skipped);

        let table = extractor.extract(&[Row::new().with_field("other_field", "weather_a_1")]);
        assert!(table.is_zero());
    }

    #[test]
    fn test_whitespace_only_value_reaches_fallback() {
        let weather = weather();
        assert_eq!(weather.classify(Some("   ")), MatchOutcome::Fallback(5));

        let table = weather.extract(&[row("weather_conditions", "   ")]);
        assert_eq!(table.get("weather_f_1"), Some(1));
        assert_eq!(table.total(), 1);

        let lighting = lighting();
        assert_eq!(lighting.classify(Some(" \t ")), MatchOutcome::Unmatched);
        assert!(lighting
            .extract(&[row("lighting_conditions", "   ")])
            .is_zero());
    }

    #[test]
    fn test_substring_fan_out() {
        let extractor = weather();
        let table = extractor.extract(&[row("weather_conditions", "weather_a_1 weather_c_1")]);

        assert_eq!(table.get("weather_a_1"), Some(1));
        assert_eq!(table.get("weather_c_1"), Some(1));
        assert_eq!(table.total(), 2);
    }

    #[test]
    fn test_comma_joined_codes_from_preprocessing() {
        let extractor = lighting();
        let outcome = extractor.classify(Some("lighting_b_1, lighting_d_1"));
        assert_eq!(outcome, MatchOutcome::Substring(vec![1, 3]));
        assert_eq!(outcome.increments(), 2);
    }

    #[test]
    fn test_exact_match_takes_precedence_over_substring() {
        let vocabulary = Vocabulary::builder("nested")
            .field("f")
            .category("lighting_a_1", "Daylight")
            .category("lighting_a_1_ext", "Daylight (extended)")
            .build()
            .unwrap();
        let extractor = CategoryExtractor::new(vocabulary);

        let table = extractor.extract(&[row("f", "lighting_a_1_ext")]);
        assert_eq!(table.get("lighting_a_1_ext"), Some(1));
        assert_eq!(table.get("lighting_a_1"), Some(0));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let extractor = lighting();
        assert_eq!(
            extractor.classify(Some("LIGHTING_A_1")),
            MatchOutcome::Unmatched
        );
    }

    #[test]
    fn test_weather_unmatched_goes_to_fallback() {
        let extractor = weather();
        let table = extractor.extract(&[row("weather_conditions", "unknown_code_z")]);

        assert_eq!(table.get("weather_f_1"), Some(1));
        assert_eq!(table.total(), 1);
    }

    #[test]
    fn test_unmatched_without_fallback_is_dropped() {
        let extractor = lighting();
        let table = extractor.extract(&[row("lighting_conditions", "unknown_code_z")]);
        assert!(table.is_zero());
    }

    #[test]
    fn test_not_specified_is_other_for_weather_only() {
        let weather = weather().extract(&[row("weather_conditions", "Not specified")]);
        assert_eq!(weather.get("weather_f_1"), Some(1));

        let lighting = lighting().extract(&[row("lighting_conditions", "Not specified")]);
        assert!(lighting.is_zero());
    }

    #[test]
    fn test_empty_input_yields_zeroed_table() {
        let extractor = weather();
        let rows: Vec<Row> = Vec::new();
        let table = extractor.extract(&rows);
        assert_eq!(table.len(), 7);
        assert!(table.is_zero());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = lighting();
        let rows = vec![
            row("lighting_conditions", "lighting_a_1"),
            row("lighting_conditions", "lighting_a_1, lighting_e_1"),
            row("lighting_conditions", ""),
        ];

        assert_eq!(extractor.extract(&rows), extractor.extract(&rows));
    }

    #[test]
    fn test_outcome_apply() {
        let extractor = lighting();
        let mut table = extractor.new_table();
        MatchOutcome::Substring(vec![0, 4]).apply(&mut table);
        MatchOutcome::Unmatched.apply(&mut table);
        MatchOutcome::Skipped.apply(&mut table);

        assert_eq!(table.total(), 2);
        assert_eq!(table.count_at(4), 1);
        assert!(!MatchOutcome::Unmatched.is_match());
    }
}
