//! Extraction Integration Tests
//!
//! Runs vocabularies over real files on disk and checks the tally
//! properties that must hold for any input.

use std::fs;
use std::path::{Path, PathBuf};

use crashtally_core::{Row, Vocabulary};
use crashtally_extractor::{vocabularies, CategoryExtractor, ExtractionRun};
use crashtally_parser::ParserRegistry;
use proptest::prelude::*;

fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

// =============================================================================
// File-based runs
// =============================================================================

#[test]
fn test_skip_on_failure_matches_run_without_failed_source() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_csv(
        dir.path(),
        "processed_crash_data_2019.csv",
        "accident_id,weather_conditions\n\
         0,weather_a_1\n\
         1,\"weather_b_1, weather_c_1\"\n",
    );
    let missing = dir.path().join("processed_crash_data_2020.csv");
    let third = write_csv(
        dir.path(),
        "processed_crash_data_2021.csv",
        "accident_id,weather_conditions\n\
         0,Not specified\n\
         1,weather_a_1\n",
    );

    let registry = ParserRegistry::with_defaults();
    let extractor = CategoryExtractor::new(vocabularies::weather().unwrap());

    let mut run = ExtractionRun::new(&extractor);
    run.add_paths(&registry, [&first, &missing, &third]);
    let with_failure = run.finish();

    let mut run = ExtractionRun::new(&extractor);
    run.add_paths(&registry, [&first, &third]);
    let without = run.finish();

    assert_eq!(with_failure.table, without.table);
    assert_eq!(with_failure.table.get("weather_a_1"), Some(2));
    assert_eq!(with_failure.table.get("weather_f_1"), Some(1));
    assert_eq!(with_failure.stats.rows_read, 4);
    assert_eq!(with_failure.report.skipped_sources.len(), 1);
    assert!(with_failure.report.skipped_sources[0].ends_with("processed_crash_data_2020.csv"));
}

#[test]
fn test_malformed_and_unsupported_sources_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_csv(
        dir.path(),
        "good.csv",
        "lighting_conditions\nlighting_c_1\n",
    );
    let empty = write_csv(dir.path(), "empty.csv", "");
    let unsupported = write_csv(dir.path(), "notes.txt", "lighting_c_1");

    let registry = ParserRegistry::with_defaults();
    let extractor = CategoryExtractor::new(vocabularies::lighting().unwrap());
    let mut run = ExtractionRun::new(&extractor);
    run.add_paths(&registry, [&empty, &good, &unsupported]);
    let output = run.finish();

    assert_eq!(output.table.get("lighting_c_1"), Some(1));
    assert_eq!(output.report.skipped_sources.len(), 2);
    assert!(output.sources[1].is_loaded());
}

#[test]
fn test_column_missing_from_file_counts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "no_road.csv", "accident_id,make\n0,Toyota\n");

    let registry = ParserRegistry::with_defaults();
    let extractor = CategoryExtractor::new(vocabularies::road().unwrap());
    let mut run = ExtractionRun::new(&extractor);
    run.add_path(&registry, &path);
    let output = run.finish();

    assert!(output.table.is_zero());
    assert_eq!(output.stats.rows_read, 1);
    assert_eq!(output.stats.rows_with_value, 0);
    assert!(output.report.skipped_sources.is_empty());
}

#[test]
fn test_report_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "damage.csv",
        "date,vehicle_damage\n\
         01/10/2019,MINOR\n\
         02/11/2019,UNK\n\
         2020-03-12,MINOR\n",
    );

    let registry = ParserRegistry::with_defaults();
    let extractor = CategoryExtractor::new(vocabularies::vehicle_damage().unwrap());
    let mut run = ExtractionRun::new(&extractor).with_years("date");
    run.add_path(&registry, &path);
    let report = run.finish().report;

    let json: serde_json::Value = serde_json::from_str(&report.to_json(true).unwrap()).unwrap();
    assert_eq!(json["vocabulary"], "vehicle_damage");
    assert_eq!(json["field"], "vehicle_damage");
    assert_eq!(json["total_records"], 3);
    assert_eq!(json["codes"][2]["code"], "MINOR");
    assert_eq!(json["codes"][2]["count"], 2);
    assert_eq!(json["codes"][2]["color"], "#32CD32");
    assert_eq!(json["years"][0]["year"], 2019);
    assert_eq!(json["years"][1]["year"], 2020);
    assert!(json["generated_at"].is_string());
}

// =============================================================================
// Properties
// =============================================================================

const CODES: [&str; 4] = ["cond_a_1", "cond_b_1", "cond_c_1", "cond_d_1"];

fn vocabulary(with_fallback: bool) -> Vocabulary {
    let mut builder = Vocabulary::builder("prop").field("f");
    for code in CODES {
        builder = builder.category(code, code.to_uppercase());
    }
    if with_fallback {
        builder = builder.fallback("cond_d_1");
    }
    builder.build().unwrap()
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        Just("unknown_code_z".to_string()),
        prop::sample::select(CODES.to_vec()).prop_map(|c| c.to_string()),
        prop::collection::vec(prop::sample::select(CODES.to_vec()), 1..4)
            .prop_map(|codes| codes.join(", ")),
        "[a-z_ ,0-9]{0,24}",
    ]
}

fn values_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(value_strategy(), 0..40)
}

fn rows_of(values: &[String]) -> Vec<Row> {
    values
        .iter()
        .map(|v| Row::new().with_field("f", v.as_str()))
        .collect()
}

/// Per-code counts computed straight from the raw values
fn expected_counts(values: &[String], with_fallback: bool) -> [u64; 4] {
    let mut counts = [0u64; 4];
    for raw in values {
        if raw.is_empty() {
            continue;
        }
        let value = raw.trim();
        if let Some(i) = CODES.iter().position(|c| *c == value) {
            counts[i] += 1;
            continue;
        }
        let mut hit = false;
        for (i, code) in CODES.iter().enumerate() {
            if value.contains(code) {
                counts[i] += 1;
                hit = true;
            }
        }
        if !hit && with_fallback {
            counts[3] += 1;
        }
    }
    counts
}

proptest! {
    #[test]
    fn prop_extraction_is_idempotent(values in values_strategy(), fallback in any::<bool>()) {
        let extractor = CategoryExtractor::new(vocabulary(fallback));
        let rows = rows_of(&values);
        prop_assert_eq!(extractor.extract(&rows), extractor.extract(&rows));
    }

    #[test]
    fn prop_counts_follow_matching_rules(values in values_strategy(), fallback in any::<bool>()) {
        let table = CategoryExtractor::new(vocabulary(fallback)).extract(&rows_of(&values));
        let expected = expected_counts(&values, fallback);

        for (i, code) in CODES.iter().enumerate() {
            prop_assert_eq!(table.get(code), Some(expected[i]), "code {}", code);
        }
        prop_assert_eq!(table.total(), expected.iter().sum::<u64>());
    }

    #[test]
    fn prop_increments_cover_matched_rows(values in values_strategy(), fallback in any::<bool>()) {
        let table = CategoryExtractor::new(vocabulary(fallback)).extract(&rows_of(&values));

        let mut matched = 0u64;
        let mut fanned_out = false;
        for raw in values.iter().filter(|v| !v.is_empty()) {
            let value = raw.trim();
            let hits = if CODES.iter().any(|c| *c == value) {
                1
            } else {
                CODES.iter().filter(|c| value.contains(*c)).count()
            };
            if hits > 0 || fallback {
                matched += 1;
            }
            fanned_out |= hits > 1;
        }

        prop_assert!(table.total() >= matched);
        if !fanned_out {
            prop_assert_eq!(table.total(), matched);
        }
    }

    #[test]
    fn prop_split_runs_merge_to_whole(values in values_strategy(), split in 0usize..40) {
        let extractor = CategoryExtractor::new(vocabulary(true));
        let rows = rows_of(&values);
        let split = split.min(rows.len());

        let mut merged = extractor.extract(&rows[..split]);
        merged.merge(&extractor.extract(&rows[split..])).unwrap();

        prop_assert_eq!(merged, extractor.extract(&rows));
    }

    #[test]
    fn prop_fallback_only_adds_to_fallback_code(values in values_strategy()) {
        let rows = rows_of(&values);
        let plain = CategoryExtractor::new(vocabulary(false)).extract(&rows);
        let with_fallback = CategoryExtractor::new(vocabulary(true)).extract(&rows);

        for code in &CODES[..3] {
            prop_assert_eq!(plain.get(code), with_fallback.get(code));
        }
        prop_assert!(with_fallback.get("cond_d_1") >= plain.get("cond_d_1"));
    }
}
