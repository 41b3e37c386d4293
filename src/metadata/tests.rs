use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn extracts_recognized_attributes() {
    let text = "\
= GraphQL Guide
:topics: graphql
:summary: Explains GraphQL support.

Body text here.
";

    let metadata = extract_header(text, DEFAULT_MAX_SCAN_LINES);

    assert_eq!(metadata.topics.as_deref(), Some("graphql"));
    assert_eq!(metadata.summary.as_deref(), Some("Explains GraphQL support."));
    assert_eq!(metadata.categories, None);
    assert_eq!(metadata.extensions, None);
}

#[test]
fn no_matching_lines_yields_empty() {
    let text = "= Some Guide\n\nJust prose, no attribute lines.\n";

    let metadata = extract_header(text, DEFAULT_MAX_SCAN_LINES);

    assert!(metadata.is_empty());
}

#[test]
fn keys_are_case_insensitive_values_keep_case() {
    let text = ":Topics: GraphQL\n:SUMMARY: Mixed Case Value\n";

    let metadata = extract_header(text, DEFAULT_MAX_SCAN_LINES);

    assert_eq!(metadata.topics.as_deref(), Some("GraphQL"));
    assert_eq!(metadata.summary.as_deref(), Some("Mixed Case Value"));
}

#[test]
fn values_are_trimmed() {
    let text = ":categories:    web, messaging   \n";

    let metadata = extract_header(text, DEFAULT_MAX_SCAN_LINES);

    assert_eq!(metadata.categories.as_deref(), Some("web, messaging"));
}

#[test]
fn leading_whitespace_before_attribute_is_accepted() {
    let text = "   :topics: security\n";

    let metadata = extract_header(text, DEFAULT_MAX_SCAN_LINES);

    assert_eq!(metadata.topics.as_deref(), Some("security"));
}

#[test]
fn unrecognized_keys_are_ignored() {
    let text = ":author: someone\n:topics: kafka\n:irrelevant: yes\n";

    let metadata = extract_header(text, DEFAULT_MAX_SCAN_LINES);

    assert_eq!(metadata.topics.as_deref(), Some("kafka"));
    assert_eq!(metadata.seen(), 1);
}

#[test]
fn attribute_past_line_bound_is_not_observed() {
    let mut text = String::new();
    for _ in 0..DEFAULT_MAX_SCAN_LINES {
        text.push_str("filler line\n");
    }
    text.push_str(":topics: too-late\n");

    let metadata = extract_header(&text, DEFAULT_MAX_SCAN_LINES);

    assert!(metadata.is_empty());
}

#[test]
fn attribute_on_final_scanned_line_is_observed() {
    let mut text = String::new();
    for _ in 0..DEFAULT_MAX_SCAN_LINES - 1 {
        text.push_str("filler line\n");
    }
    text.push_str(":topics: just-in-time\n");

    let metadata = extract_header(&text, DEFAULT_MAX_SCAN_LINES);

    assert_eq!(metadata.topics.as_deref(), Some("just-in-time"));
}

#[test]
fn redeclaration_before_early_stop_overwrites() {
    let text = ":topics: first\n:topics: second\n";

    let metadata = extract_header(text, DEFAULT_MAX_SCAN_LINES);

    assert_eq!(metadata.topics.as_deref(), Some("second"));
}

#[test]
fn redeclaration_after_all_four_seen_is_never_observed() {
    // Scanning stops the moment the fourth recognized key appears, so a
    // later re-declaration cannot change the extracted value.
    let text = "\
:topics: original
:categories: web
:extensions: io.quarkus:quarkus-smallrye-graphql
:summary: A summary.
:topics: rewritten
";

    let metadata = extract_header(text, DEFAULT_MAX_SCAN_LINES);

    assert_eq!(metadata.topics.as_deref(), Some("original"));
}

#[test]
fn missing_file_yields_empty() {
    let metadata = extract_from_file(&PathBuf::from("/nonexistent/guide.adoc"));

    assert!(metadata.is_empty());
}

#[test]
fn directory_yields_empty() {
    let temp_dir = TempDir::new().expect("can create temp dir");

    let metadata = extract_from_file(temp_dir.path());

    assert!(metadata.is_empty());
}

#[test]
fn file_extraction_round_trip() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let path = temp_dir.path().join("kafka.adoc");
    std::fs::write(&path, ":topics: messaging\n:summary: Kafka guide.\n")
        .expect("can write fixture");

    let metadata = extract_from_file(&path);

    assert_eq!(metadata.topics.as_deref(), Some("messaging"));
    assert_eq!(metadata.summary.as_deref(), Some("Kafka guide."));
}
