use super::*;
use tempfile::TempDir;

#[test]
fn unavailable_resolves_nothing() {
    let sources = GuideSources::unavailable();

    assert_eq!(sources.lookup("kafka"), None);
}

#[test]
fn local_lookup_finds_adoc_source() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let docs = temp_dir.path().join("docs/src/main/asciidoc");
    std::fs::create_dir_all(&docs).expect("can create docs dir");
    std::fs::write(docs.join("kafka.adoc"), ":topics: messaging\n").expect("can write fixture");

    let sources = GuideSources::from_local(temp_dir.path(), "docs/src/main/asciidoc");

    let path = sources.lookup("kafka").expect("source is found");
    assert!(path.ends_with("kafka.adoc"));
    assert_eq!(sources.lookup("missing-guide"), None);
}

#[test]
fn docs_path_falls_back_to_root() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    std::fs::write(temp_dir.path().join("kafka.adoc"), ":topics: messaging\n")
        .expect("can write fixture");

    let sources = GuideSources::from_local(temp_dir.path(), "docs/src/main/asciidoc");

    assert!(sources.lookup("kafka").is_some());
}

#[test]
fn underscore_prefixed_sources_are_not_guides() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    std::fs::write(temp_dir.path().join("_attributes.adoc"), "include\n")
        .expect("can write fixture");

    let sources = GuideSources::from_local(temp_dir.path(), ".");

    assert_eq!(sources.lookup("_attributes"), None);
}

#[tokio::test]
async fn checkout_failure_degrades_to_unavailable() {
    let config = BakeConfig {
        quarkus_version: "0.0.0-no-such-tag".to_string(),
        sources_repo_url: "file:///nonexistent/repo.git".to_string(),
        ..BakeConfig::default()
    };

    let sources = GuideSources::prepare(&config).await;

    assert_eq!(sources.lookup("kafka"), None);
}
