use super::vector_literal as vector_literal_impl;
use super::*;

#[test]
fn vector_literal_format() {
    assert_eq!(vector_literal_impl(&[0.1, 0.2, 0.3]), "[0.1,0.2,0.3]");
    assert_eq!(vector_literal_impl(&[]), "[]");
    assert_eq!(vector_literal_impl(&[1.0]), "[1]");
}

#[test]
fn absent_attributes_are_omitted_from_json() {
    let metadata = DocumentMetadata::new(
        "https://quarkus.io/guides/kafka".to_string(),
        "3.30.6".to_string(),
        "kafka".to_string(),
    );

    let json = serde_json::to_value(&metadata).expect("serializes");
    let object = json.as_object().expect("is an object");

    assert_eq!(object.get("url").and_then(|v| v.as_str()), Some("https://quarkus.io/guides/kafka"));
    assert_eq!(object.get("version").and_then(|v| v.as_str()), Some("3.30.6"));
    assert_eq!(object.get("title").and_then(|v| v.as_str()), Some("kafka"));
    // No empty placeholders for unset header attributes
    assert!(!object.contains_key("topics"));
    assert!(!object.contains_key("categories"));
    assert!(!object.contains_key("extensions"));
    assert!(!object.contains_key("summary"));
}

#[test]
fn header_attributes_win_the_merge() {
    let mut metadata = DocumentMetadata::new(
        "https://quarkus.io/guides/kafka".to_string(),
        "3.30.6".to_string(),
        "kafka".to_string(),
    );
    metadata.topics = Some("derived".to_string());

    let header = GuideMetadata {
        topics: Some("messaging".to_string()),
        summary: Some("Kafka guide.".to_string()),
        ..GuideMetadata::default()
    };
    metadata.apply_header(&header);

    assert_eq!(metadata.topics.as_deref(), Some("messaging"));
    assert_eq!(metadata.summary.as_deref(), Some("Kafka guide."));
}

#[test]
fn absent_header_attributes_do_not_erase() {
    let mut metadata = DocumentMetadata::new(
        "https://quarkus.io/guides/kafka".to_string(),
        "3.30.6".to_string(),
        "kafka".to_string(),
    );
    metadata.categories = Some("messaging".to_string());

    metadata.apply_header(&GuideMetadata::default());

    assert_eq!(metadata.categories.as_deref(), Some("messaging"));
}
