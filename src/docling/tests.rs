use super::*;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread")]
async fn convert_returns_markdown() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha/convert/source"))
        .and(body_partial_json(serde_json::json!({
            "http_sources": [{"url": "https://quarkus.io/guides/kafka"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "document": {"md_content": "# Kafka\n\nGuide body."}
        })))
        .mount(&server)
        .await;

    let client = DoclingClient::new(&server.uri()).expect("client builds");
    let markdown = client
        .convert("https://quarkus.io/guides/kafka")
        .expect("conversion succeeds");

    assert_eq!(markdown, "# Kafka\n\nGuide body.");
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha/convert/source"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "failure",
            "document": null
        })))
        .mount(&server)
        .await;

    let client = DoclingClient::new(&server.uri()).expect("client builds");

    assert!(client.convert("https://quarkus.io/guides/kafka").is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_document_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha/convert/source"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})),
        )
        .mount(&server)
        .await;

    let client = DoclingClient::new(&server.uri()).expect("client builds");

    assert!(client.convert("https://quarkus.io/guides/kafka").is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha/convert/source"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = DoclingClient::new(&server.uri())
        .expect("client builds")
        .with_retry_attempts(3);

    assert!(client.convert("https://quarkus.io/guides/missing").is_err());
}

#[test]
fn invalid_endpoint_is_rejected() {
    assert!(DoclingClient::new("not a url").is_err());
}
