use super::*;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(endpoint: &str, dimension: u32) -> EmbeddingConfig {
    EmbeddingConfig {
        endpoint: endpoint.to_string(),
        model: "bge-small-en-v1.5".to_string(),
        dimension,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_returns_vector() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .and(body_partial_json(serde_json::json!({
            "model": "bge-small-en-v1.5",
            "prompt": "kafka messaging"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": [0.1, 0.2, 0.3, 0.4]
        })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&test_config(&server.uri(), 4)).expect("client builds");
    let embedding = client.embed("kafka messaging").expect("embedding succeeds");

    assert_eq!(embedding, vec![0.1, 0.2, 0.3, 0.4]);
}

#[tokio::test(flavor = "multi_thread")]
async fn dimension_mismatch_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": [0.1, 0.2]
        })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&test_config(&server.uri(), 384)).expect("client builds");
    let err = client.embed("text").expect_err("embedding fails");

    assert!(err.to_string().contains("dimension mismatch"));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&test_config(&server.uri(), 4))
        .expect("client builds")
        .with_retry_attempts(3);

    assert!(client.embed("text").is_err());
}

#[test]
fn invalid_endpoint_is_rejected() {
    assert!(OllamaClient::new(&test_config("not a url", 4)).is_err());
}
