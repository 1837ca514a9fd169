//! Integration tests for the HTTP embedders using wiremock HTTP mocks.

use std::time::Duration;

use revdash_sentiment::{Embedder, NoopEmbedder, OpenAiEmbedder, SentimentError, TeiClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn tei_returns_first_embedding() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embed"))
        .and(body_json(serde_json::json!({ "inputs": "quiet and clean" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([[0.25, -0.5, 1.0]])))
        .expect(1)
        .mount(&server)
        .await;

    let client = TeiClient::new(&format!("{}/", server.uri()), TIMEOUT).expect("client");
    let vector = client.embed("quiet and clean").await.expect("embedding");

    assert_eq!(vector, vec![0.25, -0.5, 1.0]);
}

#[tokio::test]
async fn tei_error_status_is_embed_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = TeiClient::new(&server.uri(), TIMEOUT).expect("client");
    let err = client.embed("anything").await.unwrap_err();

    assert!(matches!(err, SentimentError::Embed(ref msg) if msg.contains("503")), "got {err:?}");
}

#[tokio::test]
async fn tei_empty_response_is_embed_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = TeiClient::new(&server.uri(), TIMEOUT).expect("client");
    assert!(matches!(
        client.embed("anything").await,
        Err(SentimentError::Embed(_))
    ));
}

#[tokio::test]
async fn openai_sends_model_and_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(serde_json::json!({
            "model": "text-embedding-3-small",
            "input": "great host"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": [0.1, 0.2] }],
            "model": "text-embedding-3-small"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::new(
        "sk-test",
        &format!("{}/v1", server.uri()),
        "text-embedding-3-small",
        TIMEOUT,
    )
    .expect("embedder");
    let vector = embedder.embed("great host").await.expect("embedding");

    assert_eq!(vector, vec![0.1, 0.2]);
}

#[tokio::test]
async fn openai_unauthorized_is_embed_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let embedder =
        OpenAiEmbedder::new("sk-bad", &server.uri(), "m", TIMEOUT).expect("embedder");
    assert!(matches!(
        embedder.embed("x").await,
        Err(SentimentError::Embed(_))
    ));
}

#[test]
fn openai_requires_key_and_model() {
    assert!(OpenAiEmbedder::new("  ", "http://localhost", "m", TIMEOUT).is_err());
    assert!(OpenAiEmbedder::new("sk", "http://localhost", "", TIMEOUT).is_err());
}

#[tokio::test]
async fn noop_embedder_always_fails() {
    assert!(NoopEmbedder.embed("anything").await.is_err());
}
