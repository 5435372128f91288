//! End-to-end pipeline tests against a local mock of the Ollama and OpenAI
//! HTTP APIs.

use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use portfolio_rag::completion::CompletionClient;
use portfolio_rag::config::{parse_config, CompletionConfig, EmbeddingConfig};
use portfolio_rag::corpus::{load_corpus, write_corpus};
use portfolio_rag::embedding::{OllamaEmbedder, OpenAIEmbedder};
use portfolio_rag::server::{router, AppState};
use portfolio_rag_core::embedding::Embedder;
use portfolio_rag_core::index::{build_corpus, IndexOptions};
use portfolio_rag_core::prompt::DEFAULT_SYSTEM_PROMPT;
use portfolio_rag_core::{Corpus, EmbeddingError, RetrievalParams, Retriever, SourceDocument};

// ============ Mock provider ============

/// One axis per keyword; text with none of them points along the diagonal.
fn keyword_vector(text: &str) -> Vec<f32> {
    let text = text.to_lowercase();
    let mut v = vec![0.0f32; 3];
    for (axis, word) in ["rust", "python", "design"].iter().enumerate() {
        if text.contains(word) {
            v[axis] += 1.0;
        }
    }
    if v.iter().all(|x| *x == 0.0) {
        v = vec![0.1, 0.1, 0.1];
    }
    v
}

async fn ollama_embed(Json(body): Json<Value>) -> Json<Value> {
    let input = body["input"].as_str().unwrap_or_default();
    Json(json!({ "model": body["model"], "embeddings": [keyword_vector(input)] }))
}

async fn ollama_chat(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["stream"], json!(false));
    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    Json(json!({
        "message": { "role": "assistant", "content": format!("ANSWER\n{}", system) },
        "done": true
    }))
}

async fn openai_embed(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if headers.get("authorization").and_then(|h| h.to_str().ok()) != Some("Bearer test-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" })));
    }
    let input = body["input"].as_str().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({ "data": [{ "index": 0, "embedding": keyword_vector(input) }] })),
    )
}

async fn openai_chat(Json(body): Json<Value>) -> Json<Value> {
    let user = body["messages"][1]["content"].as_str().unwrap_or_default();
    Json(json!({ "choices": [{ "message": { "role": "assistant", "content": format!("re: {}", user) } }] }))
}

async fn openai_chat_empty() -> Json<Value> {
    Json(json!({ "choices": [] }))
}

async fn broken() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, "nope")
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_mock() -> String {
    let app = Router::new()
        .route("/api/embed", post(ollama_embed))
        .route("/api/chat", post(ollama_chat))
        .route("/v1/embeddings", post(openai_embed))
        .route("/v1/chat/completions", post(openai_chat))
        .route("/empty/chat/completions", post(openai_chat_empty))
        .route("/broken/api/embed", post(broken))
        .route("/broken/api/chat", post(broken));
    spawn(app).await
}

// ============ Fixtures ============

fn ollama_embedding(base: &str) -> EmbeddingConfig {
    EmbeddingConfig {
        provider: "ollama".to_string(),
        model: Some("mock-embed".to_string()),
        dims: Some(3),
        url: Some(base.to_string()),
        max_retries: 0,
        timeout_secs: 5,
        concurrency: 2,
    }
}

fn ollama_completion(base: &str) -> CompletionConfig {
    CompletionConfig {
        provider: "ollama".to_string(),
        model: "mock-chat".to_string(),
        url: Some(base.to_string()),
        timeout_secs: 5,
        max_retries: 0,
        ..CompletionConfig::default()
    }
}

fn portfolio() -> Vec<SourceDocument> {
    vec![
        SourceDocument {
            id: "rust".to_string(),
            text: "I build services in Rust. Rust is fast.".to_string(),
        },
        SourceDocument {
            id: "python".to_string(),
            text: "I taught Python workshops.".to_string(),
        },
        SourceDocument {
            id: "design".to_string(),
            text: "I sketch design systems.".to_string(),
        },
    ]
}

async fn indexed_corpus(base: &str) -> Corpus {
    let embedder = OllamaEmbedder::new(&ollama_embedding(base)).unwrap();
    let options = IndexOptions {
        max_chars: 200,
        concurrency: 2,
    };
    build_corpus(&portfolio(), &embedder, &options).await.unwrap()
}

fn retriever(base: &str, corpus: Corpus, params: RetrievalParams) -> Retriever {
    let embedder = OllamaEmbedder::new(&ollama_embedding(base)).unwrap();
    Retriever::new(Arc::new(corpus), Arc::new(embedder), params)
}

// ============ Indexing and retrieval ============

#[tokio::test]
async fn test_index_persist_and_retrieve() {
    let base = spawn_mock().await;
    let corpus = indexed_corpus(&base).await;

    let ids: Vec<&str> = corpus.records().iter().map(|r| r.source_id.as_str()).collect();
    assert_eq!(ids, vec!["rust", "python", "design"]);
    assert_eq!(corpus.dims(), Some(3));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data/embeddings.json");
    write_corpus(&path, &corpus).unwrap();
    let loaded = load_corpus(&path).unwrap();
    assert_eq!(loaded, corpus);

    let params = RetrievalParams {
        top_k: 1,
        ..RetrievalParams::default()
    };
    let retriever = retriever(&base, loaded, params);
    let context = retriever.retrieve("Tell me about Rust").await.unwrap();
    assert_eq!(context, "I build services in Rust. Rust is fast.");
}

#[tokio::test]
async fn test_ties_keep_corpus_order_and_budget_truncates() {
    let base = spawn_mock().await;
    let corpus = indexed_corpus(&base).await;

    let params = RetrievalParams {
        top_k: 4,
        char_budget: 10,
        separator: "\n".to_string(),
    };
    let retriever = retriever(&base, corpus, params);

    // "python rust" is equidistant from the first two records.
    let top = retriever.search("python and rust", 4).await.unwrap();
    let ids: Vec<&str> = top.iter().map(|s| s.record.source_id.as_str()).collect();
    assert_eq!(ids, vec!["rust", "python", "design"]);
    assert_eq!(top[0].similarity, top[1].similarity);
    assert_eq!(top[2].similarity, 0.0);

    let context = retriever.retrieve("python and rust").await.unwrap();
    assert_eq!(context, "I build se");
}

#[tokio::test]
async fn test_index_aborts_on_provider_error() {
    let base = spawn_mock().await;
    let embedder = OllamaEmbedder::new(&ollama_embedding(&format!("{}/broken", base))).unwrap();
    let result = build_corpus(&portfolio(), &embedder, &IndexOptions::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_openai_providers_against_mock() {
    let base = spawn_mock().await;

    let embedding = EmbeddingConfig {
        provider: "openai".to_string(),
        url: Some(format!("{}/v1", base)),
        ..ollama_embedding(&base)
    };
    let embedder = OpenAIEmbedder::with_api_key(&embedding, "test-key").unwrap();
    assert_eq!(embedder.embed("rust").await.unwrap(), vec![1.0, 0.0, 0.0]);

    let wrong_key = OpenAIEmbedder::with_api_key(&embedding, "other").unwrap();
    assert!(wrong_key.embed("rust").await.is_err());

    let completion = CompletionConfig {
        provider: "openai".to_string(),
        url: Some(format!("{}/v1", base)),
        ..ollama_completion(&base)
    };
    let client = CompletionClient::with_api_key(&completion, Some("test-key".to_string())).unwrap();
    let messages = portfolio_rag_core::prompt::build_messages("sys", "ctx", "hello");
    assert_eq!(client.complete(&messages).await.unwrap(), "re: hello");

    let empty = CompletionConfig {
        url: Some(format!("{}/empty", base)),
        ..completion
    };
    let client = CompletionClient::with_api_key(&empty, Some("test-key".to_string())).unwrap();
    assert_eq!(client.complete(&messages).await.unwrap(), "No answer returned");
}

/// An `/api/embed` that always answers 503 and counts how often it is hit.
async fn spawn_unavailable_embedder() -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let app = Router::new().route(
        "/api/embed",
        post(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::SERVICE_UNAVAILABLE, "overloaded")
            }
        }),
    );
    (spawn(app).await, calls)
}

#[tokio::test]
async fn test_query_embedding_failure_is_not_retried() {
    let (base, calls) = spawn_unavailable_embedder().await;
    let cfg = parse_config(&format!(
        "[embedding]\nprovider = \"ollama\"\nmodel = \"m\"\nurl = \"{}\"\nmax_retries = 1\n",
        base
    ))
    .unwrap();

    // Indexing keeps its backoff budget: one retry, two calls.
    let indexer = OllamaEmbedder::new(&cfg.embedding).unwrap();
    assert!(indexer.embed("warm up").await.is_err());
    assert_eq!(calls.swap(0, Ordering::SeqCst), 2);

    let corpus = Corpus::new(vec![portfolio_rag_core::EmbeddingRecord {
        source_id: "bio".to_string(),
        text: "I write Rust.".to_string(),
        embedding: vec![1.0, 0.0],
    }]);
    let embedder = OllamaEmbedder::new(&cfg.query_embedding()).unwrap();
    let retriever = Retriever::new(
        Arc::new(corpus),
        Arc::new(embedder),
        cfg.retrieval.params(),
    );

    let started = Instant::now();
    let result = retriever.retrieve("hello").await;
    assert!(matches!(result, Err(EmbeddingError::Provider { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
}

// ============ HTTP chat endpoint ============

async fn spawn_chat_server(embed_base: &str, chat_base: &str, corpus: Corpus) -> String {
    let state = AppState {
        retriever: Arc::new(retriever(embed_base, corpus, RetrievalParams::default())),
        completion: Arc::new(CompletionClient::new(&ollama_completion(chat_base)).unwrap()),
    };
    spawn(router(state)).await
}

#[tokio::test]
async fn test_chat_endpoint_answers_with_context() {
    let base = spawn_mock().await;
    let corpus = indexed_corpus(&base).await;
    let server = spawn_chat_server(&base, &base, corpus).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/chat", server))
        .json(&json!({ "prompt": "What Rust work have you done?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.starts_with("ANSWER\n"));
    assert!(answer.contains(DEFAULT_SYSTEM_PROMPT));
    assert!(answer.contains("I build services in Rust. Rust is fast."));

    let health: Value = client
        .get(format!("{}/health", server))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["records"], 3);
}

#[tokio::test]
async fn test_chat_endpoint_rejects_bad_requests() {
    let base = spawn_mock().await;
    let server = spawn_chat_server(&base, &base, Corpus::empty()).await;
    let client = reqwest::Client::new();

    for body in [json!({}), json!({ "prompt": "" }), json!({ "prompt": "   " })] {
        let resp = client
            .post(format!("{}/api/chat", server))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["answer"], "Prompt is missing");
        assert_eq!(body["code"], "bad_request");
    }

    let resp = client
        .post(format!("{}/api/chat", server))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client.get(format!("{}/api/chat", server)).send().await.unwrap();
    assert_eq!(resp.status(), 405);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "method_not_allowed");
}

#[tokio::test]
async fn test_chat_with_empty_corpus_still_answers() {
    let base = spawn_mock().await;
    // The broken embedder is never reached: an empty corpus short-circuits.
    let server = spawn_chat_server(&format!("{}/broken", base), &base, Corpus::empty()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/chat", server))
        .json(&json!({ "prompt": "Hello?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["answer"].as_str().unwrap(),
        format!("ANSWER\n{}\n", DEFAULT_SYSTEM_PROMPT)
    );
}

#[tokio::test]
async fn test_chat_maps_upstream_failures() {
    let base = spawn_mock().await;
    let corpus = indexed_corpus(&base).await;
    let client = reqwest::Client::new();

    let embed_down =
        spawn_chat_server(&format!("{}/broken", base), &base, corpus.clone()).await;
    let resp = client
        .post(format!("{}/api/chat", embed_down))
        .json(&json!({ "prompt": "Rust?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "retrieval_unavailable");

    let chat_down = spawn_chat_server(&base, &format!("{}/broken", base), corpus).await;
    let resp = client
        .post(format!("{}/api/chat", chat_down))
        .json(&json!({ "prompt": "Rust?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "completion_failed");
}
