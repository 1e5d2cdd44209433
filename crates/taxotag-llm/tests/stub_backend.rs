//! Provider wire formats against a local stub server

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taxotag_domain::Provider;
use taxotag_llm::{
    AnthropicProvider, ChatMessage, ChatModel, ChatRequest, GeminiProvider, LlmError,
    OllamaProvider, OpenAiProvider, RawResponse, ToolSchema,
};

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    headers: HeaderMap,
    body: Value,
}

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Stub {
    fn new(status: StatusCode, reply: Value) -> Self {
        Self {
            status,
            reply,
            delay: Duration::ZERO,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn only_request(&self) -> Seen {
        let seen = self.seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "expected exactly one request");
        seen[0].clone()
    }

    /// Serve on an ephemeral port and return the base URL
    async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(answer).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

async fn answer(
    State(stub): State<Stub>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.seen.lock().unwrap().push(Seen {
        path: uri.path().to_string(),
        headers,
        body,
    });
    tokio::time::sleep(stub.delay).await;
    (stub.status, Json(stub.reply.clone()))
}

fn tag_request() -> ChatRequest {
    ChatRequest::new(vec![
        ChatMessage::system("Pick five tags.\n\nALLOWED TAGS:\n#a\n#b"),
        ChatMessage::user("Document to analyze"),
    ])
}

fn tag_tool() -> ToolSchema {
    ToolSchema {
        name: "generate_tags".to_string(),
        description: "Return tags".to_string(),
        parameters: json!({
            "type": "object",
            "properties": { "tags": { "type": "array", "items": { "type": "string" } } },
            "required": ["tags"]
        }),
    }
}

#[tokio::test]
async fn test_openai_forced_tool_call() {
    let stub = Stub::new(
        StatusCode::OK,
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "type": "function",
                        "function": {
                            "name": "generate_tags",
                            "arguments": "{\"tags\":[\"#a\",\"#b\"]}"
                        }
                    }]
                }
            }]
        }),
    );
    let url = stub.spawn().await;

    let provider =
        OpenAiProvider::new(Provider::OpenAi, &url, "gpt-4o-mini", Some("sk-test".into()))
            .unwrap();
    let reply = provider
        .complete(&tag_request().with_tool(tag_tool()))
        .await
        .unwrap();

    let message = reply.as_structured().unwrap();
    assert_eq!(
        message["tool_calls"][0]["function"]["name"],
        "generate_tags"
    );

    let seen = stub.only_request();
    assert_eq!(seen.path, "/chat/completions");
    assert_eq!(seen.headers["authorization"], "Bearer sk-test");
    assert_eq!(seen.body["model"], "gpt-4o-mini");
    assert_eq!(seen.body["temperature"], 0.0);
    assert_eq!(seen.body["messages"][0]["role"], "system");
    assert_eq!(seen.body["tools"][0]["function"]["name"], "generate_tags");
    assert_eq!(seen.body["tool_choice"]["function"]["name"], "generate_tags");
}

#[tokio::test]
async fn test_openai_free_form_has_no_tools() {
    let stub = Stub::new(
        StatusCode::OK,
        json!({ "choices": [{ "message": { "role": "assistant", "content": "#a, #b" } }] }),
    );
    let url = stub.spawn().await;

    let provider = OpenAiProvider::new(Provider::Groq, &url, "llama", None).unwrap();
    let reply = provider.complete(&tag_request()).await.unwrap();

    assert_eq!(reply.as_structured().unwrap()["content"], "#a, #b");
    let seen = stub.only_request();
    assert!(seen.body.get("tools").is_none());
    assert!(seen.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_rejected_key_is_unauthorized() {
    let stub = Stub::new(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "Incorrect API key provided" } }),
    );
    let url = stub.spawn().await;

    let provider =
        OpenAiProvider::new(Provider::OpenAi, &url, "gpt-4o-mini", Some("bad".into())).unwrap();
    let err = provider.complete(&tag_request()).await.unwrap_err();
    assert!(matches!(err, LlmError::Unauthorized(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unknown_model_is_not_available() {
    let stub = Stub::new(StatusCode::NOT_FOUND, json!({ "error": "model not found" }));
    let url = stub.spawn().await;

    let provider = OllamaProvider::new(&url, "missing-model").unwrap();
    let err = provider.complete(&tag_request()).await.unwrap_err();
    assert_eq!(err, LlmError::ModelNotAvailable("missing-model".to_string()));
}

#[tokio::test]
async fn test_cors_rejection_is_detected() {
    let stub = Stub::new(
        StatusCode::FORBIDDEN,
        json!({ "error": "Origin not allowed by CORS policy" }),
    );
    let url = stub.spawn().await;

    let provider = OpenAiProvider::new(Provider::OpenAi, &url, "gpt-4o-mini", Some("k".into()))
        .unwrap();
    let err = provider.complete(&tag_request()).await.unwrap_err();
    assert!(matches!(err, LlmError::CrossOriginBlocked(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_ollama_chat() {
    let stub = Stub::new(
        StatusCode::OK,
        json!({
            "model": "llama3.2",
            "message": { "role": "assistant", "content": "#a\n#b" },
            "done": true
        }),
    );
    let url = stub.spawn().await;

    let provider = OllamaProvider::new(&url, "llama3.2").unwrap();
    let reply = provider.complete(&tag_request()).await.unwrap();

    assert_eq!(reply.as_structured().unwrap()["content"], "#a\n#b");
    let seen = stub.only_request();
    assert_eq!(seen.path, "/api/chat");
    assert_eq!(seen.body["stream"], false);
    assert_eq!(seen.body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_anthropic_tool_use() {
    let stub = Stub::new(
        StatusCode::OK,
        json!({
            "content": [{
                "type": "tool_use",
                "name": "generate_tags",
                "input": { "tags": ["#a"] }
            }],
            "stop_reason": "tool_use"
        }),
    );
    let url = stub.spawn().await;

    let provider =
        AnthropicProvider::new(&url, "claude-3-5-haiku-latest", Some("ak".into())).unwrap();
    let reply = provider
        .complete(&tag_request().with_tool(tag_tool()))
        .await
        .unwrap();

    assert_eq!(
        reply.as_structured().unwrap()["content"][0]["input"]["tags"][0],
        "#a"
    );
    let seen = stub.only_request();
    assert_eq!(seen.path, "/v1/messages");
    assert_eq!(seen.headers["x-api-key"], "ak");
    assert_eq!(seen.headers["anthropic-version"], "2023-06-01");
    assert!(seen.body["system"].as_str().unwrap().contains("ALLOWED TAGS"));
    assert_eq!(seen.body["tool_choice"]["name"], "generate_tags");
}

#[tokio::test]
async fn test_gemini_text() {
    let stub = Stub::new(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "#a, #b" }] }
            }]
        }),
    );
    let url = stub.spawn().await;

    let provider = GeminiProvider::new(&url, "gemini-1.5-flash", Some("gk".into())).unwrap();
    let reply = provider.complete(&tag_request()).await.unwrap();

    assert_eq!(reply, RawResponse::Text("#a, #b".to_string()));
    let seen = stub.only_request();
    assert_eq!(seen.path, "/models/gemini-1.5-flash:generateContent");
    assert_eq!(seen.headers["x-goog-api-key"], "gk");
    assert_eq!(
        seen.body["contents"][0]["parts"][0]["text"],
        "Document to analyze"
    );
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let stub = Stub::new(StatusCode::OK, json!({})).slow(Duration::from_secs(3));
    let url = stub.spawn().await;

    let provider = OllamaProvider::new(&url, "llama3.2")
        .unwrap()
        .with_timeout(Duration::from_millis(200))
        .unwrap();
    let err = provider.complete(&tag_request()).await.unwrap_err();
    assert_eq!(err, LlmError::Timeout);
}

#[tokio::test]
async fn test_closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider =
        OpenAiProvider::new(Provider::OpenAi, &format!("http://{}", addr), "m", None).unwrap();
    let err = provider.complete(&tag_request()).await.unwrap_err();
    assert!(matches!(err, LlmError::Unreachable(_)), "got {:?}", err);
}
