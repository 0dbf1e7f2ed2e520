//! End-to-end tests for the OpenAI-compatible adapter against a one-shot
//! HTTP responder bound to a local port.

use lb_domain::config::LlmConfig;
use lb_domain::error::Error;
use lb_domain::tool::{ToolDefinition, Turn};
use lb_providers::{ChatRequest, LlmProvider, OpenAiCompatProvider};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve exactly one request, reply with `status` + `body`, and hand the
/// received request (head, JSON body) back through the channel.
async fn one_shot_server(
    status: u16,
    body: Value,
) -> (String, oneshot::Receiver<(String, Value)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = sock.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case("content-length")
                    .then(|| v.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = sock.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
        }
        let req_body: Value =
            serde_json::from_slice(&buf[head_end..head_end + content_length]).unwrap_or(Value::Null);

        let payload = body.to_string();
        let resp = format!(
            "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
            payload.len()
        );
        sock.write_all(resp.as_bytes()).await.unwrap();
        sock.shutdown().await.ok();
        let _ = tx.send((head, req_body));
    });

    (format!("http://{addr}/v1"), rx)
}

fn provider(base_url: String) -> OpenAiCompatProvider {
    OpenAiCompatProvider::from_config(&LlmConfig {
        base_url,
        api_key: Some("sk-local".into()),
        timeout_ms: 5_000,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn chat_sends_bearer_and_tools_and_parses_reply() {
    let (url, rx) = one_shot_server(
        200,
        json!({
            "model": "gpt-5-nano",
            "choices": [{
                "finish_reason": "stop",
                "message": {"role": "assistant", "content": "Welcome to Kenji Shop!"}
            }]
        }),
    )
    .await;

    let req = ChatRequest::new(vec![Turn::system("be nice"), Turn::user("hello")]).with_tools(
        vec![ToolDefinition {
            name: "get_house_info".into(),
            description: "house".into(),
            parameters: json!({"type": "object", "properties": {}}),
        }],
    );
    let resp = provider(url).chat(&req).await.unwrap();
    assert_eq!(resp.content, "Welcome to Kenji Shop!");
    assert!(resp.tool_calls.is_empty());

    let (head, sent) = rx.await.unwrap();
    assert!(head.starts_with("POST /v1/chat/completions"));
    assert!(head.to_ascii_lowercase().contains("authorization: bearer sk-local"));
    assert_eq!(sent["tool_choice"], "auto");
    assert_eq!(sent["messages"][0]["role"], "system");
    assert_eq!(sent["messages"][1]["content"], "hello");
}

#[tokio::test]
async fn non_success_status_is_a_provider_error() {
    let (url, _rx) = one_shot_server(429, json!({"error": {"message": "slow down"}})).await;

    let err = provider(url)
        .chat(&ChatRequest::new(vec![Turn::user("hi")]))
        .await
        .unwrap_err();
    match err {
        Error::Provider { provider, message } => {
            assert_eq!(provider, "openai");
            assert!(message.starts_with("HTTP 429"));
            assert!(message.contains("slow down"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_an_http_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = provider(format!("http://{addr}/v1"))
        .chat(&ChatRequest::new(vec![Turn::user("hi")]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_) | Error::Timeout(_)));
}
