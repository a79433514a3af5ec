use std::future::Future;
use std::ops::RangeInclusive;

use serde::Serialize;
use tracing::debug;

use crate::config::ApiSettings;
use crate::error::AssistantError;

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=0.1;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 400..=500;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Decoding parameters sent with every request. Kept narrow so answers stay
/// close to the source text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingConfig {
    temperature: f64,
    max_tokens: u32,
}

impl DecodingConfig {
    pub fn new(temperature: f64, max_tokens: u32) -> Result<Self, AssistantError> {
        Ok(Self {
            temperature: check_temperature(temperature)?,
            max_tokens: check_max_tokens(max_tokens)?,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 500,
        }
    }
}

pub fn check_temperature(temperature: f64) -> Result<f64, AssistantError> {
    if TEMPERATURE_RANGE.contains(&temperature) {
        Ok(temperature)
    } else {
        Err(AssistantError::Configuration(format!(
            "temperature {} outside {:?}",
            temperature, TEMPERATURE_RANGE
        )))
    }
}

pub fn check_max_tokens(max_tokens: u32) -> Result<u32, AssistantError> {
    if MAX_TOKENS_RANGE.contains(&max_tokens) {
        Ok(max_tokens)
    } else {
        Err(AssistantError::Configuration(format!(
            "max_tokens {} outside {:?}",
            max_tokens, MAX_TOKENS_RANGE
        )))
    }
}

/// One system + user exchange.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub decoding: DecodingConfig,
    /// Ask the endpoint for a JSON-only response.
    pub json_output: bool,
}

/// Anything that can turn a two-message exchange into one completion.
pub trait Completer {
    fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> impl Future<Output = Result<String, AssistantError>> + Send;

    /// Model name shown in reply footers.
    fn model(&self) -> &str;
}

pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    model: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                AssistantError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: settings.endpoint.clone(),
            api_version: settings.api_version.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        chat_completions_url(&self.base_url)
    }
}

impl Completer for LlmClient {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AssistantError> {
        let body = request_body(&self.model, request);
        debug!(
            model = %self.model,
            system_len = request.system.len(),
            user_len = request.user.len(),
            json_output = request.json_output,
            "sending completion request"
        );

        let resp = self
            .client
            .post(self.endpoint())
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let snippet: String = text.chars().take(300).collect();
            return Err(AssistantError::RemoteCall(format!(
                "endpoint returned {}: {}",
                status, snippet
            )));
        }

        let content = extract_content(&text)?;
        debug!(response_len = content.len(), "completion received");
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn chat_completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{}/chat/completions", base)
    }
}

fn request_body(model: &str, request: &CompletionRequest<'_>) -> serde_json::Value {
    let messages = [Message::system(request.system), Message::user(request.user)];
    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
        "temperature": request.decoding.temperature(),
        "max_tokens": request.decoding.max_tokens(),
    });
    if request.json_output {
        body["response_format"] = serde_json::json!({ "type": "json_object" });
    }
    body
}

/// Pull `choices[0].message.content` out of a response body.
fn extract_content(body: &str) -> Result<String, AssistantError> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AssistantError::RemoteCall(format!("failed to parse response JSON: {}", e)))?;

    json["choices"]
        .get(0)
        .and_then(|c| c["message"]["content"].as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| AssistantError::RemoteCall("response has no completion content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_path() {
        assert_eq!(
            chat_completions_url("https://x.models.ai.azure.com/"),
            "https://x.models.ai.azure.com/chat/completions"
        );
    }

    #[test]
    fn test_endpoint_keeps_full_path() {
        assert_eq!(
            chat_completions_url("https://x.example/models/chat/completions"),
            "https://x.example/models/chat/completions"
        );
    }

    #[test]
    fn test_decoding_bounds() {
        assert!(DecodingConfig::new(0.0, 400).is_ok());
        assert!(DecodingConfig::new(0.1, 500).is_ok());
        assert!(matches!(
            DecodingConfig::new(0.7, 500),
            Err(AssistantError::Configuration(_))
        ));
        assert!(matches!(
            DecodingConfig::new(0.1, 2048),
            Err(AssistantError::Configuration(_))
        ));
    }

    #[test]
    fn test_request_body_has_two_messages() {
        let req = CompletionRequest {
            system: "rules",
            user: "question",
            decoding: DecodingConfig::default(),
            json_output: false,
        };
        let body = request_body("Phi-4", &req);
        assert_eq!(body["model"], "Phi-4");
        assert_eq!(body["messages"].as_array().map(|m| m.len()), Some(2));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "question");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["temperature"], 0.1);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_request_body_json_mode() {
        let req = CompletionRequest {
            system: "rules",
            user: "question",
            decoding: DecodingConfig::default(),
            json_output: true,
        };
        let body = request_body("Phi-4", &req);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"- item"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "- item");
    }

    #[test]
    fn test_extract_content_missing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(
            extract_content(body),
            Err(AssistantError::RemoteCall(_))
        ));
        assert!(matches!(
            extract_content("<html>"),
            Err(AssistantError::RemoteCall(_))
        ));
    }

    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const OK_BODY: &str = r#"{"choices":[{"message":{"role":"assistant","content":"- a"}}]}"#;

    fn client_for(endpoint: String, timeout: Duration) -> LlmClient {
        LlmClient::new(&ApiSettings {
            endpoint,
            api_key: "test-key".to_string(),
            api_version: "2024-05-01-preview".to_string(),
            model: "Phi-4".to_string(),
            timeout,
        })
        .unwrap()
    }

    fn request(json_output: bool) -> CompletionRequest<'static> {
        CompletionRequest {
            system: "rules",
            user: "question",
            decoding: DecodingConfig::default(),
            json_output,
        }
    }

    /// Accept one connection, capture the raw request, answer after `delay`.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
        delay: Duration,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }
            tokio::time::sleep(delay).await;
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&raw).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_complete_success_wire_shape() {
        let (endpoint, server) = serve_once("HTTP/1.1 200 OK", OK_BODY, Duration::ZERO).await;
        let client = client_for(endpoint, Duration::from_secs(5));

        let content = client.complete(&request(true)).await.unwrap();
        assert_eq!(content, "- a");

        let raw = server.await.unwrap();
        let lower = raw.to_lowercase();
        assert!(raw.starts_with("POST /chat/completions?api-version=2024-05-01-preview HTTP/1.1"));
        assert!(lower.contains("api-key: test-key"));
        assert!(lower.contains("authorization: bearer test-key"));

        let body_start = raw.find("\r\n\r\n").unwrap() + 4;
        let body: serde_json::Value = serde_json::from_str(&raw[body_start..]).unwrap();
        assert_eq!(body["model"], "Phi-4");
        assert_eq!(body["messages"][0]["content"], "rules");
        assert_eq!(body["messages"][1]["content"], "question");
        assert_eq!(body["temperature"], 0.1);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[tokio::test]
    async fn test_complete_error_status_is_remote_call() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"error":"boom"}"#,
            Duration::ZERO,
        )
        .await;
        let client = client_for(endpoint, Duration::from_secs(5));

        match client.complete(&request(false)).await {
            Err(AssistantError::RemoteCall(msg)) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("boom"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        let raw = server.await.unwrap();
        assert!(!raw.contains("response_format"));
    }

    #[tokio::test]
    async fn test_complete_undecodable_body_is_remote_call() {
        let (endpoint, _server) = serve_once("HTTP/1.1 200 OK", "<html>", Duration::ZERO).await;
        let client = client_for(endpoint, Duration::from_secs(5));
        assert!(matches!(
            client.complete(&request(false)).await,
            Err(AssistantError::RemoteCall(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_timeout_is_remote_call() {
        let (endpoint, _server) =
            serve_once("HTTP/1.1 200 OK", OK_BODY, Duration::from_secs(3)).await;
        let client = client_for(endpoint, Duration::from_secs(1));

        match client.complete(&request(false)).await {
            Err(AssistantError::RemoteCall(msg)) => assert!(msg.contains("timed out"), "{}", msg),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_connection_refused_is_remote_call() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{}", addr), Duration::from_secs(5));
        assert!(matches!(
            client.complete(&request(false)).await,
            Err(AssistantError::RemoteCall(_))
        ));
    }
}
