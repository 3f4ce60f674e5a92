use assistant_core::{Backend, BackendError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::retry::{Backoff, retry_with_backoff};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Chat-completions backend for OpenAI-compatible APIs.
///
/// Examples are kept locally and replayed as user/assistant turns ahead of
/// every question.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    purpose: Option<String>,
    examples: Vec<(String, String)>,
    backoff: Backoff,
}

impl OpenAiBackend {
    pub fn new(api_key: String) -> Self {
        info!("Creating OpenAiBackend");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            purpose: None,
            examples: Vec::new(),
            backoff: Backoff::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Purpose, then each example as a user/assistant pair, then `question`.
    #[must_use]
    pub fn build_messages(&self, question: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.examples.len() * 2 + 2);
        if let Some(purpose) = &self.purpose {
            messages.push(ChatMessage::new(Role::System, purpose.as_str()));
        }
        for (q, a) in &self.examples {
            messages.push(ChatMessage::new(Role::User, q.as_str()));
            messages.push(ChatMessage::new(Role::Assistant, a.as_str()));
        }
        messages.push(ChatMessage::new(Role::User, question));
        messages
    }

    async fn try_send(&self, request: &serde_json::Value) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        extract_content(&response)
    }
}

fn extract_content(response: &serde_json::Value) -> anyhow::Result<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))
}

/// Whether a failed request is worth sending again.
///
/// Only timeouts, connection failures, 429 and 5xx responses qualify.
/// Client errors and malformed responses fail immediately.
#[must_use]
pub fn is_transient(error: &anyhow::Error) -> bool {
    error.downcast_ref::<reqwest::Error>().is_some_and(|e| {
        e.is_timeout()
            || e.is_connect()
            || e.status().is_some_and(|status| {
                status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            })
    })
}

#[async_trait]
impl Backend for OpenAiBackend {
    async fn ask(&self, question: &str, cancel: &CancellationToken) -> Result<String, BackendError> {
        let request = json!({
            "model": self.model,
            "messages": self.build_messages(question),
        });

        debug!(
            "Sending request: model={}, examples={}",
            self.model,
            self.examples.len()
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(BackendError::Cancelled),
            result = retry_with_backoff(|| self.try_send(&request), &self.backoff, is_transient) => {
                let answer = result?;
                debug!("Received response: {} chars", answer.len());
                Ok(answer)
            }
        }
    }

    fn give_example(&mut self, question: &str, answer: &str) {
        self.examples
            .push((question.to_string(), answer.to_string()));
    }

    fn reset(&mut self) {
        self.examples.clear();
    }

    fn set_purpose(&mut self, instructions: &str) {
        self.purpose = Some(instructions.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn quick_backoff() -> Backoff {
        Backoff {
            base_delays: vec![Duration::from_millis(1); 2],
            final_delay: Duration::from_millis(1),
            final_retries: 1,
        }
    }

    /// Serve `status_line` with an empty body to every request, counting them.
    async fn serve_status(status_line: &'static str) -> (String, Arc<AtomicUsize>) {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("failed to bind test listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no address");
        };
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                read_request(&mut stream).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{addr}"), requests)
    }

    /// Consume headers and a `Content-Length` body.
    async fn read_request(stream: &mut tokio::net::TcpStream) {
        let mut received = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let Ok(n) = stream.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            received.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&received);
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let body_len = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if received.len() >= header_end + 4 + body_len {
                return;
            }
        }
    }

    #[test]
    fn test_messages_without_context() {
        let backend = OpenAiBackend::new("key".to_string());
        assert_eq!(
            backend.build_messages("hi"),
            vec![ChatMessage::new(Role::User, "hi")]
        );
    }

    #[test]
    fn test_messages_replay_examples_in_order() {
        let mut backend = OpenAiBackend::new("key".to_string());
        backend.set_purpose("be brief");
        backend.give_example("q1", "a1");
        backend.give_example("q2", "a2");

        let roles: Vec<Role> = backend
            .build_messages("q3")
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User
            ]
        );
        assert_eq!(backend.build_messages("q3")[3].content, "q2");
    }

    #[test]
    fn test_reset_drops_examples_but_keeps_purpose() {
        let mut backend = OpenAiBackend::new("key".to_string());
        backend.set_purpose("be brief");
        backend.give_example("q1", "a1");
        backend.reset();

        assert_eq!(backend.build_messages("q").len(), 2);
    }

    #[test]
    fn test_role_serialization() {
        let Ok(value) = serde_json::to_value(ChatMessage::new(Role::Assistant, "x")) else {
            panic!("serialization failed");
        };
        assert_eq!(value, json!({"role": "assistant", "content": "x"}));
    }

    #[test]
    fn test_extract_content() {
        let response = json!({"choices": [{"message": {"role": "assistant", "content": "42"}}]});
        assert!(matches!(extract_content(&response).as_deref(), Ok("42")));
        assert!(extract_content(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_non_http_errors_are_not_transient() {
        assert!(!is_transient(&anyhow::anyhow!("something broke")));
        let Err(malformed) = extract_content(&json!({})) else {
            panic!("expected a missing-content error");
        };
        assert!(!is_transient(&malformed));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transient() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("failed to bind test listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no address");
        };
        drop(listener);

        let Err(e) = Client::new().get(format!("http://{addr}")).send().await else {
            panic!("expected the connection to be refused");
        };
        assert!(is_transient(&anyhow::Error::from(e)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let (base_url, requests) = serve_status("401 Unauthorized").await;
        let backend = OpenAiBackend::new("bad-key".to_string())
            .with_base_url(base_url)
            .with_backoff(quick_backoff());

        let result = backend.ask("hello", &CancellationToken::new()).await;

        let Err(BackendError::Failed(e)) = result else {
            panic!("expected a backend failure");
        };
        assert!(!is_transient(&e));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let (base_url, requests) = serve_status("503 Service Unavailable").await;
        let backoff = quick_backoff();
        let attempts = backoff.attempts();
        let backend = OpenAiBackend::new("key".to_string())
            .with_base_url(base_url)
            .with_backoff(backoff);

        let result = backend.ask("hello", &CancellationToken::new()).await;

        assert!(matches!(result, Err(BackendError::Failed(_))));
        assert_eq!(requests.load(Ordering::SeqCst), attempts);
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let backend = OpenAiBackend::new("key".to_string())
            .with_base_url("http://127.0.0.1:9".to_string())
            .with_backoff(Backoff::none());
        let token = CancellationToken::new();
        token.cancel();

        let result = backend.ask("hello", &token).await;
        assert!(matches!(result, Err(BackendError::Cancelled)));
    }
}
