//! HTTP client for the inference daemon.
//!
//! Speaks the Ollama-style REST API: `/api/generate` for completions,
//! `/api/tags` for model listing and liveness, `/api/pull` for downloads.
//! Every call is a single attempt; retry policy belongs to the caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors from the backend client, classified so the serving layer can map
/// each to a distinct user-facing message.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("backend request timed out")]
    Timeout,

    #[error("backend unreachable at {0}")]
    Unreachable(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend reported error: {0}")]
    Api(String),

    #[error("backend reply missing generated text")]
    MalformedReply,

    #[error("transport error: {0}")]
    Transport(reqwest::Error),
}

/// Fixed sampling parameters attached to every generate call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { temperature: 0.7, top_p: 0.9, top_k: 40 }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

/// Client for one configured daemon + model. Stateless across calls.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    options: GenerationOptions,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        options: GenerationOptions,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            model: model.into(),
            options,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a prompt to the generate endpoint and return the reply text with
    /// any leading `Assistant:` role echo stripped.
    pub async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.options,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(ClientError::Status { status: status.as_u16(), body });
        }

        let reply: GenerateResponse =
            serde_json::from_str(&body).map_err(|_| ClientError::MalformedReply)?;

        if let Some(error) = reply.error {
            return Err(ClientError::Api(error));
        }

        match reply.response {
            Some(text) => Ok(strip_role_echo(&text).to_owned()),
            None => Err(ClientError::MalformedReply),
        }
    }

    /// Whether the configured model shows up in the daemon's model listing,
    /// by exact name or `name:` tag prefix.
    pub async fn model_present(&self) -> Result<bool, ClientError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status: status.as_u16(), body });
        }

        let tags: TagsResponse = response.json().await.map_err(|_| ClientError::MalformedReply)?;
        let base = self.model.split(':').next().unwrap_or(&self.model);
        let found = tags
            .models
            .iter()
            .any(|m| m.name == self.model || m.name.starts_with(&format!("{base}:")));

        debug!(model = %self.model, found, "model listing checked");
        Ok(found)
    }

    /// Trigger a blocking download of the configured model. Pulls can take
    /// minutes, so the caller supplies the deadline.
    pub async fn pull_model(&self, timeout: Duration) -> Result<(), ClientError> {
        let url = format!("{}/api/pull", self.base_url);
        let request = PullRequest { name: &self.model, stream: false };

        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status: status.as_u16(), body });
        }
        Ok(())
    }

    /// Cheap liveness probe: the daemon answers its model listing.
    pub async fn healthy(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn classify(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Unreachable(self.base_url.clone())
        } else {
            ClientError::Transport(err)
        }
    }
}

/// Drop a literal `Assistant:` prefix some models emit before their reply.
fn strip_role_echo(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.split_once(':') {
        Some((head, rest)) if head.eq_ignore_ascii_case("assistant") => rest.trim_start(),
        _ => trimmed,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client_for(addr: SocketAddr, timeout_ms: u64) -> BackendClient {
        BackendClient::new(
            format!("http://{addr}"),
            "test-model:1b",
            GenerationOptions::default(),
            Duration::from_millis(timeout_ms),
        )
        .expect("client build")
    }

    /// Accept one connection, read the request, answer with a canned HTTP
    /// response, and close.
    async fn serve_once(status_line: &'static str, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        addr
    }

    #[test]
    fn role_echo_is_stripped() {
        assert_eq!(strip_role_echo("Assistant: hi there"), "hi there");
        assert_eq!(strip_role_echo("assistant:hi"), "hi");
        assert_eq!(strip_role_echo("  plain reply  "), "plain reply");
        // Only a leading role label is treated as an echo.
        assert_eq!(strip_role_echo("Note: keep this"), "Note: keep this");
    }

    #[test]
    fn default_options() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.temperature, 0.7);
        assert_eq!(opts.top_p, 0.9);
        assert_eq!(opts.top_k, 40);
    }

    #[tokio::test]
    async fn generate_returns_reply_text() {
        let addr = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"response":"Assistant: hello back","done":true}"#,
        )
        .await;

        let reply = client_for(addr, 2_000).generate("hi").await.expect("generate");
        assert_eq!(reply, "hello back");
    }

    #[tokio::test]
    async fn generate_classifies_timeout() {
        // Accept the connection but never answer.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            if let Ok((socket, _)) = listener.accept().await {
                tokio::time::sleep(Duration::from_secs(5)).await;
                drop(socket);
            }
        });

        let err = client_for(addr, 200).generate("hi").await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout), "got {err:?}");
    }

    #[tokio::test]
    async fn generate_classifies_connection_refused() {
        // Bind then drop to get a port nobody is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let err = client_for(addr, 2_000).generate("hi").await.unwrap_err();
        assert!(matches!(err, ClientError::Unreachable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn generate_classifies_non_2xx() {
        let addr = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;

        let err = client_for(addr, 2_000).generate("hi").await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 500, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn generate_classifies_missing_text_field() {
        let addr = serve_once("HTTP/1.1 200 OK", r#"{"done":true}"#).await;

        let err = client_for(addr, 2_000).generate("hi").await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedReply), "got {err:?}");
    }

    #[tokio::test]
    async fn generate_surfaces_daemon_reported_error() {
        let addr = serve_once("HTTP/1.1 200 OK", r#"{"error":"model exploded"}"#).await;

        let err = client_for(addr, 2_000).generate("hi").await.unwrap_err();
        match err {
            ClientError::Api(msg) => assert_eq!(msg, "model exploded"),
            other => panic!("got {other:?}"),
        }
    }

    #[tokio::test]
    async fn model_present_matches_exact_and_tag_prefix() {
        let addr = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"models":[{"name":"test-model:1b"},{"name":"other:7b"}]}"#,
        )
        .await;
        assert!(client_for(addr, 2_000).model_present().await.expect("tags"));

        let addr = serve_once("HTTP/1.1 200 OK", r#"{"models":[{"name":"other:7b"}]}"#).await;
        assert!(!client_for(addr, 2_000).model_present().await.expect("tags"));
    }

    #[tokio::test]
    async fn healthy_is_false_when_nothing_listens() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        assert!(!client_for(addr, 500).healthy().await);
    }
}
