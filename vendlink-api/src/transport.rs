use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
  Get,
  Post,
  Delete,
}

impl fmt::Display for Verb {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Verb::Get => write!(f, "GET"),
      Verb::Post => write!(f, "POST"),
      Verb::Delete => write!(f, "DELETE"),
    }
  }
}

/// A fully formed outbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
  pub verb: Verb,
  pub url: String,
  /// JSON body, if any.
  pub body: Option<String>,
  /// Secret-key header value.
  pub secret: String,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
  pub status: u16,
  pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
  /// Request timed out or received no response at all.
  #[error("request timed out")]
  Timeout,

  #[error("network error: {0}")]
  Network(String),
}

/// Seam between the client and the wire. The engine's tests script this;
/// production uses [`HttpTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport with a fixed per-request timeout.
pub struct HttpTransport {
  client: reqwest::Client,
  timeout: Duration,
}

impl HttpTransport {
  pub fn new(timeout: Duration) -> Self {
    Self {
      client: reqwest::Client::new(),
      timeout,
    }
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
    let mut builder = match request.verb {
      Verb::Get => self.client.get(&request.url),
      Verb::Post => self.client.post(&request.url),
      Verb::Delete => self.client.delete(&request.url),
    };

    builder = builder
      .timeout(self.timeout)
      .header("X-Vendlink-Secret", &request.secret)
      .header("Content-Type", "application/json");

    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    let response = builder.send().await.map_err(|err| {
      if err.is_timeout() {
        TransportError::Timeout
      } else {
        TransportError::Network(err.to_string())
      }
    })?;

    let status = response.status().as_u16();
    let body = response
      .text()
      .await
      .map_err(|err| TransportError::Network(err.to_string()))?;

    Ok(ApiResponse { status, body })
  }
}
