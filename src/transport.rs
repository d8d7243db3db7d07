//! Transport contract and the default HTTPS implementation.
//!
//! The dispatcher only needs "send a request, get a status and body back".
//! Anything that implements [`Transport`] can stand in for the network.

use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::error::{Error, Result};

/// HTTP verbs used by the REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Method::Get => write!(f, "GET"),
      Method::Post => write!(f, "POST"),
      Method::Put => write!(f, "PUT"),
      Method::Delete => write!(f, "DELETE"),
    }
  }
}

impl From<Method> for reqwest::Method {
  fn from(method: Method) -> Self {
    match method {
      Method::Get => reqwest::Method::GET,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
      Method::Delete => reqwest::Method::DELETE,
    }
  }
}

/// Everything about a request except its body and the password.
///
/// Attached to failures and debug entries for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
  pub method: Method,
  pub host: String,
  pub port: u16,
  pub path: String,
  pub username: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub headers: Vec<(String, String)>,
}

/// A request ready to be sent.
#[derive(Clone)]
pub struct TransportRequest {
  pub descriptor: RequestDescriptor,
  pub password: String,
  /// `None` for GET.
  pub body: Option<String>,
}

impl fmt::Debug for TransportRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TransportRequest")
      .field("descriptor", &self.descriptor)
      .field("body", &self.body)
      .finish_non_exhaustive()
  }
}

/// Raw reply: status code and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportReply {
  pub status: u16,
  pub body: String,
}

impl TransportReply {
  pub fn new(status: u16, body: impl Into<String>) -> Self {
    Self {
      status,
      body: body.into(),
    }
  }
}

/// Failure below the HTTP status level.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportFailure {
  #[error("connection failed: {0}")]
  Connection(String),

  #[error("timed out after {0:?}")]
  Timeout(Duration),
}

/// Sends one request and resolves with the raw reply.
pub trait Transport: Send + Sync {
  fn send(&self, request: TransportRequest) -> BoxFuture<'_, std::result::Result<TransportReply, TransportFailure>>;
}

/// [`Transport`] over HTTP(S) using `reqwest`, with basic auth.
pub struct HttpTransport {
  client: reqwest::Client,
  use_tls: bool,
  timeout: Duration,
}

impl HttpTransport {
  pub fn new(config: &Config) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

    Ok(Self {
      client,
      use_tls: config.use_tls,
      timeout: config.timeout,
    })
  }

  fn url(&self, descriptor: &RequestDescriptor) -> String {
    let scheme = if self.use_tls { "https" } else { "http" };
    format!(
      "{}://{}:{}{}",
      scheme, descriptor.host, descriptor.port, descriptor.path
    )
  }
}

impl Transport for HttpTransport {
  fn send(&self, request: TransportRequest) -> BoxFuture<'_, std::result::Result<TransportReply, TransportFailure>> {
    Box::pin(async move {
      let descriptor = &request.descriptor;
      let mut builder = self
        .client
        .request(descriptor.method.into(), self.url(descriptor))
        .basic_auth(&descriptor.username, Some(&request.password));

      for (name, value) in &descriptor.headers {
        builder = builder.header(name.as_str(), value.as_str());
      }
      if let Some(body) = request.body {
        builder = builder.body(body);
      }

      let response = builder.send().await.map_err(|e| self.classify(e))?;
      let status = response.status().as_u16();
      let body = response.text().await.map_err(|e| self.classify(e))?;

      Ok(TransportReply { status, body })
    })
  }
}

impl HttpTransport {
  fn classify(&self, e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
      TransportFailure::Timeout(self.timeout)
    } else {
      TransportFailure::Connection(e.to_string())
    }
  }
}
