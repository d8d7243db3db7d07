//! Error types for the Clusterpoint client SDK.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::Response;
use crate::transport::RequestDescriptor;

/// One entry of the `error` array the service returns on failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceErrorEntry {
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub text: Option<String>,
  #[serde(default)]
  pub code: Option<serde_json::Value>,
  #[serde(default)]
  pub source: Option<String>,
  #[serde(default)]
  pub details: Option<serde_json::Value>,
}

impl std::fmt::Display for ServiceErrorEntry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let message = self.message.as_deref().unwrap_or("unknown error");
    match &self.code {
      Some(code) => write!(f, "{} ({})", message, code),
      None => write!(f, "{}", message),
    }
  }
}

fn summarize(errors: &[ServiceErrorEntry]) -> String {
  if errors.is_empty() {
    return "no error details".to_string();
  }
  errors
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

#[derive(Error, Debug)]
pub enum Error {
  #[error("Transport error: {message}")]
  Transport {
    message: String,
    payload: String,
    request: Box<RequestDescriptor>,
  },

  #[error("Service error {status}: {}", summarize(.errors))]
  Service {
    status: u16,
    errors: Vec<ServiceErrorEntry>,
    payload: String,
    request: Box<RequestDescriptor>,
    response: Option<Box<Response>>,
  },

  #[error("Document not found: {id}")]
  NotFound { id: String },

  #[error("Invalid reply: {0}")]
  InvalidReply(String),

  #[error("Transaction error: {0}")]
  Transaction(String),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Serialization error: {0}")]
  Serialization(String),

  #[error("Request timed out after {timeout:?}")]
  Timeout {
    timeout: Duration,
    payload: String,
    request: Box<RequestDescriptor>,
  },
}

impl Error {
  /// HTTP status of a service failure.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Service { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// Structured service errors; empty for every other kind of failure.
  pub fn service_errors(&self) -> &[ServiceErrorEntry] {
    match self {
      Self::Service { errors, .. } => errors,
      _ => &[],
    }
  }

  /// Payload that was being sent when the failure happened.
  pub fn payload(&self) -> Option<&str> {
    match self {
      Self::Transport { payload, .. }
      | Self::Service { payload, .. }
      | Self::Timeout { payload, .. } => Some(payload),
      _ => None,
    }
  }

  pub fn request(&self) -> Option<&RequestDescriptor> {
    match self {
      Self::Transport { request, .. }
      | Self::Service { request, .. }
      | Self::Timeout { request, .. } => Some(request),
      _ => None,
    }
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Self::Serialization(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, Error>;
