//! Sends one request through the transport and turns the reply into a
//! [`Response`] or an [`Error`].

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::debug::{DebugEntry, DebugScope};
use crate::error::{Error, Result};
use crate::response::Response;
use crate::transport::{Method, RequestDescriptor, Transport, TransportFailure, TransportRequest};

/// Serialize a payload to the JSON text sent as a request body.
pub(crate) fn encode<T: Serialize + ?Sized>(payload: &T) -> Result<String> {
  Ok(serde_json::to_string(payload)?)
}

/// One request as seen by the dispatcher.
#[derive(Debug, Clone)]
pub(crate) struct Dispatch {
  pub method: Method,
  /// Path without the query string.
  pub path: String,
  pub payload: String,
  pub transaction_id: Option<String>,
}

impl Dispatch {
  pub fn new(method: Method, path: impl Into<String>, payload: impl Into<String>) -> Self {
    Self {
      method,
      path: path.into(),
      payload: payload.into(),
      transaction_id: None,
    }
  }

  pub fn with_transaction(mut self, transaction_id: Option<String>) -> Self {
    self.transaction_id = transaction_id;
    self
  }
}

/// Shared by every handle of one client.
#[derive(Clone)]
pub(crate) struct Dispatcher {
  config: Arc<Config>,
  transport: Arc<dyn Transport>,
}

impl Dispatcher {
  pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
    Self { config, transport }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  fn descriptor(&self, dispatch: &Dispatch) -> RequestDescriptor {
    let mut path = dispatch.path.clone();
    if let Some(id) = &dispatch.transaction_id {
      path.push_str("?transaction_id=");
      path.push_str(&urlencoding::encode(id));
    }

    // An empty-bodied DELETE otherwise goes out chunked and the server
    // never sees the payload.
    let headers = if dispatch.method == Method::Delete {
      vec![
        (
          "Content-Type".to_string(),
          "application/x-www-form-urlencoded".to_string(),
        ),
        ("Content-Length".to_string(), dispatch.payload.len().to_string()),
      ]
    } else {
      Vec::new()
    };

    RequestDescriptor {
      method: dispatch.method,
      host: self.config.host.clone(),
      port: self.config.port,
      path,
      username: self.config.username.clone(),
      headers,
    }
  }

  /// Perform the exchange. Every outcome is recorded in `debug_scope` (when it is
  /// switched on) before being returned.
  pub async fn execute(&self, dispatch: Dispatch, debug_scope: &DebugScope) -> Result<Response> {
    let descriptor = self.descriptor(&dispatch);
    let request = TransportRequest {
      descriptor: descriptor.clone(),
      password: self.config.password.clone(),
      body: (dispatch.method != Method::Get).then(|| dispatch.payload.clone()),
    };

    let started = Instant::now();
    let sent = tokio::time::timeout(self.config.timeout, self.transport.send(request)).await;
    let elapsed = started.elapsed();

    let reply = match sent.unwrap_or(Err(TransportFailure::Timeout(self.config.timeout))) {
      Ok(reply) => reply,
      Err(failure) => {
        warn!(
          target: "clusterpoint::dispatch",
          method = %descriptor.method,
          path = %descriptor.path,
          error = %failure,
          "Transport failure"
        );
        debug_scope.record(DebugEntry::new(&dispatch.payload, "", None, descriptor.clone()));
        return Err(match failure {
          TransportFailure::Timeout(timeout) => Error::Timeout {
            timeout,
            payload: dispatch.payload,
            request: Box::new(descriptor),
          },
          TransportFailure::Connection(message) => Error::Transport {
            message,
            payload: dispatch.payload,
            request: Box::new(descriptor),
          },
        });
      }
    };

    debug!(
      target: "clusterpoint::dispatch",
      method = %descriptor.method,
      path = %descriptor.path,
      status = reply.status,
      elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
      "Request completed"
    );

    let parsed = Response::from_reply(
      reply.status,
      reply.body.clone(),
      dispatch.payload.clone(),
      descriptor.clone(),
      elapsed.as_secs_f64(),
    );

    let response = match parsed {
      Ok(response) => {
        debug_scope.record(response.debug_entry());
        response
      }
      Err(e) => {
        debug_scope.record(DebugEntry::new(
          &dispatch.payload,
          &reply.body,
          Some(reply.status),
          descriptor.clone(),
        ));
        if reply.status == 200 {
          return Err(e);
        }
        warn!(
          target: "clusterpoint::dispatch",
          status = reply.status,
          path = %descriptor.path,
          "Service failure with unparseable body"
        );
        return Err(Error::Service {
          status: reply.status,
          errors: Vec::new(),
          payload: dispatch.payload,
          request: Box::new(descriptor),
          response: None,
        });
      }
    };

    if response.status() != 200 {
      warn!(
        target: "clusterpoint::dispatch",
        status = response.status(),
        path = %descriptor.path,
        errors = response.error().len(),
        "Service failure"
      );
      return Err(Error::Service {
        status: response.status(),
        errors: response.error().to_vec(),
        payload: dispatch.payload,
        request: Box::new(descriptor),
        response: Some(Box::new(response)),
      });
    }

    Ok(response)
  }
}
