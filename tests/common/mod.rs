//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use clusterpoint::{
  Clusterpoint, Config, Transport, TransportFailure, TransportReply, TransportRequest,
};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{json, Value};

type Scripted = Result<TransportReply, TransportFailure>;

/// Records every request and answers from a queue. An empty queue answers
/// `200 {"results": []}`.
#[derive(Default)]
pub struct MockTransport {
  requests: Mutex<Vec<TransportRequest>>,
  replies: Mutex<VecDeque<Scripted>>,
}

impl MockTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn reply(&self, status: u16, body: Value) {
    self.reply_raw(status, &body.to_string());
  }

  pub fn reply_raw(&self, status: u16, body: &str) {
    self.replies.lock().push_back(Ok(TransportReply::new(status, body)));
  }

  pub fn fail(&self, failure: TransportFailure) {
    self.replies.lock().push_back(Err(failure));
  }

  pub fn requests(&self) -> Vec<TransportRequest> {
    self.requests.lock().clone()
  }

  pub fn last(&self) -> TransportRequest {
    self.requests.lock().last().cloned().expect("no request was sent")
  }

  /// Bodies of every request, in order. GET requests show as "".
  pub fn bodies(&self) -> Vec<String> {
    self
      .requests
      .lock()
      .iter()
      .map(|r| r.body.clone().unwrap_or_default())
      .collect()
  }
}

impl Transport for MockTransport {
  fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<TransportReply, TransportFailure>> {
    self.requests.lock().push(request);
    let reply = self
      .replies
      .lock()
      .pop_front()
      .unwrap_or_else(|| Ok(TransportReply::new(200, json!({"results": []}).to_string())));
    Box::pin(async move { reply })
  }
}

pub fn config() -> Config {
  Config::new("api.test", "100").with_credentials("user", "secret")
}

pub fn client(mock: &Arc<MockTransport>) -> Clusterpoint {
  Clusterpoint::with_transport(config(), mock.clone()).expect("valid config")
}
