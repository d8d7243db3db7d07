//! Typed view over one service reply.

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use crate::debug::DebugEntry;
use crate::error::{Error, Result, ServiceErrorEntry};
use crate::transport::RequestDescriptor;

/// One result row: field name to value, in server order.
pub type Row = Map<String, Value>;

/// Fields reported by `DESCRIBE COLLECTION`.
const DESCRIPTION_FIELDS: &[&str] = &[
  "name",
  "code_name",
  "visual_name",
  "shards",
  "replicas",
  "feature_v4",
  "feature_hyperreplicated",
  "support_access",
  "overrides",
];

/// A parsed reply together with the query that produced it.
///
/// Iterate the rows with [`Response::iter`]; an empty reply simply yields
/// nothing.
#[derive(Debug, Clone)]
pub struct Response {
  status: u16,
  fields: Map<String, Value>,
  results: Vec<Row>,
  errors: Vec<ServiceErrorEntry>,
  query: String,
  raw_response: String,
  network_seconds: f64,
  request: RequestDescriptor,
  datetime: DateTime<Local>,
}

impl Response {
  /// Parse a reply body. The body must be a JSON object.
  pub fn from_reply(
    status: u16,
    raw_response: impl Into<String>,
    query: impl Into<String>,
    request: RequestDescriptor,
    network_seconds: f64,
  ) -> Result<Self> {
    let raw_response = raw_response.into();
    let parsed = serde_json::from_str::<Value>(&raw_response)
      .map_err(|e| Error::InvalidReply(e.to_string()))?;
    let mut fields = match parsed {
      Value::Object(map) => map,
      other => {
        return Err(Error::InvalidReply(format!(
          "expected a JSON object, got {}",
          kind(&other)
        )))
      }
    };

    let results = match fields.remove("results") {
      Some(Value::Array(rows)) => rows.into_iter().map(into_row).collect(),
      _ => Vec::new(),
    };
    let errors = fields.get("error").map(parse_errors).unwrap_or_default();

    Ok(Self {
      status,
      fields,
      results,
      errors,
      query: query.into(),
      raw_response,
      network_seconds,
      request,
      datetime: Local::now(),
    })
  }

  pub fn status(&self) -> u16 {
    self.status
  }

  /// Result rows, empty if the reply had none.
  pub fn results(&self) -> &[Row] {
    &self.results
  }

  pub fn into_results(self) -> Vec<Row> {
    self.results
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Row> {
    self.results.iter()
  }

  pub fn len(&self) -> usize {
    self.results.len()
  }

  pub fn is_empty(&self) -> bool {
    self.results.is_empty()
  }

  /// Any top-level reply field other than `results`.
  pub fn field(&self, name: &str) -> Option<&Value> {
    self.fields.get(name)
  }

  /// The query or payload that was sent.
  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn raw_response(&self) -> &str {
    &self.raw_response
  }

  pub fn request(&self) -> &RequestDescriptor {
    &self.request
  }

  /// Server-side execution time.
  pub fn seconds(&self) -> Option<f64> {
    self.fields.get("seconds").and_then(as_f64)
  }

  /// Round trip time including server execution.
  pub fn network_seconds(&self) -> f64 {
    self.network_seconds
  }

  pub fn hits(&self) -> Option<u64> {
    self.fields.get("hits").and_then(as_u64)
  }

  pub fn from(&self) -> Option<u64> {
    self.fields.get("from").and_then(as_u64)
  }

  pub fn to(&self) -> Option<u64> {
    self.fields.get("to").and_then(as_u64)
  }

  pub fn found(&self) -> Option<u64> {
    self.fields.get("found").and_then(as_u64)
  }

  pub fn error(&self) -> &[ServiceErrorEntry] {
    &self.errors
  }

  pub fn transaction_id(&self) -> Option<String> {
    match self.fields.get("transaction_id")? {
      Value::String(s) => Some(s.clone()),
      Value::Null => None,
      other => Some(other.to_string()),
    }
  }

  /// Only present on database listings.
  pub fn databases(&self) -> Option<&Value> {
    self.fields
      .get("databases")
      .or_else(|| self.fields.get("database"))
  }

  /// Only present on status replies.
  pub fn shards(&self) -> Option<&Value> {
    self.fields.get("shards")
  }

  /// Only present on status replies.
  pub fn collection_status(&self) -> Option<&Value> {
    self.fields.get("collection_status")
  }

  /// Description fields present in a `DESCRIBE COLLECTION` reply.
  pub fn describe(&self) -> Map<String, Value> {
    DESCRIPTION_FIELDS
      .iter()
      .filter_map(|name| {
        self.fields
          .get(*name)
          .map(|value| (name.to_string(), value.clone()))
      })
      .collect()
  }

  /// First field of every row, as text. Mutation replies list the touched
  /// identifiers this way, whatever the primary key is called.
  pub fn affected_ids(&self) -> Vec<String> {
    self.results
      .iter()
      .filter_map(|row| row.values().next())
      .map(|value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
      })
      .collect()
  }

  pub fn to_json(&self, pretty: bool) -> Result<String> {
    let text = if pretty {
      serde_json::to_string_pretty(&self.results)?
    } else {
      serde_json::to_string(&self.results)?
    };
    Ok(text)
  }

  pub fn debug_entry(&self) -> DebugEntry {
    DebugEntry {
      datetime: self.datetime,
      ..DebugEntry::new(
        self.query.clone(),
        self.raw_response.clone(),
        Some(self.status),
        self.request.clone(),
      )
    }
  }
}

fn into_row(value: Value) -> Row {
  match value {
    Value::Object(row) => row,
    other => {
      let mut row = Map::new();
      row.insert("value".to_string(), other);
      row
    }
  }
}

fn parse_errors(value: &Value) -> Vec<ServiceErrorEntry> {
  match value {
    Value::Array(items) => items.iter().map(parse_error_entry).collect(),
    Value::Null => Vec::new(),
    other => vec![parse_error_entry(other)],
  }
}

fn parse_error_entry(value: &Value) -> ServiceErrorEntry {
  match value {
    Value::String(message) => ServiceErrorEntry {
      message: Some(message.clone()),
      ..ServiceErrorEntry::default()
    },
    other => serde_json::from_value(other.clone()).unwrap_or_else(|_| ServiceErrorEntry {
      message: Some(other.to_string()),
      ..ServiceErrorEntry::default()
    }),
  }
}

fn as_u64(value: &Value) -> Option<u64> {
  match value {
    Value::Number(n) => n.as_u64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn as_f64(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
