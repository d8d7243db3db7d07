//! Collection handle: query building, document operations and transactions.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::ddl::{self, ReindexOptions};
use crate::debug::{DebugEntry, DebugScope};
use crate::dispatch::{encode, Dispatch, Dispatcher};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::escape::field_assignments;
use crate::query::{Condition, Logical, Projection, QueryPieces, SortDir, Target};
use crate::response::Response;
use crate::transport::Method;

const QUERY_ACTION: &str = "/_query";
const STATUS_ACTION: &str = "/_status";

/// Right-hand side of an `UPDATE ... SET`.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateData {
  /// Assignments used verbatim, e.g. `price = 3`.
  Raw(String),
  /// Flattened into `path = literal` assignments.
  Fields(Map<String, Value>),
}

impl UpdateData {
  fn render(&self) -> String {
    match self {
      UpdateData::Raw(raw) => raw.clone(),
      UpdateData::Fields(fields) => field_assignments(fields).join(", "),
    }
  }
}

impl From<&str> for UpdateData {
  fn from(raw: &str) -> Self {
    UpdateData::Raw(raw.to_string())
  }
}

impl From<String> for UpdateData {
  fn from(raw: String) -> Self {
    UpdateData::Raw(raw)
  }
}

impl From<Map<String, Value>> for UpdateData {
  fn from(fields: Map<String, Value>) -> Self {
    UpdateData::Fields(fields)
  }
}

impl From<Value> for UpdateData {
  fn from(value: Value) -> Self {
    match value {
      Value::Object(fields) => UpdateData::Fields(fields),
      Value::String(raw) => UpdateData::Raw(raw),
      other => UpdateData::Raw(other.to_string()),
    }
  }
}

/// Handle to one collection of one database.
///
/// Builder calls accumulate on the handle until the next request is sent,
/// after which the handle is back to an empty query. A handle may hold one
/// open transaction; every request it sends while the transaction is open
/// carries the transaction id.
///
/// ```no_run
/// use clusterpoint::{Clusterpoint, Config, SortDir};
///
/// # async fn demo() -> clusterpoint::Result<()> {
/// let cp = Clusterpoint::new(Config::new("api-eu.clusterpoint.com", "100"))?;
/// let mut books = cp.database("bookshelf").collection("books");
/// let response = books
///   .select(["title", "price"])
///   .where_cmp("price", ">=", 10)
///   .or_where_eq("title", "Book 1")
///   .order_by_dir("price", SortDir::Desc)
///   .limit(5)
///   .get()
///   .await?;
/// for row in response.iter() {
///   println!("{:?}", row.get("title"));
/// }
/// # Ok(())
/// # }
/// ```
pub struct Collection {
  database: String,
  name: String,
  pieces: QueryPieces,
  transaction_id: Option<String>,
  dispatcher: Dispatcher,
  debug: Arc<DebugScope>,
}

impl fmt::Debug for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Collection")
      .field("database", &self.database)
      .field("name", &self.name)
      .field("pieces", &self.pieces)
      .field("transaction_id", &self.transaction_id)
      .finish_non_exhaustive()
  }
}

impl Collection {
  pub(crate) fn new(
    database: impl Into<String>,
    name: impl Into<String>,
    dispatcher: Dispatcher,
    debug: Arc<DebugScope>,
  ) -> Self {
    Self {
      database: database.into(),
      name: name.into(),
      pieces: QueryPieces::default(),
      transaction_id: None,
      dispatcher,
      debug,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn database(&self) -> &str {
    &self.database
  }

  /// Fragments accumulated so far.
  pub fn pieces(&self) -> &QueryPieces {
    &self.pieces
  }

  // ---------------------------------------------------------------
  // Builder
  // ---------------------------------------------------------------

  /// Replace the projection: a raw string, a list of fields, or
  /// `(field, alias)` pairs.
  pub fn select(&mut self, projection: impl Into<Projection>) -> &mut Self {
    self.pieces.select(projection.into());
    self
  }

  /// Add a predicate joined with `logical`.
  pub fn where_condition(&mut self, condition: Condition, logical: Logical) -> &mut Self {
    self.pieces.push_condition(condition, logical);
    self
  }

  /// Add a raw boolean expression, unescaped.
  pub fn where_raw(&mut self, expr: impl Into<String>) -> &mut Self {
    self.where_condition(Condition::Raw(expr.into()), Logical::And)
  }

  /// Add `field == value`.
  pub fn where_eq(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
    self.where_condition(Condition::Eq(field.into(), value.into()), Logical::And)
  }

  /// Add `field <op> value`.
  pub fn where_cmp(
    &mut self,
    field: impl Into<String>,
    op: impl Into<String>,
    value: impl Into<Value>,
  ) -> &mut Self {
    self.where_condition(Condition::Cmp(field.into(), op.into(), value.into()), Logical::And)
  }

  pub fn or_where_raw(&mut self, expr: impl Into<String>) -> &mut Self {
    self.where_condition(Condition::Raw(expr.into()), Logical::Or)
  }

  pub fn or_where_eq(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
    self.where_condition(Condition::Eq(field.into(), value.into()), Logical::Or)
  }

  pub fn or_where_cmp(
    &mut self,
    field: impl Into<String>,
    op: impl Into<String>,
    value: impl Into<Value>,
  ) -> &mut Self {
    self.where_condition(Condition::Cmp(field.into(), op.into(), value.into()), Logical::Or)
  }

  /// Sort ascending by `field`. Calls accumulate.
  pub fn order_by(&mut self, field: &str) -> &mut Self {
    self.order_by_dir(field, SortDir::Asc)
  }

  pub fn order_by_dir(&mut self, field: &str, direction: SortDir) -> &mut Self {
    self.pieces.order_by(field, direction);
    self
  }

  pub fn group_by(&mut self, field: &str) -> &mut Self {
    self.pieces.group_by(field);
    self
  }

  /// Non-numeric or zero input is ignored.
  pub fn limit(&mut self, limit: impl Into<Value>) -> &mut Self {
    self.pieces.set_limit(&limit.into());
    self
  }

  /// Non-numeric input is ignored.
  pub fn offset(&mut self, offset: impl Into<Value>) -> &mut Self {
    self.pieces.set_offset(&offset.into());
    self
  }

  /// Raw text emitted before the `SELECT`. Calls accumulate.
  pub fn prepend(&mut self, text: &str) -> &mut Self {
    self.pieces.prepend(text);
    self
  }

  /// Query the word index instead of documents. Filter with a `word`
  /// predicate.
  pub fn list_words(&mut self) -> &mut Self {
    self.pieces.set_target(Target::ListWords);
    self
  }

  /// Query spelling alternatives. Filter with a `word` predicate.
  pub fn alternatives(&mut self) -> &mut Self {
    self.pieces.set_target(Target::Alternatives);
    self
  }

  pub fn reset_query(&mut self) -> &mut Self {
    self.pieces = QueryPieces::default();
    self
  }

  /// Assemble the accumulated fragments and reset them.
  pub fn compile(&mut self) -> String {
    let pieces = std::mem::take(&mut self.pieces);
    pieces.compile(&self.name)
  }

  // ---------------------------------------------------------------
  // Requests
  // ---------------------------------------------------------------

  fn collection_path(&self, action: &str) -> String {
    format!(
      "{}/{}.{}{}",
      self.dispatcher.config().account_path(),
      self.database,
      self.name,
      action
    )
  }

  async fn run(&mut self, method: Method, action: &str, payload: String) -> Result<Response> {
    self.pieces = QueryPieces::default();
    let dispatch = Dispatch::new(method, self.collection_path(action), payload)
      .with_transaction(self.transaction_id.clone());
    self.dispatcher.execute(dispatch, &self.debug).await
  }

  async fn run_account(&mut self, statement: String) -> Result<Response> {
    self.pieces = QueryPieces::default();
    let dispatch = Dispatch::new(Method::Post, self.dispatcher.config().account_path(), statement)
      .with_transaction(self.transaction_id.clone());
    self.dispatcher.execute(dispatch, &self.debug).await
  }

  /// Run the accumulated query.
  pub async fn get(&mut self) -> Result<Response> {
    let query = self.compile();
    self.run(Method::Post, QUERY_ACTION, query).await
  }

  /// Run the accumulated query for its first row only.
  pub async fn first(&mut self) -> Result<Response> {
    self.limit(1).offset(0);
    self.get().await
  }

  pub async fn insert_one<T: Serialize + ?Sized>(&mut self, document: &T) -> Result<Response> {
    let body = encode(document)?;
    self.run(Method::Post, "", body).await
  }

  pub async fn insert_many<T: Serialize>(&mut self, documents: &[T]) -> Result<Response> {
    let body = encode(documents)?;
    self.run(Method::Post, "", body).await
  }

  pub async fn delete_one(&mut self, id: impl ToString) -> Result<Response> {
    self.delete_many([id]).await
  }

  /// Delete by identifiers. Identifiers are always sent as strings.
  pub async fn delete_many<I>(&mut self, ids: I) -> Result<Response>
  where
    I: IntoIterator,
    I::Item: ToString,
  {
    let ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
    let body = encode(&ids)?;
    self.run(Method::Delete, "", body).await
  }

  /// Fetch one document by identifier.
  pub async fn find(&mut self, id: &str) -> Result<Document<'_>> {
    let action = format!("[{}]", urlencoding::encode(id));
    let response = self.run(Method::Get, &action, String::new()).await?;
    let row = response
      .into_results()
      .into_iter()
      .next()
      .ok_or_else(|| Error::NotFound { id: id.to_string() })?;
    Ok(Document::new(self, id.to_string(), row))
  }

  /// Replace the whole document stored under `id`.
  pub async fn replace<T: Serialize + ?Sized>(&mut self, id: &str, document: &T) -> Result<Response> {
    let action = format!("[{}]", urlencoding::encode(id));
    let body = encode(document)?;
    self.run(Method::Put, &action, body).await
  }

  /// Update fields of the document stored under `id`.
  pub async fn update(&mut self, id: &str, data: impl Into<UpdateData>) -> Result<Response> {
    let query = format!(
      "UPDATE {}[\"{}\"] SET {}",
      self.name,
      urlencoding::encode(id),
      data.into().render()
    );
    self.run(Method::Post, QUERY_ACTION, query).await
  }

  /// Run a query as written, e.g. a JOIN the builder cannot express.
  pub async fn raw(&mut self, query: &str) -> Result<Response> {
    self.run(Method::Post, QUERY_ACTION, query.to_string()).await
  }

  pub async fn status(&mut self) -> Result<Response> {
    self.run(Method::Get, STATUS_ACTION, String::new()).await
  }

  pub async fn describe(&mut self) -> Result<Response> {
    let stmt = ddl::describe_collection(&self.database, &self.name);
    self.run_account(stmt).await
  }

  pub async fn edit_data_model(&mut self, model: &Value) -> Result<Response> {
    let stmt = ddl::edit_data_model(&self.database, &self.name, model);
    self.run_account(stmt).await
  }

  pub async fn reindex(&mut self, options: ReindexOptions) -> Result<Response> {
    let stmt = ddl::reindex_collection(&self.database, &self.name, &options);
    self.run_account(stmt).await
  }

  /// Remove every document, keeping the collection.
  pub async fn clear(&mut self) -> Result<Response> {
    let stmt = ddl::clear_collection(&self.database, &self.name);
    self.run_account(stmt).await
  }

  // ---------------------------------------------------------------
  // Transactions
  // ---------------------------------------------------------------

  /// Id of the open transaction on this handle.
  pub fn transaction_id(&self) -> Option<&str> {
    self.transaction_id.as_deref()
  }

  pub fn in_transaction(&self) -> bool {
    self.transaction_id.is_some()
  }

  /// Open a transaction. Requests from this handle join it until
  /// [`commit`](Self::commit) or [`rollback`](Self::rollback).
  pub async fn begin_transaction(&mut self) -> Result<Response> {
    if let Some(open) = &self.transaction_id {
      return Err(Error::Transaction(format!(
        "transaction {} is already open on {}.{}",
        open, self.database, self.name
      )));
    }

    let response = self
      .run(Method::Post, QUERY_ACTION, ddl::BEGIN_TRANSACTION.to_string())
      .await?;
    let id = response.transaction_id().ok_or_else(|| {
      Error::Transaction("BEGIN_TRANSACTION reply carried no transaction_id".to_string())
    })?;

    info!(
      target: "clusterpoint::txn",
      collection = %self.name,
      transaction_id = %id,
      "Transaction started"
    );
    self.transaction_id = Some(id);
    Ok(response)
  }

  pub async fn commit(&mut self) -> Result<Response> {
    self.finish_transaction(ddl::COMMIT).await
  }

  pub async fn rollback(&mut self) -> Result<Response> {
    self.finish_transaction(ddl::ROLLBACK).await
  }

  /// The id is cleared only once the statement was delivered; on failure
  /// the transaction stays open so the caller can retry or roll back.
  async fn finish_transaction(&mut self, statement: &str) -> Result<Response> {
    let Some(id) = self.transaction_id.clone() else {
      return Err(Error::Transaction(format!(
        "{} without an open transaction on {}.{}",
        statement, self.database, self.name
      )));
    };

    let response = self
      .run(Method::Post, QUERY_ACTION, statement.to_string())
      .await?;
    self.transaction_id = None;

    debug!(
      target: "clusterpoint::txn",
      collection = %self.name,
      transaction_id = %id,
      statement,
      "Transaction finished"
    );
    Ok(response)
  }

  // ---------------------------------------------------------------
  // Debug capture
  // ---------------------------------------------------------------

  pub fn set_debug(&self, enabled: bool) {
    self.debug.set_enabled(enabled);
  }

  pub fn is_debug(&self) -> bool {
    self.debug.is_enabled()
  }

  pub fn debug_entries(&self) -> Vec<DebugEntry> {
    self.debug.entries()
  }
}
