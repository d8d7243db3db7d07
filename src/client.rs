//! Client entry point and database handles.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::collection::Collection;
use crate::config::Config;
use crate::ddl::{self, CollectionOptions};
use crate::debug::{DebugEntry, DebugScope};
use crate::dispatch::{Dispatch, Dispatcher};
use crate::error::Result;
use crate::response::Response;
use crate::transport::{HttpTransport, Method, Transport};

/// Clusterpoint client.
///
/// Cheap to clone; clones share configuration, transport and debug log.
#[derive(Clone)]
pub struct Clusterpoint {
  dispatcher: Dispatcher,
  debug: Arc<DebugScope>,
}

impl Clusterpoint {
  /// Client over HTTPS (or HTTP when `use_tls` is off).
  pub fn new(config: Config) -> Result<Self> {
    let transport = HttpTransport::new(&config)?;
    Self::with_transport(config, Arc::new(transport))
  }

  /// Client over a caller-provided transport.
  pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
    config.validate()?;
    debug!(
      target: "clusterpoint::client",
      host = %config.host,
      port = config.port,
      account_id = %config.account_id,
      "Client created"
    );
    let debug = DebugScope::root(config.debug);
    Ok(Self {
      dispatcher: Dispatcher::new(Arc::new(config), transport),
      debug,
    })
  }

  pub fn config(&self) -> &Config {
    self.dispatcher.config()
  }

  pub fn database(&self, name: impl Into<String>) -> Database {
    Database {
      name: name.into(),
      dispatcher: self.dispatcher.clone(),
      debug: self.debug.child(),
    }
  }

  /// Render a value as a query literal.
  pub fn escape(&self, value: &Value) -> String {
    crate::escape::escape(value)
  }

  async fn statement(&self, statement: String) -> Result<Response> {
    let dispatch = Dispatch::new(Method::Post, self.config().account_path(), statement);
    self.dispatcher.execute(dispatch, &self.debug).await
  }

  pub async fn create_database(&self, name: &str) -> Result<Response> {
    self.statement(ddl::create_database(name)).await
  }

  pub async fn drop_database(&self, name: &str) -> Result<Response> {
    self.statement(ddl::drop_database(name)).await
  }

  pub async fn list_databases(&self) -> Result<Response> {
    self.statement(ddl::LIST_DATABASES.to_string()).await
  }

  /// Collections of every database on the account.
  pub async fn list_collections(&self) -> Result<Response> {
    self.statement(ddl::list_collections(None)).await
  }

  /// Switch debug capture for the client and every handle created from it.
  pub fn set_debug(&self, enabled: bool) {
    self.debug.set_enabled(enabled);
  }

  pub fn is_debug(&self) -> bool {
    self.debug.is_enabled()
  }

  /// Everything captured by this client and its handles.
  pub fn debug_entries(&self) -> Vec<DebugEntry> {
    self.debug.entries()
  }
}

/// Handle to one database.
#[derive(Clone)]
pub struct Database {
  name: String,
  dispatcher: Dispatcher,
  debug: Arc<DebugScope>,
}

impl Database {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn collection(&self, name: impl Into<String>) -> Collection {
    Collection::new(
      self.name.clone(),
      name,
      self.dispatcher.clone(),
      self.debug.child(),
    )
  }

  async fn statement(&self, statement: String) -> Result<Response> {
    let dispatch = Dispatch::new(
      Method::Post,
      self.dispatcher.config().account_path(),
      statement,
    );
    self.dispatcher.execute(dispatch, &self.debug).await
  }

  pub async fn create_collection(&self, name: &str, options: &CollectionOptions) -> Result<Response> {
    self.statement(ddl::create_collection(&self.name, name, options)).await
  }

  pub async fn drop_collection(&self, name: &str) -> Result<Response> {
    self.statement(ddl::drop_collection(&self.name, name)).await
  }

  pub async fn list_collections(&self) -> Result<Response> {
    self.statement(ddl::list_collections(Some(&self.name))).await
  }

  /// Switch debug capture for this database and its collection handles.
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
