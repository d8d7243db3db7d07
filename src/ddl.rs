//! Fixed-keyword statements for databases, collections and transactions.

use serde_json::Value;

pub const BEGIN_TRANSACTION: &str = "BEGIN_TRANSACTION";
pub const COMMIT: &str = "COMMIT";
pub const ROLLBACK: &str = "ROLLBACK";
pub const LIST_DATABASES: &str = "LIST DATABASES";

/// Options for `CREATE COLLECTION`.
///
/// ```
/// use clusterpoint::CollectionOptions;
/// use serde_json::json;
///
/// let options = CollectionOptions::new()
///   .shards(4)
///   .replicas(2)
///   .data_model(json!({ "title": "string" }));
/// assert_eq!(options.shards, Some(4));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionOptions {
  pub shards: Option<u32>,
  pub replicas: Option<u32>,
  pub hyperreplication: bool,
  pub data_model: Option<Value>,
  pub config: Option<Value>,
}

impl CollectionOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn shards(mut self, shards: u32) -> Self {
    self.shards = Some(shards);
    self
  }

  pub fn replicas(mut self, replicas: u32) -> Self {
    self.replicas = Some(replicas);
    self
  }

  pub fn hyperreplication(mut self, enabled: bool) -> Self {
    self.hyperreplication = enabled;
    self
  }

  pub fn data_model(mut self, model: Value) -> Self {
    self.data_model = Some(model);
    self
  }

  pub fn config(mut self, config: Value) -> Self {
    self.config = Some(config);
    self
  }
}

/// Options for `REINDEX COLLECTION`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReindexOptions {
  pub in_background: bool,
  pub shard: Option<u32>,
  pub node: Option<u32>,
}

impl ReindexOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn in_background(mut self) -> Self {
    self.in_background = true;
    self
  }

  pub fn shard(mut self, shard: u32) -> Self {
    self.shard = Some(shard);
    self
  }

  pub fn node(mut self, node: u32) -> Self {
    self.node = Some(node);
    self
  }
}

pub fn create_database(name: &str) -> String {
  format!("CREATE DATABASE {}", name)
}

pub fn drop_database(name: &str) -> String {
  format!("DROP DATABASE {}", name)
}

/// `LIST COLLECTIONS`, optionally restricted to one database.
pub fn list_collections(database: Option<&str>) -> String {
  match database {
    Some(db) => format!("LIST COLLECTIONS FROM {}", db),
    None => "LIST COLLECTIONS".to_string(),
  }
}

pub fn create_collection(database: &str, collection: &str, options: &CollectionOptions) -> String {
  let mut stmt = format!("CREATE COLLECTION {}.{}", database, collection);
  if let Some(shards) = options.shards {
    stmt.push_str(&format!(" WITH {} SHARDS", shards));
  }
  if let Some(replicas) = options.replicas {
    stmt.push_str(&format!(" WITH {} REPLICAS", replicas));
  }
  if options.hyperreplication {
    stmt.push_str(" WITH HYPERREPLICATION");
  }
  if let Some(model) = &options.data_model {
    stmt.push_str(&format!(" WITH DATA MODEL {}", model));
  }
  if let Some(config) = &options.config {
    stmt.push_str(&format!(" WITH CONFIG {}", config));
  }
  stmt
}

pub fn drop_collection(database: &str, collection: &str) -> String {
  format!("DROP COLLECTION {}.{}", database, collection)
}

pub fn edit_data_model(database: &str, collection: &str, model: &Value) -> String {
  format!("EDIT COLLECTION {}.{} SET DATA MODEL {}", database, collection, model)
}

pub fn describe_collection(database: &str, collection: &str) -> String {
  format!("DESCRIBE COLLECTION {}.{}", database, collection)
}

pub fn reindex_collection(database: &str, collection: &str, options: &ReindexOptions) -> String {
  let mut stmt = format!("REINDEX COLLECTION {}.{}", database, collection);
  if options.in_background {
    stmt.push_str(" IN BACKGROUND");
  }
  if let Some(shard) = options.shard {
    stmt.push_str(&format!(" SHARD {}", shard));
  }
  if let Some(node) = options.node {
    stmt.push_str(&format!(" NODE {}", node));
  }
  stmt
}

pub fn clear_collection(database: &str, collection: &str) -> String {
  format!("CLEAR COLLECTION {}.{}", database, collection)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_create_collection_plain() {
    let stmt = create_collection("shop", "books", &CollectionOptions::new());
    assert_eq!(stmt, "CREATE COLLECTION shop.books");
  }

  #[test]
  fn test_create_collection_all_options() {
    let options = CollectionOptions::new()
      .shards(3)
      .replicas(2)
      .hyperreplication(true)
      .data_model(json!({"title": "string"}))
      .config(json!({"lang": "en"}));
    assert_eq!(
      create_collection("shop", "books", &options),
      r#"CREATE COLLECTION shop.books WITH 3 SHARDS WITH 2 REPLICAS WITH HYPERREPLICATION WITH DATA MODEL {"title":"string"} WITH CONFIG {"lang":"en"}"#
    );
  }

  #[test]
  fn test_reindex() {
    assert_eq!(
      reindex_collection("shop", "books", &ReindexOptions::new()),
      "REINDEX COLLECTION shop.books"
    );
    let options = ReindexOptions::new().in_background().shard(1).node(0);
    assert_eq!(
      reindex_collection("shop", "books", &options),
      "REINDEX COLLECTION shop.books IN BACKGROUND SHARD 1 NODE 0"
    );
  }

  #[test]
  fn test_list_collections() {
    assert_eq!(list_collections(None), "LIST COLLECTIONS");
    assert_eq!(list_collections(Some("shop")), "LIST COLLECTIONS FROM shop");
  }

  #[test]
  fn test_edit_data_model() {
    assert_eq!(
      edit_data_model("shop", "books", &json!({"price": "number"})),
      r#"EDIT COLLECTION shop.books SET DATA MODEL {"price":"number"}"#
    );
  }
}
