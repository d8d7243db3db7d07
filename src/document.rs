//! Single-document view returned by [`Collection::find`].

use serde_json::Value;

use crate::collection::Collection;
use crate::error::Result;
use crate::response::{Response, Row};

/// A fetched document that can be edited and written back.
///
/// Fields live in their own map, so any field name the server returns is
/// fine, including `save` or `delete`.
///
/// ```no_run
/// # async fn demo(books: &mut clusterpoint::Collection) -> clusterpoint::Result<()> {
/// let mut book = books.find("1").await?;
/// book.set("title", "Book 1, second edition");
/// book.save().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Document<'c> {
  collection: &'c mut Collection,
  id: String,
  fields: Row,
}

impl<'c> Document<'c> {
  pub(crate) fn new(collection: &'c mut Collection, id: String, fields: Row) -> Self {
    Self {
      collection,
      id,
      fields,
    }
  }

  /// Identifier captured when the document was fetched.
  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn fields(&self) -> &Row {
    &self.fields
  }

  pub fn fields_mut(&mut self) -> &mut Row {
    &mut self.fields
  }

  pub fn get(&self, field: &str) -> Option<&Value> {
    self.fields.get(field)
  }

  /// Set a field, returning its previous value.
  pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.fields.insert(field.into(), value.into())
  }

  pub fn remove(&mut self, field: &str) -> Option<Value> {
    self.fields.shift_remove(field)
  }

  pub fn into_fields(self) -> Row {
    self.fields
  }

  /// Replace the stored document with the current field set.
  pub async fn save(&mut self) -> Result<Response> {
    self.collection.replace(&self.id, &self.fields).await
  }

  /// Remove the stored document.
  pub async fn delete(&mut self) -> Result<Response> {
    self.collection.delete_one(&self.id).await
  }
}
