//! Clusterpoint Rust Client SDK
//!
//! An HTTPS client for Clusterpoint, a multi-model document database with a
//! SQL-like query language.
//!
//! # Example
//!
//! ```no_run
//! use clusterpoint::{Clusterpoint, Config};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> clusterpoint::Result<()> {
//!     let cp = Clusterpoint::new(
//!         Config::new("api-eu.clusterpoint.com", "ACCOUNT_ID")
//!             .with_credentials("USERNAME", "PASSWORD"),
//!     )?;
//!     let mut books = cp.database("bookshelf").collection("books");
//!
//!     // Insert documents
//!     let inserted = books.insert_many(&[
//!         json!({ "_id": 1, "title": "Book 1", "price": 1 }),
//!         json!({ "_id": 2, "title": "Book 2", "price": 2 }),
//!     ]).await?;
//!     println!("Inserted: {:?}", inserted.affected_ids());
//!
//!     // Query documents
//!     let cheap = books.where_cmp("price", "<", 2).order_by("title").get().await?;
//!     for book in cheap.iter() {
//!         println!("{}", book["title"]);
//!     }
//!
//!     // Edit one document in place
//!     let mut book = books.find("1").await?;
//!     book.set("price", 3);
//!     book.save().await?;
//!
//!     // Transactions are scoped to the handle
//!     books.begin_transaction().await?;
//!     books.update("1", json!({ "price": 4 })).await?;
//!     books.update("2", "price = 5").await?;
//!     books.commit().await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod collection;
pub mod ddl;
pub mod debug;
mod dispatch;
mod document;
mod error;
mod config;
pub mod escape;
pub mod query;
mod response;
pub mod transport;

pub use client::{Clusterpoint, Database};
pub use collection::{Collection, UpdateData};
pub use config::{Config, DEFAULT_API_VERSION, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use ddl::{CollectionOptions, ReindexOptions};
pub use debug::DebugEntry;
pub use document::Document;
pub use error::{Error, Result, ServiceErrorEntry};
pub use escape::escape;
pub use query::{Condition, Logical, Projection, SortDir};
pub use response::{Response, Row};
pub use transport::{
  HttpTransport, Method, RequestDescriptor, Transport, TransportFailure, TransportReply, TransportRequest,
};
