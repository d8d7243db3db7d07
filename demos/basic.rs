//! Basic example demonstrating Clusterpoint Rust SDK usage.

use clusterpoint::{Clusterpoint, Config, SortDir};
use serde_json::json;

#[tokio::main]
async fn main() -> clusterpoint::Result<()> {
  tracing_subscriber::fmt::init();

  // Replace 'api-eu' with 'api-us' when using the US cloud
  let config = Config::new("api-eu.clusterpoint.com", "ACCOUNT_ID")
    .with_credentials("USERNAME", "PASSWORD");
  let cp = Clusterpoint::new(config)?;

  let bookshelf = cp.database("bookshelf");
  let mut authors = bookshelf.collection("authors");
  let mut books = bookshelf.collection("books");

  // Start from empty collections
  let existing = books.limit(10000).get().await?;
  let ids: Vec<String> = existing
    .iter()
    .filter_map(|doc| doc.get("_id"))
    .map(|id| id.as_str().map(String::from).unwrap_or_else(|| id.to_string()))
    .collect();
  if !ids.is_empty() {
    books.delete_many(ids).await?;
  }
  authors.clear().await?;

  let inserted = authors
    .insert_many(&[
      json!({"_id": 1, "name": "John"}),
      json!({"_id": 2, "name": "Fred"}),
    ])
    .await?;
  println!("Inserted authors: {:?}", inserted.affected_ids());

  books
    .insert_many(&[
      json!({
        "_id": 1, "title": "Book 1", "category": "Science", "color": "red",
        "availability": true, "author_id": 1, "price": 1,
        "deeper": {"foo": 1, "bar": 2}
      }),
      json!({
        "_id": 2, "title": "Book 2", "category": "Fiction", "color": "red",
        "availability": true, "author_id": 2, "price": 2
      }),
    ])
    .await?;

  // JOINs go through raw()
  let joined = books
    .raw(
      "SELECT books.title AS title, author.name AS name FROM books \
       LEFT JOIN authors AS author ON author._id == books.author_id",
    )
    .await?;
  for row in joined.iter() {
    println!("{} ({})", row["title"], row["name"]);
  }

  // Query builder
  let response = books
    .select(["color", "price", "category"])
    .where_eq("color", "red")
    .where_eq("availability", true)
    .group_by("category")
    .order_by_dir("price", SortDir::Desc)
    .limit(5)
    .get()
    .await?;
  println!("{}", response.query());
  println!("{}", response.to_json(true)?);

  // Edit a single document
  let mut book = books.find("1").await?;
  book.set("price", 3);
  book.save().await?;

  // Transaction
  books.begin_transaction().await?;
  books.update("1", json!({"price": 4})).await?;
  books.update("2", "price = 5").await?;
  books.commit().await?;

  Ok(())
}
