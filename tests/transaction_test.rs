//! Transaction sequencing tests for the Clusterpoint Rust SDK.

mod common;

use clusterpoint::{Error, TransportFailure};
use common::{client, MockTransport};
use serde_json::json;

#[tokio::test]
async fn test_begin_update_commit() {
  let mock = MockTransport::new();
  mock.reply(200, json!({"transaction_id": "tx-42"}));
  let mut books = client(&mock).database("shop").collection("books");

  books.begin_transaction().await.unwrap();
  assert_eq!(books.transaction_id(), Some("tx-42"));

  books.update("1", json!({"price": 2})).await.unwrap();
  books.update("2", json!({"price": 3})).await.unwrap();
  books.commit().await.unwrap();
  assert!(!books.in_transaction());

  let requests = mock.requests();
  assert_eq!(requests.len(), 4);
  assert_eq!(requests[0].body.as_deref(), Some("BEGIN_TRANSACTION"));
  assert_eq!(requests[0].descriptor.path, "/v4/100/shop.books/_query");
  assert_eq!(requests[1].descriptor.path, "/v4/100/shop.books/_query?transaction_id=tx-42");
  assert_eq!(requests[2].descriptor.path, "/v4/100/shop.books/_query?transaction_id=tx-42");
  assert_eq!(requests[3].body.as_deref(), Some("COMMIT"));
  assert_eq!(requests[3].descriptor.path, "/v4/100/shop.books/_query?transaction_id=tx-42");

  // back to plain requests
  books.get().await.unwrap();
  assert_eq!(mock.last().descriptor.path, "/v4/100/shop.books/_query");
}

#[tokio::test]
async fn test_failed_begin_leaves_no_transaction() {
  let mock = MockTransport::new();
  mock.reply(500, json!({"error": [{"message": "Internal error"}]}));
  let mut books = client(&mock).database("shop").collection("books");

  assert!(books.begin_transaction().await.is_err());
  assert!(!books.in_transaction());
}

#[tokio::test]
async fn test_begin_without_token_is_an_error() {
  let mock = MockTransport::new();
  mock.reply(200, json!({"results": []}));
  let mut books = client(&mock).database("shop").collection("books");

  let err = books.begin_transaction().await.unwrap_err();
  assert!(matches!(err, Error::Transaction(_)));
  assert!(!books.in_transaction());
}

#[tokio::test]
async fn test_begin_twice_is_rejected_without_request() {
  let mock = MockTransport::new();
  mock.reply(200, json!({"transaction_id": "tx-1"}));
  let mut books = client(&mock).database("shop").collection("books");

  books.begin_transaction().await.unwrap();
  let err = books.begin_transaction().await.unwrap_err();
  assert!(matches!(err, Error::Transaction(_)));
  assert_eq!(mock.requests().len(), 1);
  assert_eq!(books.transaction_id(), Some("tx-1"));
}

#[tokio::test]
async fn test_commit_without_transaction_is_rejected() {
  let mock = MockTransport::new();
  let mut books = client(&mock).database("shop").collection("books");

  assert!(matches!(books.commit().await, Err(Error::Transaction(_))));
  assert!(matches!(books.rollback().await, Err(Error::Transaction(_))));
  assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_failed_commit_keeps_transaction_open() {
  let mock = MockTransport::new();
  mock.reply(200, json!({"transaction_id": "tx-9"}));
  mock.fail(TransportFailure::Connection("connection reset".to_string()));
  let mut books = client(&mock).database("shop").collection("books");

  books.begin_transaction().await.unwrap();
  let err = books.commit().await.unwrap_err();
  assert!(matches!(err, Error::Transport { .. }));
  assert_eq!(books.transaction_id(), Some("tx-9"));

  books.rollback().await.unwrap();
  assert!(!books.in_transaction());
  assert_eq!(mock.last().body.as_deref(), Some("ROLLBACK"));
}

#[tokio::test]
async fn test_commit_clears_token_whatever_the_reply_says() {
  let mock = MockTransport::new();
  mock.reply(200, json!({"transaction_id": "tx-3"}));
  mock.reply(200, json!({"transaction_id": "tx-3", "results": []}));
  let mut books = client(&mock).database("shop").collection("books");

  books.begin_transaction().await.unwrap();
  books.commit().await.unwrap();
  assert_eq!(books.transaction_id(), None);
}

#[tokio::test]
async fn test_transactions_are_scoped_to_the_handle() {
  let mock = MockTransport::new();
  let db = client(&mock).database("shop");
  let mut first = db.collection("books");
  let mut second = db.collection("books");

  mock.reply(200, json!({"transaction_id": "A"}));
  mock.reply(200, json!({"transaction_id": "B"}));
  first.begin_transaction().await.unwrap();
  second.begin_transaction().await.unwrap();

  // first handle updates fine, second collides on the same document
  mock.reply(200, json!({"results": [{"_id": "1"}]}));
  mock.reply(
    409,
    json!({"error": [{"message": "Transaction conflict", "code": 2501}]}),
  );
  first.update("1", json!({"price": 10})).await.unwrap();
  let err = second.update("1", json!({"price": 20})).await.unwrap_err();
  assert_eq!(err.status(), Some(409));
  assert!(err.request().unwrap().path.ends_with("?transaction_id=B"));
  assert_eq!(err.payload(), Some(r#"UPDATE books["1"] SET price = 20"#));

  first.rollback().await.unwrap();
  second.rollback().await.unwrap();
  assert!(!first.in_transaction());
  assert!(!second.in_transaction());

  let paths: Vec<String> = mock
    .requests()
    .iter()
    .map(|r| r.descriptor.path.clone())
    .collect();
  assert!(paths[2].ends_with("?transaction_id=A"));
  assert!(paths[4].ends_with("?transaction_id=A"));
  assert!(paths[5].ends_with("?transaction_id=B"));

  // a third handle never saw either transaction
  let mut third = db.collection("books");
  third.get().await.unwrap();
  assert!(!mock.last().descriptor.path.contains("transaction_id"));
}
