//! Capture of request/response snapshots for troubleshooting.
//!
//! Scopes form a tree mirroring client -> databases -> collections. A child
//! starts with its parent's switch; switching a scope switches every live
//! scope below it. Parents only hold weak links to children, so dropped
//! handles are released; a child keeps its parent alive. Entries go to one
//! append-only sink shared by the whole tree and stay readable after the
//! recording handle is gone.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::transport::RequestDescriptor;

/// Snapshot of one dispatched request.
#[derive(Debug, Clone, Serialize)]
pub struct DebugEntry {
  pub id: Uuid,
  pub datetime: DateTime<Local>,
  pub query: String,
  pub raw_response: String,
  /// `None` when the transport failed before a status arrived.
  pub status: Option<u16>,
  pub request: RequestDescriptor,
}

impl DebugEntry {
  pub fn new(
    query: impl Into<String>,
    raw_response: impl Into<String>,
    status: Option<u16>,
    request: RequestDescriptor,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      datetime: Local::now(),
      query: query.into(),
      raw_response: raw_response.into(),
      status,
      request,
    }
  }
}

/// Append-only log shared by every scope of one client.
#[derive(Debug, Default)]
struct DebugSink {
  entries: Mutex<Vec<(Vec<u64>, DebugEntry)>>,
  next_scope: AtomicU64,
}

#[derive(Debug)]
pub struct DebugScope {
  /// Ids of the ancestors and of this scope, root first.
  lineage: Vec<u64>,
  enabled: AtomicBool,
  sink: Arc<DebugSink>,
  /// Keeps the path to the root alive while this scope is held.
  _parent: Option<Arc<DebugScope>>,
  children: Mutex<Vec<Weak<DebugScope>>>,
}

impl DebugScope {
  pub fn root(enabled: bool) -> Arc<Self> {
    let sink = Arc::new(DebugSink::default());
    let id = sink.next_scope.fetch_add(1, Ordering::Relaxed);
    Arc::new(Self {
      lineage: vec![id],
      enabled: AtomicBool::new(enabled),
      sink,
      _parent: None,
      children: Mutex::new(Vec::new()),
    })
  }

  /// New scope below this one, starting with this scope's switch.
  pub fn child(self: &Arc<Self>) -> Arc<Self> {
    let id = self.sink.next_scope.fetch_add(1, Ordering::Relaxed);
    let mut lineage = self.lineage.clone();
    lineage.push(id);
    let child = Arc::new(Self {
      lineage,
      enabled: AtomicBool::new(self.is_enabled()),
      sink: Arc::clone(&self.sink),
      _parent: Some(Arc::clone(self)),
      children: Mutex::new(Vec::new()),
    });

    let mut children = self.children.lock();
    children.retain(|c| c.strong_count() > 0);
    children.push(Arc::downgrade(&child));
    child
  }

  fn id(&self) -> u64 {
    self.lineage[self.lineage.len() - 1]
  }

  /// Scopes directly below this one that are still held by a handle.
  pub fn live_children(&self) -> usize {
    let mut children = self.children.lock();
    children.retain(|c| c.strong_count() > 0);
    children.len()
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled.load(Ordering::Acquire)
  }

  /// Switch this scope and every live scope below it.
  pub fn set_enabled(&self, enabled: bool) {
    self.enabled.store(enabled, Ordering::Release);
    let live: Vec<Arc<DebugScope>> = {
      let mut children = self.children.lock();
      children.retain(|c| c.strong_count() > 0);
      children.iter().filter_map(Weak::upgrade).collect()
    };
    for child in live {
      child.set_enabled(enabled);
    }
  }

  /// Append an entry if capture is on. Returns whether it was kept.
  pub fn record(&self, entry: DebugEntry) -> bool {
    if !self.is_enabled() {
      return false;
    }
    self.sink.entries.lock().push((self.lineage.clone(), entry));
    true
  }

  /// Entries recorded by this scope or any scope below it, oldest first.
  /// Entries outlive the handles that recorded them.
  pub fn entries(&self) -> Vec<DebugEntry> {
    let id = self.id();
    self.sink
      .entries
      .lock()
      .iter()
      .filter(|(lineage, _)| lineage.contains(&id))
      .map(|(_, entry)| entry.clone())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::transport::Method;

  fn descriptor() -> RequestDescriptor {
    RequestDescriptor {
      method: Method::Post,
      host: "localhost".to_string(),
      port: 443,
      path: "/v4/1/db.coll/_query".to_string(),
      username: "user".to_string(),
      headers: Vec::new(),
    }
  }

  #[test]
  fn test_child_inherits_switch() {
    let root = DebugScope::root(true);
    let child = root.child();
    assert!(child.is_enabled());

    root.set_enabled(false);
    assert!(!child.is_enabled());

    child.set_enabled(true);
    assert!(!root.is_enabled());
    assert!(child.is_enabled());
  }

  #[test]
  fn test_entries_collected_top_down() {
    let root = DebugScope::root(true);
    let db = root.child();
    let first = db.child();
    let second = db.child();

    assert!(first.record(DebugEntry::new("q1", "{}", Some(200), descriptor())));
    assert!(second.record(DebugEntry::new("q2", "{}", Some(400), descriptor())));
    second.set_enabled(false);
    assert!(!second.record(DebugEntry::new("q3", "{}", Some(200), descriptor())));

    let queries: Vec<String> = root.entries().into_iter().map(|e| e.query).collect();
    assert_eq!(queries, vec!["q1", "q2"]);
    assert_eq!(first.entries().len(), 1);
  }

  #[test]
  fn test_dropped_handles_are_released() {
    let root = DebugScope::root(false);
    for _ in 0..10_000 {
      let db = root.child();
      drop(db.child());
      drop(db);
    }
    assert_eq!(root.live_children(), 0);
    assert!(root.children.lock().len() <= 1);

    let kept = root.child();
    let _collection = kept.child();
    assert_eq!(root.live_children(), 1);
    assert_eq!(kept.live_children(), 1);
  }

  #[test]
  fn test_entries_survive_dropped_scope() {
    let root = DebugScope::root(true);
    {
      let db = root.child();
      let collection = db.child();
      assert!(collection.record(DebugEntry::new("q1", "{}", Some(200), descriptor())));
    }
    assert_eq!(root.live_children(), 0);
    let entries = root.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].query, "q1");
  }

  #[test]
  fn test_switch_reaches_scope_whose_parent_handle_dropped() {
    let root = DebugScope::root(true);
    let collection = {
      let db = root.child();
      db.child()
    };
    assert_eq!(root.live_children(), 1);

    root.set_enabled(false);
    assert!(!collection.is_enabled());

    drop(collection);
    assert_eq!(root.live_children(), 0);
  }
}
