// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! User-scoped document collections with push-based change notification.
//!
//! Every notification carries the complete current list of a collection,
//! never a diff.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

pub type Fields = Map<String, Value>;
pub type Listener = Box<dyn FnMut(&[Document])>;

const SERVER_VALUE_KEY: &str = ".sv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Transactions,
    Budgets,
    Sources,
    Notes,
    Tasks,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Transactions => "transactions",
            Collection::Budgets => "budgets",
            Collection::Sources => "sources",
            Collection::Notes => "notes",
            Collection::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not authenticated")]
    Unauthenticated,
    #[error("document '{id}' not found in {collection}")]
    NotFound { collection: Collection, id: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Backend(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ReadOnly)
            | Some(ErrorCode::PermissionDenied)
            | Some(ErrorCode::AuthorizationForStatementDenied) => {
                StoreError::PermissionDenied(err.to_string())
            }
            Some(ErrorCode::CannotOpen)
            | Some(ErrorCode::DatabaseBusy)
            | Some(ErrorCode::DatabaseLocked)
            | Some(ErrorCode::SystemIoFailure) => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Backend(err),
        }
    }
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::PermissionDenied(_) => "permission-denied",
            StoreError::Unauthenticated => "unauthenticated",
            StoreError::NotFound { .. } => "not-found",
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Serialization(_) => "invalid-argument",
            StoreError::Backend(_) => "internal",
        }
    }

    /// Message shown next to the action that failed.
    pub fn user_message(&self) -> &'static str {
        match self.code() {
            "permission-denied" => "You don't have permission to change this data.",
            "unauthenticated" => "Your session has expired. Sign in again to save changes.",
            "not-found" => "This item no longer exists.",
            _ => "Could not save changes. Please try again.",
        }
    }
}

/// Placeholder field value the store replaces with its own clock on write.
pub fn server_timestamp() -> Value {
    let mut m = Map::new();
    m.insert(SERVER_VALUE_KEY.to_string(), Value::from("timestamp"));
    Value::Object(m)
}

fn is_server_timestamp(v: &Value) -> bool {
    v.as_object()
        .and_then(|o| o.get(SERVER_VALUE_KEY))
        .and_then(Value::as_str)
        == Some("timestamp")
}

fn resolve_server_values(fields: &mut Fields) {
    let now = Utc::now();
    for v in fields.values_mut() {
        if is_server_timestamp(v) {
            *v = json!({
                "seconds": now.timestamp(),
                "nanoseconds": now.timestamp_subsec_nanos(),
            });
        }
    }
}

pub trait DocumentStore {
    /// Register `on_change`; it fires once right away with the current list and
    /// again after every change to `collection`.
    fn subscribe(&self, collection: Collection, on_change: Listener)
    -> Result<Subscription, StoreError>;
    fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;
    fn add(&self, collection: Collection, fields: Fields) -> Result<String, StoreError>;
    fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<(), StoreError>;
    fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

type SharedListener = Rc<RefCell<Listener>>;

#[derive(Default)]
struct Registry {
    next_key: u64,
    listeners: Vec<(u64, Collection, SharedListener)>,
}

/// Keeps a listener registered until dropped or unsubscribed.
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    key: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reg) = self.registry.upgrade() {
            reg.borrow_mut().listeners.retain(|(k, _, _)| *k != self.key);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}

/// Document store persisted in the `documents` table of a SQLite database.
pub struct SqliteStore {
    conn: Connection,
    namespace: String,
    registry: Rc<RefCell<Registry>>,
}

impl SqliteStore {
    /// `namespace` is the signed-in user; an empty one means nobody is signed in.
    pub fn new(conn: Connection, namespace: &str) -> Result<Self, StoreError> {
        crate::db::init_schema(&conn)?;
        Ok(Self {
            conn,
            namespace: namespace.trim().to_string(),
            registry: Rc::new(RefCell::new(Registry::default())),
        })
    }

    pub fn open_in_memory(namespace: &str) -> Result<Self, StoreError> {
        Self::new(Connection::open_in_memory()?, namespace)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn require_principal(&self) -> Result<(), StoreError> {
        if self.namespace.is_empty() {
            return Err(StoreError::Unauthenticated);
        }
        Ok(())
    }

    fn notify(&self, collection: Collection) {
        let targets: Vec<SharedListener> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .filter(|(_, c, _)| *c == collection)
            .map(|(_, _, l)| Rc::clone(l))
            .collect();
        if targets.is_empty() {
            return;
        }
        let snapshot = match self.list(collection) {
            Ok(s) => s,
            Err(err) => {
                warn!(%collection, error = %err, "could not load snapshot for listeners");
                return;
            }
        };
        for listener in targets {
            match listener.try_borrow_mut() {
                Ok(mut cb) => (&mut **cb)(&snapshot),
                Err(_) => debug!(%collection, "listener still running, not re-entered"),
            }
        }
    }
}

impl DocumentStore for SqliteStore {
    fn subscribe(
        &self,
        collection: Collection,
        on_change: Listener,
    ) -> Result<Subscription, StoreError> {
        let initial = self.list(collection)?;
        let listener: SharedListener = Rc::new(RefCell::new(on_change));
        let key = {
            let mut reg = self.registry.borrow_mut();
            let key = reg.next_key;
            reg.next_key += 1;
            reg.listeners.push((key, collection, Rc::clone(&listener)));
            key
        };
        {
            let mut cb = listener.borrow_mut();
            (&mut **cb)(&initial);
        }
        Ok(Subscription {
            registry: Rc::downgrade(&self.registry),
            key,
        })
    }

    fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, data FROM documents WHERE namespace=?1 AND collection=?2 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![self.namespace, collection.as_str()], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        let mut docs = Vec::new();
        for row in rows {
            let (id, raw) = row?;
            match serde_json::from_str::<Fields>(&raw) {
                Ok(data) => docs.push(Document { id, data }),
                Err(err) => debug!(%id, error = %err, "skipping unreadable document"),
            }
        }
        Ok(docs)
    }

    fn add(&self, collection: Collection, mut fields: Fields) -> Result<String, StoreError> {
        self.require_principal()?;
        resolve_server_values(&mut fields);
        let id = uuid::Uuid::new_v4().to_string();
        let data = serde_json::to_string(&fields)?;
        self.conn.execute(
            "INSERT INTO documents(namespace, collection, id, data) VALUES (?1,?2,?3,?4)",
            params![self.namespace, collection.as_str(), id, data],
        )?;
        info!(%collection, %id, "document added");
        self.notify(collection);
        Ok(id)
    }

    fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.require_principal()?;
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE namespace=?1 AND collection=?2 AND id=?3",
                params![self.namespace, collection.as_str(), id],
                |r| r.get(0),
            )
            .optional()?;
        let Some(raw) = existing else {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        };
        let mut merged: Fields = serde_json::from_str(&raw)?;
        merged.extend(fields);
        resolve_server_values(&mut merged);
        self.conn.execute(
            "UPDATE documents SET data=?4 WHERE namespace=?1 AND collection=?2 AND id=?3",
            params![
                self.namespace,
                collection.as_str(),
                id,
                serde_json::to_string(&merged)?
            ],
        )?;
        info!(%collection, %id, "document updated");
        self.notify(collection);
        Ok(())
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.require_principal()?;
        let n = self.conn.execute(
            "DELETE FROM documents WHERE namespace=?1 AND collection=?2 AND id=?3",
            params![self.namespace, collection.as_str(), id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        info!(%collection, %id, "document deleted");
        self.notify(collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn subscribe_fires_initially_and_on_every_change() {
        let store = SqliteStore::open_in_memory("alice").unwrap();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let sub = store
            .subscribe(
                Collection::Budgets,
                Box::new(move |docs: &[Document]| sink.borrow_mut().push(docs.len())),
            )
            .unwrap();

        let id = store
            .add(Collection::Budgets, fields(json!({"category": "Food"})))
            .unwrap();
        store
            .update(Collection::Budgets, &id, fields(json!({"limitAmount": 10})))
            .unwrap();
        // other collections do not reach this listener
        store
            .add(Collection::Transactions, fields(json!({"amount": 1})))
            .unwrap();
        store.delete(Collection::Budgets, &id).unwrap();
        assert_eq!(*seen.borrow(), vec![0, 1, 1, 0]);

        sub.unsubscribe();
        store
            .add(Collection::Budgets, fields(json!({"category": "Rent"})))
            .unwrap();
        assert_eq!(seen.borrow().len(), 4);
    }

    #[test]
    fn update_merges_and_resolves_server_timestamp() {
        let store = SqliteStore::open_in_memory("alice").unwrap();
        let id = store
            .add(
                Collection::Transactions,
                fields(json!({"amount": 5, "note": "x", "createdAt": server_timestamp()})),
            )
            .unwrap();
        store
            .update(Collection::Transactions, &id, fields(json!({"note": "y"})))
            .unwrap();
        let docs = store.list(Collection::Transactions).unwrap();
        assert_eq!(docs[0].data["amount"], json!(5));
        assert_eq!(docs[0].data["note"], json!("y"));
        assert!(docs[0].data["createdAt"]["seconds"].is_i64());
    }

    #[test]
    fn namespaces_are_isolated_and_writes_need_a_principal() {
        let store = SqliteStore::open_in_memory("").unwrap();
        let err = store
            .add(Collection::Budgets, Fields::new())
            .unwrap_err();
        assert_eq!(err.code(), "unauthenticated");

        let store = SqliteStore::open_in_memory("bob").unwrap();
        let err = store.delete(Collection::Budgets, "missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(err.user_message(), "This item no longer exists.");
    }
}
