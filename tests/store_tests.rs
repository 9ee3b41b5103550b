// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OpenFlags};
use tempfile::tempdir;
use walletwise::store::{Collection, DocumentStore, Fields, SqliteStore, StoreError};

#[test]
fn read_only_database_maps_to_permission_denied() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ro.sqlite");
    {
        let store = SqliteStore::new(Connection::open(&path).unwrap(), "me").unwrap();
        store.add(Collection::Sources, Fields::new()).unwrap();
    }
    let ro = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
    let raw = ro
        .execute(
            "INSERT INTO documents(namespace, collection, id, data) VALUES ('me','sources','x','{}')",
            [],
        )
        .unwrap_err();
    let err = StoreError::from(raw);
    assert_eq!(err.code(), "permission-denied");
    assert_eq!(
        err.user_message(),
        "You don't have permission to change this data."
    );
}

#[test]
fn documents_survive_reopen_in_arrival_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("docs.sqlite");
    let ids: Vec<String> = {
        let store = SqliteStore::new(Connection::open(&path).unwrap(), "me").unwrap();
        (0..3)
            .map(|_| store.add(Collection::Notes, Fields::new()).unwrap())
            .collect()
    };
    let store = SqliteStore::new(Connection::open(&path).unwrap(), "me").unwrap();
    let listed: Vec<String> = store
        .list(Collection::Notes)
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(listed, ids);

    let other = SqliteStore::new(Connection::open(&path).unwrap(), "someone-else").unwrap();
    assert!(other.list(Collection::Notes).unwrap().is_empty());
}
