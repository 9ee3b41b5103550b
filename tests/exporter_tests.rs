// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde_json::json;
use tempfile::tempdir;
use walletwise::commands::{App, exporter};
use walletwise::config::Settings;
use walletwise::session::NewTransaction;
use walletwise::store::{Collection, DocumentStore, SqliteStore};
use walletwise::{cli, utils::parse_month};

fn seeded_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory("me").unwrap();
    let mut tx = NewTransaction::expense(Decimal::from(45_000), "Food");
    tx.date = Some(chrono::NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    tx.note = Some("Phở".into());
    tx.source = Some("cash".into());
    store
        .add(Collection::Transactions, tx.into_fields())
        .unwrap();
    store
}

fn run_export(store: &SqliteStore, format: &str, out: &str) {
    let settings = Settings::default();
    let app = App {
        store,
        settings: &settings,
        now: parse_month("2025-01").unwrap(),
    };
    let matches = cli::build_cli().get_matches_from([
        "walletwise",
        "export",
        "transactions",
        "--format",
        format,
        "--out",
        out,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&app, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_transactions_writes_pretty_json() {
    let store = seeded_store();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    run_export(&store, "json", &out_path.to_string_lossy());

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let item = &parsed[0];
    assert_eq!(item["date"], json!("2025-01-02 00:00:00"));
    assert_eq!(item["type"], json!("expense"));
    assert_eq!(item["amount"], json!("45000"));
    assert_eq!(item["category"], json!("Food"));
    assert_eq!(item["source"], json!("cash"));
    assert_eq!(item["note"], json!("Phở"));
}

#[test]
fn export_transactions_writes_csv_header_and_rows() {
    let store = seeded_store();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    run_export(&store, "csv", &out_path.to_string_lossy());

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["id", "date", "type", "amount", "category", "source", "note"]
    );
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][3], "45000");
}

#[test]
fn export_transactions_rejects_unknown_format() {
    let res = cli::build_cli().try_get_matches_from([
        "walletwise",
        "export",
        "transactions",
        "--format",
        "xml",
        "--out",
        "ignored",
    ]);
    assert!(res.is_err());
}
