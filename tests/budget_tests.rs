// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde_json::json;
use walletwise::commands::{App, budgets};
use walletwise::config::Settings;
use walletwise::models::BudgetStatus;
use walletwise::session::{Dashboard, budget_fields};
use walletwise::store::{Collection, DocumentStore, Fields, SqliteStore};
use walletwise::normalize::WalletTransferRule;
use walletwise::{cli, utils::parse_month};

fn fields(v: serde_json::Value) -> Fields {
    v.as_object().cloned().unwrap()
}

fn setup() -> SqliteStore {
    let store = SqliteStore::open_in_memory("me").unwrap();
    // loosely-typed documents, as another client might have written them
    store
        .add(
            Collection::Transactions,
            fields(json!({"amount": 1000000, "type": "expense", "category": "Food", "createdAt": "2024-03-05"})),
        )
        .unwrap();
    store
        .add(
            Collection::Transactions,
            fields(json!({"amount": "500000", "type": "expense", "category": "Food ", "createdAt": "2024-03-20T08:15:00+07:00"})),
        )
        .unwrap();
    store
        .add(
            Collection::Transactions,
            fields(json!({"amount": 9, "type": "expense", "category": "Food", "createdAt": {"bogus": true}})),
        )
        .unwrap();
    store
        .add(
            Collection::Transactions,
            fields(json!({"amount": 3000000, "type": "expense", "category": "Withdrawal", "source": "binance", "createdAt": "2024-03-07"})),
        )
        .unwrap();
    store
}

#[test]
fn food_budget_reaches_danger() {
    let store = setup();
    store
        .add(
            Collection::Budgets,
            budget_fields("Food", parse_month("2024-03").unwrap(), Decimal::from(1_200_000)),
        )
        .unwrap();
    let dash = Dashboard::attach(
        &store,
        parse_month("2024-03").unwrap(),
        Box::new(WalletTransferRule::default()),
    )
    .unwrap();
    let p = &dash.progress()[0];
    assert_eq!(p.spent, Decimal::from(1_500_000));
    assert_eq!(p.status, BudgetStatus::Danger);
    assert_eq!(p.overspent, Decimal::from(300_000));
    assert_eq!(p.percent, Some(Decimal::from(125)));
}

#[test]
fn withdrawal_budget_ignores_internal_transfers_but_trend_keeps_them() {
    let store = setup();
    store
        .add(
            Collection::Budgets,
            budget_fields("Withdrawal", parse_month("2024-03").unwrap(), Decimal::from(100)),
        )
        .unwrap();
    let dash = Dashboard::attach(
        &store,
        parse_month("2024-03").unwrap(),
        Box::new(WalletTransferRule::default()),
    )
    .unwrap();
    assert_eq!(dash.progress()[0].spent, Decimal::ZERO);
    let trend = dash.trend(walletwise::trend::TrendRange::All);
    assert_eq!(trend.total, Decimal::from(4_500_000));
    assert_eq!(dash.summary(parse_month("2024-03").unwrap()).expense, Decimal::from(1_500_000));
}

#[test]
fn set_rejects_non_positive_limit() {
    let store = setup();
    let settings = Settings::default();
    let app = App {
        store: &store,
        settings: &settings,
        now: parse_month("2024-03").unwrap(),
    };
    let matches = cli::build_cli().get_matches_from([
        "walletwise", "budget", "set", "--category", "Food", "--month", "2024-03", "--limit", "0",
    ]);
    let Some(("budget", budget_m)) = matches.subcommand() else {
        panic!("no budget subcommand")
    };
    let err = budgets::handle(&app, budget_m).unwrap_err();
    assert!(err.to_string().contains("must be positive"));
    assert!(store.list(Collection::Budgets).unwrap().is_empty());
}

#[test]
fn set_stores_normalized_budget() {
    let store = setup();
    let settings = Settings::default();
    let app = App {
        store: &store,
        settings: &settings,
        now: parse_month("2024-03").unwrap(),
    };
    let matches = cli::build_cli().get_matches_from([
        "walletwise", "budget", "set", "--category", "  ", "--month", "2024-04", "--limit", "250000",
    ]);
    let Some(("budget", budget_m)) = matches.subcommand() else {
        panic!("no budget subcommand")
    };
    budgets::handle(&app, budget_m).unwrap();
    let docs = store.list(Collection::Budgets).unwrap();
    assert_eq!(docs[0].data["category"], json!("Uncategorized"));
    assert_eq!(docs[0].data["month"], json!("2024-04"));
    assert_eq!(docs[0].data["limitAmount"], json!("250000"));
}

#[test]
fn extreme_store_values_still_render() {
    let store = SqliteStore::open_in_memory("me").unwrap();
    for amount in [json!(1_000_000_000), json!("79228162514264337593543950335"), json!("79228162514264337593543950335")] {
        store
            .add(
                Collection::Transactions,
                fields(json!({"amount": amount, "type": "expense", "category": "Food", "createdAt": "2024-03-05"})),
            )
            .unwrap();
    }
    store
        .add(
            Collection::Budgets,
            fields(json!({"category": "Food", "month": "2024-03", "limitAmount": "0.0000000000000000000001"})),
        )
        .unwrap();
    let dash = Dashboard::attach(
        &store,
        parse_month("2024-03").unwrap(),
        Box::new(WalletTransferRule::default()),
    )
    .unwrap();
    let p = &dash.progress()[0];
    assert_eq!(p.status, BudgetStatus::Danger);
    assert_eq!(p.spent, Decimal::MAX);
    assert_eq!(p.percent, None);
    assert_eq!(dash.active_alerts().len(), 1);
    assert_eq!(dash.trend(walletwise::trend::TrendRange::All).total, Decimal::MAX);
}
