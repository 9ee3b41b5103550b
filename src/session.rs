// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Live view models over the store.
//!
//! A [`Dashboard`] subscribes to the transactions, budgets and sources
//! collections and recomputes budget progress and alerts whenever any of them
//! delivers a new snapshot. Collections may update in any order relative to
//! each other; each snapshot simply replaces the previous one.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::aggregate::{
    MonthlySummary, SourceBalance, aggregate_by_category_month_with, monthly_summary,
    source_balances,
};
use crate::alerts::AlertTracker;
use crate::budget::evaluate;
use crate::models::{Budget, BudgetProgress, MoneySource, MonthKey, Transaction, TxKind};
use crate::normalize::{
    TransferDetector, budgets_from_snapshot, normalize_category, sources_from_snapshot,
    transactions_from_snapshot,
};
use crate::store::{Collection, Document, DocumentStore, Fields, StoreError, Subscription, server_timestamp};
use crate::trend::{TrendRange, TrendSummary, compute_trend};

struct DashboardState {
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
    sources: Vec<MoneySource>,
    current_month: MonthKey,
    progress: Vec<BudgetProgress>,
    alerts: AlertTracker,
    detector: Box<dyn TransferDetector>,
    revision: u64,
}

impl DashboardState {
    fn recompute(&mut self) {
        let totals = aggregate_by_category_month_with(&self.transactions, self.detector.as_ref());
        self.progress = evaluate(&self.budgets, &totals, self.current_month);
        self.alerts.reconcile(&self.progress);
        self.revision += 1;
        debug!(
            revision = self.revision,
            budgets = self.progress.len(),
            "recomputed budget progress"
        );
    }
}

pub struct Dashboard {
    state: Rc<RefCell<DashboardState>>,
    _subscriptions: Vec<Subscription>,
}

impl Dashboard {
    pub fn attach(
        store: &dyn DocumentStore,
        current_month: MonthKey,
        detector: Box<dyn TransferDetector>,
    ) -> Result<Self, StoreError> {
        let state = Rc::new(RefCell::new(DashboardState {
            transactions: Vec::new(),
            budgets: Vec::new(),
            sources: Vec::new(),
            current_month,
            progress: Vec::new(),
            alerts: AlertTracker::new(),
            detector,
            revision: 0,
        }));

        let tx_state = Rc::clone(&state);
        let budget_state = Rc::clone(&state);
        let source_state = Rc::clone(&state);
        let subscriptions = vec![
            store.subscribe(
                Collection::Transactions,
                Box::new(move |docs: &[Document]| {
                    let mut s = tx_state.borrow_mut();
                    s.transactions = transactions_from_snapshot(docs);
                    s.recompute();
                }),
            )?,
            store.subscribe(
                Collection::Budgets,
                Box::new(move |docs: &[Document]| {
                    let mut s = budget_state.borrow_mut();
                    s.budgets = budgets_from_snapshot(docs);
                    s.recompute();
                }),
            )?,
            store.subscribe(
                Collection::Sources,
                Box::new(move |docs: &[Document]| {
                    source_state.borrow_mut().sources = sources_from_snapshot(docs);
                }),
            )?,
        ];
        Ok(Self {
            state,
            _subscriptions: subscriptions,
        })
    }

    /// Number of recomputations so far.
    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    pub fn current_month(&self) -> MonthKey {
        self.state.borrow().current_month
    }

    pub fn set_current_month(&self, month: MonthKey) {
        let mut s = self.state.borrow_mut();
        if s.current_month != month {
            s.current_month = month;
            s.recompute();
        }
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.borrow().transactions.clone()
    }

    pub fn budgets(&self) -> Vec<Budget> {
        self.state.borrow().budgets.clone()
    }

    pub fn progress(&self) -> Vec<BudgetProgress> {
        self.state.borrow().progress.clone()
    }

    pub fn active_alerts(&self) -> Vec<BudgetProgress> {
        let s = self.state.borrow();
        s.alerts
            .active_alerts(&s.progress)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn dismiss(&self, budget_id: &str) {
        self.state.borrow_mut().alerts.dismiss(budget_id);
    }

    pub fn is_dismissed(&self, budget_id: &str) -> bool {
        self.state.borrow().alerts.is_dismissed(budget_id)
    }

    pub fn error_for(&self, budget_id: &str) -> Option<String> {
        self.state
            .borrow()
            .alerts
            .error_for(budget_id)
            .map(str::to_string)
    }

    pub fn trend(&self, range: TrendRange) -> TrendSummary {
        compute_trend(&self.state.borrow().transactions, range)
    }

    pub fn summary(&self, month: MonthKey) -> MonthlySummary {
        let s = self.state.borrow();
        monthly_summary(&s.transactions, month, s.detector.as_ref())
    }

    pub fn balances(&self) -> Vec<SourceBalance> {
        let s = self.state.borrow();
        source_balances(&s.sources, &s.transactions)
    }

    /// Change a budget limit optimistically. When the write fails the previous
    /// limit is restored and the message is kept for that budget.
    pub fn update_budget_limit(
        &self,
        store: &dyn DocumentStore,
        budget_id: &str,
        limit: Decimal,
    ) -> Result<(), StoreError> {
        let previous = {
            let mut s = self.state.borrow_mut();
            let Some(b) = s.budgets.iter_mut().find(|b| b.id == budget_id) else {
                return Err(StoreError::NotFound {
                    collection: Collection::Budgets,
                    id: budget_id.to_string(),
                });
            };
            let previous = b.limit_amount;
            b.limit_amount = limit;
            s.alerts.clear_error(budget_id);
            s.recompute();
            previous
        };

        let mut fields = Fields::new();
        fields.insert("limitAmount".into(), decimal_value(&limit));
        fields.insert("updatedAt".into(), server_timestamp());
        match store.update(Collection::Budgets, budget_id, fields) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(%budget_id, code = err.code(), error = %err, "budget update failed, rolling back");
                let mut s = self.state.borrow_mut();
                if let Some(b) = s.budgets.iter_mut().find(|b| b.id == budget_id) {
                    b.limit_amount = previous;
                }
                s.recompute();
                s.alerts.record_error(budget_id, err.user_message());
                Err(err)
            }
        }
    }
}

pub fn decimal_value(d: &Decimal) -> Value {
    Value::String(d.normalize().to_string())
}

/// Fields of a transaction about to be added.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub kind: TxKind,
    pub category: Option<String>,
    pub note: Option<String>,
    pub source: Option<String>,
    /// Picked by the user; `None` lets the store assign the time.
    pub date: Option<NaiveDate>,
}

impl NewTransaction {
    pub fn expense(amount: Decimal, category: &str) -> Self {
        Self {
            amount,
            kind: TxKind::Expense,
            category: Some(category.to_string()),
            note: None,
            source: None,
            date: None,
        }
    }

    pub fn into_fields(self) -> Fields {
        let mut f = Fields::new();
        f.insert("amount".into(), decimal_value(&self.amount));
        f.insert("type".into(), json!(self.kind.as_str()));
        f.insert(
            "category".into(),
            json!(normalize_category(self.category.as_deref())),
        );
        if let Some(note) = self.note.filter(|n| !n.trim().is_empty()) {
            f.insert("note".into(), json!(note.trim()));
        }
        if let Some(source) = self.source.filter(|s| !s.trim().is_empty()) {
            f.insert("source".into(), json!(source.trim()));
        }
        let created = match self.date.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            Some(dt) => json!(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => server_timestamp(),
        };
        f.insert("createdAt".into(), created);
        f
    }
}

pub fn budget_fields(category: &str, month: MonthKey, limit: Decimal) -> Fields {
    let mut f = Fields::new();
    f.insert("category".into(), json!(normalize_category(Some(category))));
    f.insert("month".into(), json!(month.to_string()));
    f.insert("limitAmount".into(), decimal_value(&limit));
    f
}

pub fn source_fields(key: &str, name: &str, initial_balance: Decimal) -> Fields {
    let mut f = Fields::new();
    f.insert("key".into(), json!(key.trim()));
    f.insert("name".into(), json!(name.trim()));
    f.insert("initialBalance".into(), decimal_value(&initial_balance));
    f
}

/// Money sources offered by the "seed defaults" action.
pub const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("cash", "Cash"),
    ("vcb", "Vietcombank"),
    ("tcb", "Techcombank"),
    ("momo", "MoMo"),
    ("binance", "Binance"),
];

/// Add every default source whose key is not present yet. Returns the keys added.
pub fn seed_default_sources(store: &dyn DocumentStore) -> Result<Vec<String>, StoreError> {
    let existing = sources_from_snapshot(&store.list(Collection::Sources)?);
    let mut added = Vec::new();
    for (key, name) in DEFAULT_SOURCES {
        if existing.iter().any(|s| s.key.eq_ignore_ascii_case(key)) {
            continue;
        }
        store.add(Collection::Sources, source_fields(key, name, Decimal::ZERO))?;
        added.push(key.to_string());
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BudgetStatus;
    use crate::normalize::WalletTransferRule;
    use crate::store::SqliteStore;

    fn month(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn dated(amount: i64, category: &str, date: &str) -> Fields {
        NewTransaction {
            date: Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
            ..NewTransaction::expense(Decimal::from(amount), category)
        }
        .into_fields()
    }

    fn attach(store: &SqliteStore) -> Dashboard {
        Dashboard::attach(store, month("2024-03"), Box::new(WalletTransferRule::default())).unwrap()
    }

    #[test]
    fn recomputes_on_every_snapshot() {
        let store = SqliteStore::open_in_memory("alice").unwrap();
        let dash = attach(&store);
        assert!(dash.progress().is_empty());

        store
            .add(Collection::Budgets, budget_fields("Food", month("2024-03"), Decimal::from(1_200_000)))
            .unwrap();
        assert_eq!(dash.progress()[0].status, BudgetStatus::Ok);

        store
            .add(Collection::Transactions, dated(1_000_000, "Food", "2024-03-05"))
            .unwrap();
        assert_eq!(dash.progress()[0].status, BudgetStatus::Warning);
        store
            .add(Collection::Transactions, dated(500_000, "Food", "2024-03-20"))
            .unwrap();
        let p = &dash.progress()[0];
        assert_eq!(p.status, BudgetStatus::Danger);
        assert_eq!(p.overspent, Decimal::from(300_000));
        assert_eq!(dash.active_alerts().len(), 1);
    }

    #[test]
    fn dismissal_self_heals_when_spend_drops() {
        let store = SqliteStore::open_in_memory("alice").unwrap();
        let dash = attach(&store);
        let budget_id = store
            .add(Collection::Budgets, budget_fields("Food", month("2024-03"), Decimal::from(1_000)))
            .unwrap();
        let big = store
            .add(Collection::Transactions, dated(1_500, "Food", "2024-03-02"))
            .unwrap();
        dash.dismiss(&budget_id);
        assert!(dash.active_alerts().is_empty());

        store
            .update(Collection::Transactions, &big, dated(500, "Food", "2024-03-02"))
            .unwrap();
        assert!(!dash.is_dismissed(&budget_id));
        assert!(dash.active_alerts().is_empty());

        store
            .add(Collection::Transactions, dated(700, "Food", "2024-03-09"))
            .unwrap();
        assert_eq!(dash.active_alerts().len(), 1);
    }

    #[test]
    fn failed_limit_update_rolls_back() {
        let store = SqliteStore::open_in_memory("alice").unwrap();
        let dash = attach(&store);
        let budget_id = store
            .add(Collection::Budgets, budget_fields("Food", month("2024-03"), Decimal::from(100)))
            .unwrap();
        store
            .add(Collection::Transactions, dated(150, "Food", "2024-03-02"))
            .unwrap();
        assert_eq!(dash.active_alerts().len(), 1);

        // a store for nobody rejects the write
        let signed_out = SqliteStore::open_in_memory("").unwrap();
        let err = dash
            .update_budget_limit(&signed_out, &budget_id, Decimal::from(1_000))
            .unwrap_err();
        assert_eq!(err.code(), "unauthenticated");
        assert_eq!(dash.budgets()[0].limit_amount, Decimal::from(100));
        assert_eq!(dash.progress()[0].status, BudgetStatus::Danger);
        assert_eq!(dash.error_for(&budget_id).as_deref(), Some(err.user_message()));

        dash.update_budget_limit(&store, &budget_id, Decimal::from(1_000))
            .unwrap();
        assert_eq!(dash.progress()[0].status, BudgetStatus::Ok);
        assert!(dash.error_for(&budget_id).is_none());
    }

    #[test]
    fn current_month_change_reclamps_past_budgets() {
        let store = SqliteStore::open_in_memory("alice").unwrap();
        let dash = attach(&store);
        store
            .add(Collection::Budgets, budget_fields("Food", month("2024-03"), Decimal::from(100)))
            .unwrap();
        store
            .add(Collection::Transactions, dated(150, "Food", "2024-03-02"))
            .unwrap();
        assert_eq!(dash.progress()[0].status, BudgetStatus::Danger);
        dash.set_current_month(month("2024-04"));
        assert_eq!(dash.progress()[0].effective_month, "2024-04");
        assert_eq!(dash.progress()[0].spent, Decimal::ZERO);
    }

    #[test]
    fn seeding_skips_existing_keys() {
        let store = SqliteStore::open_in_memory("alice").unwrap();
        store
            .add(Collection::Sources, source_fields("VCB", "My VCB", Decimal::from(5)))
            .unwrap();
        let added = seed_default_sources(&store).unwrap();
        assert_eq!(added.len(), DEFAULT_SOURCES.len() - 1);
        assert!(!added.contains(&"vcb".to_string()));
        assert!(seed_default_sources(&store).unwrap().is_empty());
    }

    #[test]
    fn server_assigned_dates_are_readable() {
        let store = SqliteStore::open_in_memory("alice").unwrap();
        let dash = attach(&store);
        store
            .add(
                Collection::Transactions,
                NewTransaction::expense(Decimal::from(10), "Food").into_fields(),
            )
            .unwrap();
        let txs = dash.transactions();
        assert!(txs[0].created_at.is_some());
        // store clock and "now" agree on the month
        assert_eq!(txs[0].month(), Some(crate::utils::current_month()));
    }
}
