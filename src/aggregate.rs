// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::{MoneySource, MonthKey, Transaction, TxKind};
use crate::normalize::{TransferDetector, default_transfer_rule};

/// Expense totals keyed by (month, normalized category).
pub type CategoryMonthTotals = BTreeMap<(MonthKey, String), Decimal>;

/// Add `amount` to a running total, clamping at the largest representable value.
pub(crate) fn add_amount(total: &mut Decimal, amount: Decimal, id: &str) {
    *total = match total.checked_add(amount) {
        Some(sum) => sum,
        None => {
            debug!(%id, %amount, "running total overflows, saturating");
            total.saturating_add(amount)
        }
    };
}

pub fn aggregate_by_category_month(txs: &[Transaction]) -> CategoryMonthTotals {
    aggregate_by_category_month_with(txs, default_transfer_rule())
}

/// Sum expenses per (month, category). Internal transfers and transactions
/// without a usable date are left out.
pub fn aggregate_by_category_month_with(
    txs: &[Transaction],
    detector: &dyn TransferDetector,
) -> CategoryMonthTotals {
    let mut totals = CategoryMonthTotals::new();
    for tx in txs {
        if !tx.is_expense() || detector.is_internal_transfer(tx) {
            continue;
        }
        let Some(month) = tx.month() else { continue };
        let total = totals
            .entry((month, tx.category.clone()))
            .or_insert(Decimal::ZERO);
        add_amount(total, tx.amount, &tx.id);
    }
    totals
}

/// Categories of one month, largest spend first.
pub fn spend_by_category(totals: &CategoryMonthTotals, month: MonthKey) -> Vec<(String, Decimal)> {
    let mut items: Vec<(String, Decimal)> = totals
        .iter()
        .filter(|((m, _), _)| *m == month)
        .map(|((_, c), v)| (c.clone(), *v))
        .collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub month: MonthKey,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub transfers_excluded: usize,
}

pub fn monthly_summary(
    txs: &[Transaction],
    month: MonthKey,
    detector: &dyn TransferDetector,
) -> MonthlySummary {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut transfers_excluded = 0;
    for tx in txs.iter().filter(|t| t.month() == Some(month)) {
        if detector.is_internal_transfer(tx) {
            transfers_excluded += 1;
            continue;
        }
        match tx.kind {
            TxKind::Income => add_amount(&mut income, tx.amount, &tx.id),
            TxKind::Expense => add_amount(&mut expense, tx.amount, &tx.id),
        }
    }
    MonthlySummary {
        month,
        income,
        expense,
        net: income.saturating_sub(expense),
        transfers_excluded,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayTotals {
    pub income: Decimal,
    pub expense: Decimal,
}

/// Per-day totals for the calendar view of `month`.
pub fn calendar_totals(
    txs: &[Transaction],
    month: MonthKey,
    detector: &dyn TransferDetector,
) -> BTreeMap<NaiveDate, DayTotals> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for tx in txs {
        let Some(at) = tx.created_at else { continue };
        if MonthKey::from_date(&at) != month || detector.is_internal_transfer(tx) {
            continue;
        }
        let day = days.entry(at.date()).or_default();
        match tx.kind {
            TxKind::Income => add_amount(&mut day.income, tx.amount, &tx.id),
            TxKind::Expense => add_amount(&mut day.expense, tx.amount, &tx.id),
        }
    }
    days
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBalance {
    #[serde(flatten)]
    pub source: MoneySource,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// Balances are always recomputed from the initial balance and every
/// transaction booked against the source key, transfers included.
pub fn source_balances(sources: &[MoneySource], txs: &[Transaction]) -> Vec<SourceBalance> {
    sources
        .iter()
        .map(|src| {
            let mut income = Decimal::ZERO;
            let mut expense = Decimal::ZERO;
            for tx in txs.iter().filter(|t| t.source.as_deref() == Some(src.key.as_str())) {
                match tx.kind {
                    TxKind::Income => add_amount(&mut income, tx.amount, &tx.id),
                    TxKind::Expense => add_amount(&mut expense, tx.amount, &tx.id),
                }
            }
            SourceBalance {
                source: src.clone(),
                income,
                expense,
                balance: src
                    .initial_balance
                    .saturating_add(income)
                    .saturating_sub(expense),
            }
        })
        .collect()
}
