// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use tracing::debug;

use crate::aggregate::CategoryMonthTotals;
use crate::models::{Budget, BudgetProgress, BudgetStatus, MonthKey};
use crate::normalize::normalize_category;

/// Fraction of the limit at which a budget turns to `warning`.
pub fn warning_ratio() -> Decimal {
    Decimal::new(8, 1)
}

pub fn status_for(spent: Decimal, limit: Decimal) -> BudgetStatus {
    if limit <= Decimal::ZERO {
        BudgetStatus::NoLimit
    } else if spent >= limit {
        BudgetStatus::Danger
    } else if spent >= warning_ratio() * limit {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Ok
    }
}

/// Budgets stored for a past month are evaluated against `current_month`.
pub fn effective_month(budget_month: &str, current_month: &str) -> String {
    if budget_month < current_month {
        current_month.to_string()
    } else {
        budget_month.to_string()
    }
}

/// Case-insensitive ordering that falls back to the raw text so equal-looking
/// categories still sort deterministically.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn progress_for(budget: &Budget, totals: &CategoryMonthTotals, current: MonthKey) -> BudgetProgress {
    let category = normalize_category(Some(&budget.category));
    let month = effective_month(budget.month.trim(), &current.to_string());
    let spent = month
        .parse::<MonthKey>()
        .ok()
        .and_then(|m| totals.get(&(m, category.clone())).copied())
        .unwrap_or(Decimal::ZERO);
    let limit = budget.limit_amount;
    let status = status_for(spent, limit);
    let percent = if limit > Decimal::ZERO {
        let ratio = spent
            .checked_div(limit)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED));
        if ratio.is_none() {
            debug!(id = %budget.id, %spent, %limit, "budget percent out of range");
        }
        ratio
    } else {
        Some(Decimal::ZERO)
    };
    BudgetProgress {
        budget: Budget {
            category,
            ..budget.clone()
        },
        effective_month: month,
        spent,
        percent,
        status,
        remaining: limit.saturating_sub(spent).max(Decimal::ZERO),
        overspent: spent.saturating_sub(limit).max(Decimal::ZERO),
    }
}

/// Join budgets against aggregated spend. Duplicates for the same
/// (category, month) are evaluated independently. Sorted by month
/// descending, then category.
pub fn evaluate(
    budgets: &[Budget],
    totals: &CategoryMonthTotals,
    current_month: MonthKey,
) -> Vec<BudgetProgress> {
    let mut out: Vec<BudgetProgress> = budgets
        .iter()
        .map(|b| progress_for(b, totals, current_month))
        .collect();
    out.sort_by(|a, b| {
        b.budget
            .month
            .cmp(&a.budget.month)
            .then_with(|| locale_cmp(&a.budget.category, &b.budget.category))
    });
    out
}
