// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{HashMap, HashSet};

use crate::models::{BudgetProgress, BudgetStatus};

/// Over-budget alerts the user has dismissed during this session, plus the
/// last error message per budget. Nothing here is persisted.
#[derive(Debug, Default, Clone)]
pub struct AlertTracker {
    dismissed: HashSet<String>,
    errors: HashMap<String, String>,
}

impl AlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget dismissals and errors of budgets that are no longer in `danger`,
    /// so a later overspend alerts again.
    pub fn reconcile(&mut self, progress: &[BudgetProgress]) {
        let danger: HashSet<&str> = progress
            .iter()
            .filter(|p| p.status == BudgetStatus::Danger)
            .map(|p| p.budget.id.as_str())
            .collect();
        self.dismissed.retain(|id| danger.contains(id.as_str()));
        self.errors.retain(|id, _| danger.contains(id.as_str()));
    }

    pub fn dismiss(&mut self, id: &str) {
        self.dismissed.insert(id.to_string());
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.dismissed.contains(id)
    }

    pub fn record_error(&mut self, id: &str, message: impl Into<String>) {
        self.errors.insert(id.to_string(), message.into());
    }

    pub fn clear_error(&mut self, id: &str) {
        self.errors.remove(id);
    }

    pub fn error_for(&self, id: &str) -> Option<&str> {
        self.errors.get(id).map(String::as_str)
    }

    pub fn active_alerts<'a>(&self, progress: &'a [BudgetProgress]) -> Vec<&'a BudgetProgress> {
        progress
            .iter()
            .filter(|p| p.status == BudgetStatus::Danger && !self.is_dismissed(&p.budget.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Budget;
    use rust_decimal::Decimal;

    fn progress(id: &str, status: BudgetStatus) -> BudgetProgress {
        BudgetProgress {
            budget: Budget {
                id: id.into(),
                category: "Food".into(),
                month: "2024-03".into(),
                limit_amount: Decimal::from(100),
            },
            effective_month: "2024-03".into(),
            spent: Decimal::ZERO,
            percent: Some(Decimal::ZERO),
            status,
            remaining: Decimal::ZERO,
            overspent: Decimal::ZERO,
        }
    }

    #[test]
    fn dismissed_alerts_are_hidden() {
        let mut t = AlertTracker::new();
        let all = vec![
            progress("a", BudgetStatus::Danger),
            progress("b", BudgetStatus::Danger),
            progress("c", BudgetStatus::Warning),
        ];
        assert_eq!(t.active_alerts(&all).len(), 2);
        t.dismiss("a");
        let active = t.active_alerts(&all);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].budget.id, "b");
    }

    #[test]
    fn leaving_danger_clears_dismissal_and_error() {
        let mut t = AlertTracker::new();
        t.dismiss("a");
        t.record_error("a", "Could not save changes. Please try again.");
        t.reconcile(&[progress("a", BudgetStatus::Danger)]);
        assert!(t.is_dismissed("a"));
        assert!(t.error_for("a").is_some());

        t.reconcile(&[progress("a", BudgetStatus::Warning)]);
        assert!(!t.is_dismissed("a"));
        assert!(t.error_for("a").is_none());

        let again = vec![progress("a", BudgetStatus::Danger)];
        t.reconcile(&again);
        assert_eq!(t.active_alerts(&again).len(), 1);
    }

    #[test]
    fn deleted_budgets_are_forgotten() {
        let mut t = AlertTracker::new();
        t.dismiss("gone");
        t.reconcile(&[]);
        assert!(!t.is_dismissed("gone"));
    }
}
