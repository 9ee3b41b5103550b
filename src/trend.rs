// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly expense time series and period-over-period statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregate::add_amount;
use crate::models::{MonthKey, Transaction, TrendPoint};
use crate::utils::fmt_amount;

const TRAILING_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TrendRange {
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    #[default]
    SixMonths,
    #[serde(rename = "12m")]
    TwelveMonths,
    #[serde(rename = "24m")]
    TwentyFourMonths,
    #[serde(rename = "all")]
    All,
}

impl TrendRange {
    pub const KEYS: [&'static str; 5] = ["3m", "6m", "12m", "24m", "all"];

    /// Look-back length, `None` for the full span.
    pub fn months(&self) -> Option<i32> {
        match self {
            TrendRange::ThreeMonths => Some(3),
            TrendRange::SixMonths => Some(6),
            TrendRange::TwelveMonths => Some(12),
            TrendRange::TwentyFourMonths => Some(24),
            TrendRange::All => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            TrendRange::ThreeMonths => "3m",
            TrendRange::SixMonths => "6m",
            TrendRange::TwelveMonths => "12m",
            TrendRange::TwentyFourMonths => "24m",
            TrendRange::All => "all",
        }
    }
}

impl FromStr for TrendRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "3m" => Ok(TrendRange::ThreeMonths),
            "6m" => Ok(TrendRange::SixMonths),
            "12m" => Ok(TrendRange::TwelveMonths),
            "24m" => Ok(TrendRange::TwentyFourMonths),
            "all" => Ok(TrendRange::All),
            other => Err(format!(
                "Unknown range '{}' (use {})",
                other,
                TrendRange::KEYS.join("|")
            )),
        }
    }
}

impl fmt::Display for TrendRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub points: Vec<TrendPoint>,
    pub total: Decimal,
    pub average: Decimal,
    pub max_point: Option<TrendPoint>,
    pub last_point: Option<TrendPoint>,
    pub previous_point: Option<TrendPoint>,
    pub trailing_average: Decimal,
    pub previous_trailing_average: Option<Decimal>,
    pub non_zero_months: usize,
}

fn saturating_sum(points: &[TrendPoint]) -> Decimal {
    points
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.value))
}

fn mean(values: &[TrendPoint]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    Some(saturating_sum(values) / Decimal::from(values.len()))
}

/// Monthly expense totals over the selected window, zero-filled.
///
/// Internal transfers are counted here, unlike the budget aggregates.
pub fn compute_trend(txs: &[Transaction], range: TrendRange) -> TrendSummary {
    let mut monthly: BTreeMap<MonthKey, Decimal> = BTreeMap::new();
    for tx in txs.iter().filter(|t| t.is_expense()) {
        if let Some(month) = tx.month() {
            add_amount(monthly.entry(month).or_insert(Decimal::ZERO), tx.amount, &tx.id);
        }
    }
    let (Some(first), Some(last)) = (
        monthly.keys().next().copied(),
        monthly.keys().next_back().copied(),
    ) else {
        return TrendSummary::default();
    };

    let start = match range.months() {
        Some(n) => first.max(last.add_months(-(n - 1))),
        None => first,
    };
    let with_year = start.year() != last.year();
    let span = start.months_until(&last);
    let points: Vec<TrendPoint> = (0..=span)
        .map(|i| {
            let month = start.add_months(i);
            let date = month.first_day();
            let label = if with_year {
                date.format("%b %y").to_string()
            } else {
                date.format("%b").to_string()
            };
            TrendPoint {
                label,
                value: monthly.get(&month).copied().unwrap_or(Decimal::ZERO),
                date,
            }
        })
        .collect();

    let n = points.len();
    let total = saturating_sum(&points);
    let max_point = points
        .iter()
        .fold(None::<&TrendPoint>, |best, p| match best {
            Some(b) if b.value >= p.value => Some(b),
            _ => Some(p),
        })
        .cloned();
    let window = TRAILING_WINDOW.min(n);
    let trailing = &points[n - window..];
    let preceding = &points[(n - window).saturating_sub(window)..n - window];

    TrendSummary {
        total,
        average: total / Decimal::from(n),
        max_point,
        last_point: points.last().cloned(),
        previous_point: n.checked_sub(2).map(|i| points[i].clone()),
        trailing_average: mean(trailing).unwrap_or(Decimal::ZERO),
        previous_trailing_average: mean(preceding),
        non_zero_months: points.iter().filter(|p| p.value > Decimal::ZERO).count(),
        points,
    }
}

/// Percent change from `previous` to `current`; `None` when there is no
/// usable baseline.
pub fn percent_change(current: Decimal, previous: Option<Decimal>) -> Option<Decimal> {
    match previous {
        Some(prev) if !prev.is_zero() => current
            .checked_sub(prev)
            .and_then(|d| d.checked_div(prev))
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED)),
        _ => None,
    }
}

fn describe_change(subject: &str, change: Option<Decimal>, baseline: &str) -> String {
    match change {
        None => format!("{} change is unavailable ({}).", subject, baseline),
        Some(p) if p.is_zero() => format!("{} is unchanged.", subject),
        Some(p) if p > Decimal::ZERO => {
            format!("{} rose {}% {}.", subject, p.round_dp(1), baseline)
        }
        Some(p) => format!("{} fell {}% {}.", subject, p.abs().round_dp(1), baseline),
    }
}

/// Narrative statements for the trend panel.
pub fn insights(summary: &TrendSummary) -> Vec<String> {
    if summary.points.is_empty() {
        return vec!["No expenses recorded yet.".to_string()];
    }
    let mut out = Vec::new();
    if let (Some(last), Some(prev)) = (&summary.last_point, &summary.previous_point) {
        let change = percent_change(last.value, Some(prev.value));
        let baseline = if prev.value.is_zero() {
            format!("nothing was spent in {}", prev.label)
        } else {
            format!("vs {}", prev.label)
        };
        out.push(describe_change("Spending", change, &baseline));
    }
    if let Some(prev_avg) = summary.previous_trailing_average {
        let change = percent_change(summary.trailing_average, Some(prev_avg));
        let baseline = if prev_avg.is_zero() {
            "no spending in the preceding months".to_string()
        } else {
            "vs the 3 months before".to_string()
        };
        out.push(describe_change("The 3-month average", change, &baseline));
    }
    if let Some(peak) = &summary.max_point {
        out.push(format!("Peak month: {} ({}).", peak.label, fmt_amount(&peak.value)));
    }
    out.push(format!(
        "{} of {} months had spending, averaging {} per month.",
        summary.non_zero_months,
        summary.points.len(),
        fmt_amount(&summary.average)
    ));
    out
}
