// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Canonicalization of loosely-typed store documents into core records.
//!
//! Everything here degrades gracefully: a document that cannot be decoded is
//! skipped (and logged at debug level), never turned into an error.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{Budget, MoneySource, Transaction, TxKind};
use crate::store::Document;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const WITHDRAWAL_CATEGORY: &str = "Withdrawal";

pub const DEFAULT_TRANSFER_WALLETS: &[&str] = &["binance", "okx", "bybit", "remitano"];
pub const DEFAULT_TRANSFER_KEYWORDS: &[&str] =
    &["binance", "okx", "bybit", "remitano", "withdraw", "rút"];

pub fn normalize_category(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNCATEGORIZED.to_string(),
    }
}

/// Decides whether a transaction only moves money between the user's own accounts.
pub trait TransferDetector {
    fn is_internal_transfer(&self, tx: &Transaction) -> bool;
}

/// Expense in the withdrawal category whose source is a known wallet, or whose
/// note mentions one of the keywords. The note match is a heuristic.
#[derive(Debug, Clone)]
pub struct WalletTransferRule {
    wallets: HashSet<String>,
    keywords: Option<Regex>,
}

impl WalletTransferRule {
    pub fn new<W, K>(wallets: W, keywords: K) -> Self
    where
        W: IntoIterator,
        W::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        let wallets = wallets
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        let alternation: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| regex::escape(&k))
            .collect();
        let keywords = if alternation.is_empty() {
            None
        } else {
            // escaped literals always form a valid pattern
            Regex::new(&format!("(?i)(?:{})", alternation.join("|"))).ok()
        };
        Self { wallets, keywords }
    }
}

impl Default for WalletTransferRule {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSFER_WALLETS, DEFAULT_TRANSFER_KEYWORDS)
    }
}

impl TransferDetector for WalletTransferRule {
    fn is_internal_transfer(&self, tx: &Transaction) -> bool {
        if tx.kind != TxKind::Expense {
            return false;
        }
        if normalize_category(Some(&tx.category)) != WITHDRAWAL_CATEGORY {
            return false;
        }
        let from_wallet = tx
            .source
            .as_deref()
            .map(|s| self.wallets.contains(&s.trim().to_lowercase()))
            .unwrap_or(false);
        let noted = match (&self.keywords, tx.note.as_deref()) {
            (Some(re), Some(note)) => re.is_match(note),
            _ => false,
        };
        from_wallet || noted
    }
}

/// Never flags anything; every transaction counts as real activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransfers;

impl TransferDetector for NoTransfers {
    fn is_internal_transfer(&self, _tx: &Transaction) -> bool {
        false
    }
}

static DEFAULT_RULE: Lazy<WalletTransferRule> = Lazy::new(WalletTransferRule::default);

/// Shared instance of the built-in wallet/keyword rule.
pub fn default_transfer_rule() -> &'static WalletTransferRule {
    &DEFAULT_RULE
}

pub fn is_internal_transfer(tx: &Transaction) -> bool {
    DEFAULT_RULE.is_internal_transfer(tx)
}

/// Timestamp as it comes back from the store: either written by a client as
/// text, or assigned by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Server {
        seconds: i64,
        #[serde(default)]
        nanoseconds: u32,
    },
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    /// Server and epoch instants are rendered in local time, so their month
    /// matches dates the user typed.
    pub fn to_iso(&self) -> Option<String> {
        let local = |d: DateTime<Utc>| d.with_timezone(&Local).to_rfc3339();
        match self {
            RawTimestamp::Server {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds).map(local),
            RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms).map(local),
            RawTimestamp::Text(s) => Some(s.clone()),
        }
    }

    pub fn resolve(&self) -> Option<NaiveDateTime> {
        self.to_iso().as_deref().and_then(parse_timestamp)
    }
}

/// Accepts RFC 3339 (wall-clock time of the given offset is kept), naive
/// date-times and bare `YYYY-MM-DD` dates.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn decimal_from_value(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(|f| Decimal::try_from(f).ok())
            }
        }
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn text_field(doc: &Document, key: &str) -> Option<String> {
    doc.data
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn timestamp_field(doc: &Document, key: &str) -> Option<NaiveDateTime> {
    let v = doc.data.get(key)?;
    serde_json::from_value::<RawTimestamp>(v.clone())
        .ok()
        .and_then(|t| t.resolve())
}

/// Decode one transaction document. `arrival` is its position in the snapshot.
pub fn transaction_from_document(doc: &Document, arrival: usize) -> Option<Transaction> {
    let amount = match doc.data.get("amount").and_then(decimal_from_value) {
        Some(a) if a >= Decimal::ZERO => a,
        other => {
            debug!(id = %doc.id, amount = ?other, "skipping transaction with unusable amount");
            return None;
        }
    };
    let kind = match doc
        .data
        .get("type")
        .and_then(Value::as_str)
        .map(str::parse::<TxKind>)
    {
        Some(Ok(k)) => k,
        _ => {
            debug!(id = %doc.id, "skipping transaction with unknown type");
            return None;
        }
    };
    let created_at = timestamp_field(doc, "createdAt");
    let updated_at = timestamp_field(doc, "updatedAt");
    let millis = |t: &Option<NaiveDateTime>| t.map(|t| t.and_utc().timestamp_millis());
    let sort_timestamp = [
        Some(arrival as i64),
        millis(&created_at),
        millis(&updated_at),
    ]
    .into_iter()
    .flatten()
    .max()
    .unwrap_or_default();

    Some(Transaction {
        id: doc.id.clone(),
        amount,
        category: normalize_category(doc.data.get("category").and_then(Value::as_str)),
        kind,
        note: text_field(doc, "note"),
        source: text_field(doc, "source"),
        created_at,
        updated_at,
        sort_timestamp,
    })
}

/// Decode a full transactions snapshot, most recent first.
pub fn transactions_from_snapshot(docs: &[Document]) -> Vec<Transaction> {
    let mut out: Vec<(usize, Transaction)> = docs
        .iter()
        .enumerate()
        .filter_map(|(i, d)| transaction_from_document(d, i).map(|t| (i, t)))
        .collect();
    out.sort_by(|(ia, a), (ib, b)| {
        b.sort_timestamp
            .cmp(&a.sort_timestamp)
            .then_with(|| ib.cmp(ia))
    });
    out.into_iter().map(|(_, t)| t).collect()
}

pub fn budget_from_document(doc: &Document) -> Option<Budget> {
    let limit_amount = doc
        .data
        .get("limitAmount")
        .and_then(decimal_from_value)
        .unwrap_or(Decimal::ZERO);
    Some(Budget {
        id: doc.id.clone(),
        category: normalize_category(doc.data.get("category").and_then(Value::as_str)),
        month: text_field(doc, "month").unwrap_or_default(),
        limit_amount,
    })
}

pub fn budgets_from_snapshot(docs: &[Document]) -> Vec<Budget> {
    docs.iter().filter_map(budget_from_document).collect()
}

pub fn source_from_document(doc: &Document) -> Option<MoneySource> {
    let Some(key) = text_field(doc, "key") else {
        debug!(id = %doc.id, "skipping money source without key");
        return None;
    };
    Some(MoneySource {
        id: doc.id.clone(),
        name: text_field(doc, "name").unwrap_or_else(|| key.clone()),
        key,
        initial_balance: doc
            .data
            .get("initialBalance")
            .and_then(decimal_from_value)
            .unwrap_or(Decimal::ZERO),
    })
}

pub fn sources_from_snapshot(docs: &[Document]) -> Vec<MoneySource> {
    docs.iter().filter_map(source_from_document).collect()
}
