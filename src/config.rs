// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::{Connection, OptionalExtension, params};

use crate::normalize::{DEFAULT_TRANSFER_KEYWORDS, DEFAULT_TRANSFER_WALLETS, WalletTransferRule};

pub const KEY_CURRENCY: &str = "currency";
pub const KEY_USER: &str = "user";
pub const KEY_TRANSFER_WALLETS: &str = "transfer.wallets";
pub const KEY_TRANSFER_KEYWORDS: &str = "transfer.keywords";

pub const KNOWN_KEYS: &[&str] = &[
    KEY_CURRENCY,
    KEY_USER,
    KEY_TRANSFER_WALLETS,
    KEY_TRANSFER_KEYWORDS,
];

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !KNOWN_KEYS.contains(&key) {
        bail!("Unknown setting '{}' (known: {})", key, KNOWN_KEYS.join(", "));
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub currency: String,
    pub user: String,
    pub transfer_wallets: Vec<String>,
    pub transfer_keywords: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "VND".to_string(),
            user: "me".to_string(),
            transfer_wallets: DEFAULT_TRANSFER_WALLETS.iter().map(|s| s.to_string()).collect(),
            transfer_keywords: DEFAULT_TRANSFER_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut s = Settings::default();
        if let Some(v) = get_setting(conn, KEY_CURRENCY)? {
            s.currency = v.to_uppercase();
        }
        if let Some(v) = get_setting(conn, KEY_USER)? {
            s.user = v;
        }
        if let Some(v) = get_setting(conn, KEY_TRANSFER_WALLETS)? {
            s.transfer_wallets = split_list(&v);
        }
        if let Some(v) = get_setting(conn, KEY_TRANSFER_KEYWORDS)? {
            s.transfer_keywords = split_list(&v);
        }
        Ok(s)
    }

    pub fn transfer_rule(&self) -> WalletTransferRule {
        WalletTransferRule::new(&self.transfer_wallets, &self.transfer_keywords)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            KEY_CURRENCY => Some(self.currency.clone()),
            KEY_USER => Some(self.user.clone()),
            KEY_TRANSFER_WALLETS => Some(self.transfer_wallets.join(",")),
            KEY_TRANSFER_KEYWORDS => Some(self.transfer_keywords.join(",")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Transaction, TxKind};
    use crate::normalize::{TransferDetector, WITHDRAWAL_CATEGORY};
    use rust_decimal::Decimal;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn defaults_then_overrides() {
        let conn = conn();
        assert_eq!(Settings::load(&conn).unwrap(), Settings::default());

        set_setting(&conn, KEY_CURRENCY, " usd ").unwrap();
        set_setting(&conn, KEY_TRANSFER_WALLETS, "kucoin, ,gate").unwrap();
        let s = Settings::load(&conn).unwrap();
        assert_eq!(s.currency, "USD");
        assert_eq!(s.transfer_wallets, vec!["kucoin", "gate"]);
        assert!(set_setting(&conn, "colour", "blue").is_err());
    }

    #[test]
    fn configured_wallets_drive_transfer_rule() {
        let conn = conn();
        set_setting(&conn, KEY_TRANSFER_WALLETS, "kucoin").unwrap();
        set_setting(&conn, KEY_TRANSFER_KEYWORDS, "").unwrap();
        let rule = Settings::load(&conn).unwrap().transfer_rule();
        let tx = Transaction {
            id: "t".into(),
            amount: Decimal::ONE,
            category: WITHDRAWAL_CATEGORY.into(),
            kind: TxKind::Expense,
            note: Some("binance".into()),
            source: Some("KuCoin".into()),
            created_at: None,
            updated_at: None,
            sort_timestamp: 0,
        };
        assert!(rule.is_internal_transfer(&tx));
        let other = Transaction {
            source: Some("binance".into()),
            ..tx
        };
        assert!(!rule.is_internal_transfer(&other));
    }
}
