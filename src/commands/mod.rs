// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budgets;
pub mod exporter;
pub mod reports;
pub mod settings;
pub mod sources;
pub mod transactions;
pub mod watch;

use anyhow::{Context, Result, anyhow};

use crate::config::Settings;
use crate::models::MonthKey;
use crate::session::Dashboard;
use crate::store::{SqliteStore, StoreError};

/// What every command handler gets: the user's store, settings and the month
/// treated as "now".
pub struct App<'a> {
    pub store: &'a SqliteStore,
    pub settings: &'a Settings,
    pub now: MonthKey,
}

impl App<'_> {
    pub fn dashboard(&self) -> Result<Dashboard> {
        Dashboard::attach(self.store, self.now, Box::new(self.settings.transfer_rule()))
            .context("Could not load data from the store")
    }

    pub fn money(&self, d: &rust_decimal::Decimal) -> String {
        crate::utils::fmt_money(d, &self.settings.currency)
    }
}

/// Turn a failed write into the message shown to the user.
pub fn write_failed(err: StoreError) -> anyhow::Error {
    anyhow!("{} [{}]", err.user_message(), err.code())
}
