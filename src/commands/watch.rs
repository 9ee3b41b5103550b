// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Line-oriented session that keeps a live dashboard for as long as it runs.
//! Dismissed alerts are remembered only until the session ends.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use super::App;
use super::budgets::{PROGRESS_HEADERS, alert_line, progress_rows};
use crate::session::{Dashboard, NewTransaction};
use crate::store::{Collection, DocumentStore};
use crate::trend::{TrendRange, insights};
use crate::utils::{parse_amount, parse_limit, pretty_table};

const HELP: &str = "commands: alerts | budgets | dismiss <budget-id> | spend <amount> <category> | \
limit <budget-id> <amount> | trend [3m|6m|12m|24m|all] | help | quit";

pub fn handle(app: &App) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(app, stdin.lock(), stdout.lock())
}

fn print_alerts<W: Write>(app: &App, dash: &Dashboard, out: &mut W) -> io::Result<()> {
    let active = dash.active_alerts();
    if active.is_empty() {
        writeln!(out, "no active alerts")?;
    }
    for p in &active {
        writeln!(out, "ALERT {}", alert_line(app, p))?;
        if let Some(msg) = dash.error_for(&p.budget.id) {
            writeln!(out, "  ! {}", msg)?;
        }
    }
    Ok(())
}

pub fn run<R: BufRead, W: Write>(app: &App, input: R, mut out: W) -> Result<()> {
    let dash = app.dashboard()?;
    writeln!(
        out,
        "watching '{}' as of {} ({})",
        app.store.namespace(),
        app.now,
        HELP
    )?;
    print_alerts(app, &dash, &mut out)?;

    for line in input.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else { continue };
        match cmd {
            "quit" | "exit" => break,
            "help" => writeln!(out, "{}", HELP)?,
            "alerts" => print_alerts(app, &dash, &mut out)?,
            "budgets" => writeln!(
                out,
                "{}",
                pretty_table(&PROGRESS_HEADERS, progress_rows(&dash.progress()))
            )?,
            "dismiss" => match parts.next() {
                Some(id) => {
                    dash.dismiss(id);
                    writeln!(out, "dismissed {}", id)?;
                }
                None => writeln!(out, "usage: dismiss <budget-id>")?,
            },
            "spend" => {
                let amount = parts.next().map(parse_amount);
                let category = parts.collect::<Vec<_>>().join(" ");
                match amount {
                    Some(Ok(amount)) => {
                        let fields = NewTransaction::expense(amount, &category).into_fields();
                        match app.store.add(Collection::Transactions, fields) {
                            Ok(id) => {
                                writeln!(out, "recorded {} [{}]", app.money(&amount), id)?;
                                print_alerts(app, &dash, &mut out)?;
                            }
                            Err(err) => writeln!(out, "! {}", err.user_message())?,
                        }
                    }
                    Some(Err(err)) => writeln!(out, "! {}", err)?,
                    None => writeln!(out, "usage: spend <amount> <category>")?,
                }
            }
            "limit" => match (parts.next(), parts.next().map(parse_limit)) {
                (Some(id), Some(Ok(limit))) => {
                    match dash.update_budget_limit(app.store, id, limit) {
                        Ok(()) => writeln!(out, "limit of {} set to {}", id, app.money(&limit))?,
                        Err(err) => writeln!(out, "! {}", err.user_message())?,
                    }
                    print_alerts(app, &dash, &mut out)?;
                }
                (_, Some(Err(err))) => writeln!(out, "! {}", err)?,
                _ => writeln!(out, "usage: limit <budget-id> <amount>")?,
            },
            "trend" => match parts.next().unwrap_or("6m").parse::<TrendRange>() {
                Ok(range) => {
                    for line in insights(&dash.trend(range)) {
                        writeln!(out, "- {}", line)?;
                    }
                }
                Err(err) => writeln!(out, "! {}", err)?,
            },
            other => writeln!(out, "unknown command '{}'; {}", other, HELP)?,
        }
    }
    out.flush()?;
    Ok(())
}
