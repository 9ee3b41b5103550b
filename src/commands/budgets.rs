// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::{App, write_failed};
use crate::models::{BudgetProgress, BudgetStatus};
use crate::normalize::normalize_category;
use crate::session::budget_fields;
use crate::store::{Collection, DocumentStore};
use crate::utils::{fmt_amount, fmt_percent, maybe_print_json, parse_limit, parse_month, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        Some(("alerts", sub)) => alerts(app, sub)?,
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim();
            app.store
                .delete(Collection::Budgets, id)
                .map_err(write_failed)?;
            println!("Removed budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn set(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let cat = normalize_category(sub.get_one::<String>("category").map(String::as_str));
    let limit = parse_limit(sub.get_one::<String>("limit").unwrap())?;
    let id = app
        .store
        .add(Collection::Budgets, budget_fields(&cat, month, limit))
        .map_err(write_failed)?;
    println!("Budget set for {} / {} = {} [{}]", month, cat, app.money(&limit), id);
    Ok(())
}

pub fn progress_rows(progress: &[BudgetProgress]) -> Vec<Vec<String>> {
    progress
        .iter()
        .map(|p| {
            let pct = match (p.status, &p.percent) {
                (BudgetStatus::NoLimit, _) => "no limit set".to_string(),
                (_, Some(pct)) => fmt_percent(pct),
                (_, None) => "n/a".to_string(),
            };
            vec![
                p.budget.month.clone(),
                p.budget.category.clone(),
                fmt_amount(&p.budget.limit_amount),
                fmt_amount(&p.spent),
                pct,
                p.status.to_string(),
                fmt_amount(&p.remaining),
                fmt_amount(&p.overspent),
                p.budget.id.clone(),
            ]
        })
        .collect()
}

pub const PROGRESS_HEADERS: [&str; 9] = [
    "Month", "Category", "Limit", "Spent", "Used", "Status", "Remaining", "Over", "ID",
];

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let progress = app.dashboard()?.progress();
    if !maybe_print_json(json_flag, jsonl_flag, &progress)? {
        println!("{}", pretty_table(&PROGRESS_HEADERS, progress_rows(&progress)));
    }
    Ok(())
}

fn alerts(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let active = app.dashboard()?.active_alerts();
    if maybe_print_json(json_flag, jsonl_flag, &active)? {
        return Ok(());
    }
    if active.is_empty() {
        println!("No budgets over their limit");
    } else {
        for p in &active {
            println!("{}", alert_line(app, p));
        }
    }
    Ok(())
}

pub fn alert_line(app: &App, p: &BudgetProgress) -> String {
    format!(
        "[{}] {} {}: spent {} of {} ({} over)",
        p.budget.id,
        p.effective_month,
        p.budget.category,
        app.money(&p.spent),
        app.money(&p.budget.limit_amount),
        app.money(&p.overspent)
    )
}
