// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};

use super::App;
use crate::aggregate::{aggregate_by_category_month_with, calendar_totals, spend_by_category};
use crate::models::MonthKey;
use crate::trend::{TrendRange, insights};
use crate::utils::{fmt_amount, maybe_print_json, parse_month, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(app, sub)?,
        Some(("calendar", sub)) => calendar(app, sub)?,
        Some(("spend-by-category", sub)) => by_category(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn month_or_now(app: &App, sub: &clap::ArgMatches) -> Result<MonthKey> {
    match sub.get_one::<String>("month") {
        Some(m) => parse_month(m),
        None => Ok(app.now),
    }
}

fn summary(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let month = month_or_now(app, sub)?;
    let s = app.dashboard()?.summary(month);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    let rows = vec![
        vec!["Income".to_string(), fmt_amount(&s.income)],
        vec!["Expense".to_string(), fmt_amount(&s.expense)],
        vec!["Net".to_string(), fmt_amount(&s.net)],
        vec![
            "Internal transfers skipped".to_string(),
            s.transfers_excluded.to_string(),
        ],
    ];
    let title = month.to_string();
    println!(
        "{}",
        pretty_table(&[title.as_str(), app.settings.currency.as_str()], rows)
    );
    Ok(())
}

fn calendar(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let month = month_or_now(app, sub)?;
    let rule = app.settings.transfer_rule();
    let days = calendar_totals(&app.dashboard()?.transactions(), month, &rule);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &days)? {
        return Ok(());
    }
    let rows = days
        .iter()
        .map(|(d, t)| {
            vec![
                d.format("%Y-%m-%d %a").to_string(),
                fmt_amount(&t.income),
                fmt_amount(&t.expense),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Day", "Income", "Expense"], rows));
    Ok(())
}

fn by_category(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let month = month_or_now(app, sub)?;
    let rule = app.settings.transfer_rule();
    let totals = aggregate_by_category_month_with(&app.dashboard()?.transactions(), &rule);
    let items = spend_by_category(&totals, month);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
        return Ok(());
    }
    let rows = items
        .into_iter()
        .map(|(cat, amt)| vec![cat, fmt_amount(&amt)])
        .collect();
    let hdr = format!("Spent ({})", app.settings.currency);
    println!("{}", pretty_table(&["Category", &hdr], rows));
    Ok(())
}

pub fn trend(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let range = sub
        .get_one::<String>("range")
        .map(|r| r.parse::<TrendRange>())
        .transpose()
        .map_err(|e| anyhow!(e))?
        .unwrap_or_default();
    let summary = app.dashboard()?.trend(range);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        return Ok(());
    }
    let rows = summary
        .points
        .iter()
        .map(|p| vec![p.label.clone(), fmt_amount(&p.value)])
        .collect();
    let hdr = format!("Expense ({})", app.settings.currency);
    println!("{}", pretty_table(&["Month", &hdr], rows));
    println!(
        "Total {} | average {} | trailing 3-month average {}",
        app.money(&summary.total),
        app.money(&summary.average),
        app.money(&summary.trailing_average)
    );
    for line in insights(&summary) {
        println!("- {}", line);
    }
    Ok(())
}
