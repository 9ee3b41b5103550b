// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::json;

use super::{App, write_failed};
use crate::models::TxKind;
use crate::normalize::normalize_category;
use crate::session::{NewTransaction, decimal_value};
use crate::store::{Collection, DocumentStore, Fields, server_timestamp};
use crate::utils::{fmt_amount, maybe_print_json, parse_amount, parse_date, parse_month, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        Some(("edit", sub)) => edit(app, sub)?,
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim();
            app.store
                .delete(Collection::Transactions, id)
                .map_err(write_failed)?;
            println!("Removed transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn kind_arg(sub: &clap::ArgMatches) -> Result<Option<TxKind>> {
    match sub.get_one::<String>("type") {
        Some(s) => s.parse::<TxKind>().map(Some).map_err(anyhow::Error::msg),
        None => Ok(None),
    }
}

fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let kind = kind_arg(sub)?.unwrap_or(TxKind::Expense);
    let date = match sub.get_one::<String>("date") {
        Some(d) => Some(parse_date(d)?),
        None => None,
    };
    let tx = NewTransaction {
        amount,
        kind,
        category: sub.get_one::<String>("category").cloned(),
        note: sub.get_one::<String>("note").cloned(),
        source: sub.get_one::<String>("source").cloned(),
        date,
    };
    let category = normalize_category(tx.category.as_deref());
    let id = app
        .store
        .add(Collection::Transactions, tx.into_fields())
        .map_err(write_failed)?;
    println!(
        "Recorded {} {} in '{}' [{}]",
        kind.as_str(),
        app.money(&amount),
        category,
        id
    );
    Ok(())
}

fn edit(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").unwrap().trim();
    let mut fields = Fields::new();
    if let Some(a) = sub.get_one::<String>("amount") {
        fields.insert("amount".into(), decimal_value(&parse_amount(a)?));
    }
    if let Some(kind) = kind_arg(sub)? {
        fields.insert("type".into(), json!(kind.as_str()));
    }
    if let Some(c) = sub.get_one::<String>("category") {
        fields.insert("category".into(), json!(normalize_category(Some(c))));
    }
    for key in ["note", "source"] {
        if let Some(v) = sub.get_one::<String>(key) {
            fields.insert(key.into(), json!(v.trim()));
        }
    }
    if let Some(d) = sub.get_one::<String>("date") {
        let date = parse_date(d)?;
        fields.insert(
            "createdAt".into(),
            json!(format!("{}T00:00:00", date.format("%Y-%m-%d"))),
        );
    }
    if fields.is_empty() {
        bail!("Nothing to change; pass at least one field to edit");
    }
    fields.insert("updatedAt".into(), server_timestamp());
    app.store
        .update(Collection::Transactions, id, fields)
        .map_err(write_failed)?;
    println!("Updated transaction {}", id);
    Ok(())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(app, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.source.clone(),
                    r.note.clone(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Type", "Amount", "Category", "Source", "Note", "ID"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub source: String,
    pub note: String,
}

/// Transactions most recent first, filtered by the `list` arguments.
pub fn query_rows(app: &App, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let month = match sub.get_one::<String>("month") {
        Some(m) => Some(parse_month(m)?),
        None => None,
    };
    let category = sub
        .get_one::<String>("category")
        .map(|c| normalize_category(Some(c)));
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);

    let data = app
        .dashboard()?
        .transactions()
        .into_iter()
        .filter(|t| month.is_none() || t.month() == month)
        .filter(|t| category.as_ref().is_none_or(|c| &t.category == c))
        .take(limit)
        .map(|t| TransactionRow {
            date: t
                .created_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "?".into()),
            kind: t.kind.as_str().to_string(),
            amount: fmt_amount(&t.amount),
            category: t.category,
            source: t.source.unwrap_or_default(),
            note: t.note.unwrap_or_default(),
            id: t.id,
        })
        .collect();
    Ok(data)
}
