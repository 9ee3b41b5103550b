// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::{App, write_failed};
use crate::session::{seed_default_sources, source_fields};
use crate::store::{Collection, DocumentStore};
use crate::utils::{fmt_amount, maybe_print_json, parse_decimal, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim().to_string();
            let name = sub
                .get_one::<String>("name")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| key.clone());
            let initial = parse_decimal(sub.get_one::<String>("initial").unwrap())?;
            let id = app
                .store
                .add(Collection::Sources, source_fields(&key, &name, initial))
                .map_err(write_failed)?;
            println!("Added source '{}' ({}) opening {} [{}]", name, key, app.money(&initial), id);
        }
        Some(("list", sub)) => list(app, sub)?,
        Some(("seed", _)) => {
            let added = seed_default_sources(app.store).map_err(write_failed)?;
            if added.is_empty() {
                println!("All default sources already exist");
            } else {
                println!("Seeded sources: {}", added.join(", "));
            }
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim();
            app.store
                .delete(Collection::Sources, id)
                .map_err(write_failed)?;
            println!("Removed source {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let balances = app.dashboard()?.balances();
    if maybe_print_json(json_flag, jsonl_flag, &balances)? {
        return Ok(());
    }
    let rows = balances
        .iter()
        .map(|b| {
            vec![
                b.source.key.clone(),
                b.source.name.clone(),
                fmt_amount(&b.source.initial_balance),
                fmt_amount(&b.income),
                fmt_amount(&b.expense),
                fmt_amount(&b.balance),
                b.source.id.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Key", "Name", "Opening", "In", "Out", "Balance", "ID"],
            rows
        )
    );
    Ok(())
}
