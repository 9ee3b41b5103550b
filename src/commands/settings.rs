// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use crate::config::{KNOWN_KEYS, Settings, set_setting};
use crate::utils::pretty_table;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            match Settings::load(conn)?.get(key) {
                Some(v) => println!("{}", v),
                None => bail!("Unknown setting '{}' (known: {})", key, KNOWN_KEYS.join(", ")),
            }
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap();
            set_setting(conn, key, value)?;
            println!("{} = {}", key, value.trim());
        }
        Some(("list", _)) => {
            let settings = Settings::load(conn)?;
            let rows = KNOWN_KEYS
                .iter()
                .map(|k| vec![k.to_string(), settings.get(k).unwrap_or_default()])
                .collect();
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
