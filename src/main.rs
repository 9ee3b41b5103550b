// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use walletwise::commands::{self, App};
use walletwise::config::Settings;
use walletwise::store::SqliteStore;
use walletwise::{cli, db, utils};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let db_file = matches.get_one::<String>("db").map(PathBuf::from);
    let conn = db::open_or_init(db_file.as_deref())?;
    let settings = Settings::load(&conn)?;
    let now = match matches.get_one::<String>("now") {
        Some(m) => utils::parse_month(m)?,
        None => utils::current_month(),
    };
    let user = matches
        .get_one::<String>("user")
        .cloned()
        .unwrap_or_else(|| settings.user.clone());

    if let Some(("config", sub)) = matches.subcommand() {
        return commands::settings::handle(&conn, sub);
    }

    let store = SqliteStore::new(conn, &user)?;
    let app = App {
        store: &store,
        settings: &settings,
        now,
    };

    match matches.subcommand() {
        Some(("init", _)) => match &db_file {
            Some(p) => println!("Database initialized at {}", p.display()),
            None => println!("Database initialized at {}", db::db_path()?.display()),
        },
        Some(("source", sub)) => commands::sources::handle(&app, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&app, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&app, sub)?,
        Some(("report", sub)) => commands::reports::handle(&app, sub)?,
        Some(("trend", sub)) => commands::reports::trend(&app, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&app, sub)?,
        Some(("watch", _)) => commands::watch::handle(&app)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
