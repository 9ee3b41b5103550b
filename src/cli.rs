// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

use crate::trend::TrendRange;

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id").long("id").required(true).help("Document id")
}

fn month_arg() -> Arg {
    Arg::new("month").long("month").help("Month as YYYY-MM")
}

pub fn build_cli() -> Command {
    Command::new("walletwise")
        .about("Budgets, spending trends and money sources")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("WALLETWISE_DB")
                .help("SQLite file to use instead of the platform data dir"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env("WALLETWISE_USER")
                .help("Namespace whose collections are read and written"),
        )
        .arg(
            Arg::new("now")
                .long("now")
                .global(true)
                .help("Treat this YYYY-MM as the current month"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("source")
                .about("Money sources (bank accounts, wallets)")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("initial").long("initial").default_value("0")),
                )
                .subcommand(json_flags(
                    Command::new("list").about("Sources with recomputed balances"),
                ))
                .subcommand(Command::new("seed").about("Add the default sources"))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("tx")
                .about("Income and expense transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["income", "expense"])
                                .default_value("expense"),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("note").long("note"))
                        .arg(Arg::new("source").long("source"))
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .help("YYYY-MM-DD; defaults to the store's clock"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(month_arg())
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(Arg::new("amount").long("amount"))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("note").long("note"))
                        .arg(Arg::new("source").long("source"))
                        .arg(Arg::new("date").long("date")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly category budgets")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(month_arg().required(true))
                        .arg(Arg::new("limit").long("limit").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("list").about("Budget progress for the current month"),
                ))
                .subcommand(json_flags(
                    Command::new("alerts").about("Budgets at or over their limit"),
                ))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("report")
                .about("Monthly reports")
                .subcommand(json_flags(Command::new("summary").arg(month_arg())))
                .subcommand(json_flags(Command::new("calendar").arg(month_arg())))
                .subcommand(json_flags(
                    Command::new("spend-by-category").arg(month_arg()),
                )),
        )
        .subcommand(json_flags(
            Command::new("trend")
                .about("Monthly spending trend and insights")
                .arg(
                    Arg::new("range")
                        .long("range")
                        .value_parser(TrendRange::KEYS)
                        .default_value("6m"),
                ),
        ))
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("transactions")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .value_parser(["csv", "json"])
                                .default_value("csv"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Persistent settings")
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(Command::new("watch").about("Interactive session with live alerts"))
}
