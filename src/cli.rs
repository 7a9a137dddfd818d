// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn user_arg() -> Arg {
    Arg::new("user").long("user").required(true)
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print JSON Lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("stipend")
        .about("Allowance ledger with carry-over topups, spend forecasting, and monthly rollover")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .about("Register a user with a zero balance")
                        .arg(Arg::new("id").long("id").required(true)),
                )
                .subcommand(json_flags(Command::new("list").about("List users")))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a user and their ledger")
                        .arg(Arg::new("id").long("id").required(true)),
                ),
        )
        .subcommand(
            Command::new("deposit")
                .about("Record a deposit, folding in unspent balance from prior topups")
                .arg(user_arg())
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("description").long("description"))
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("Nominal deposit date YYYY-MM-DD (default today)"),
                ),
        )
        .subcommand(
            Command::new("expense")
                .about("Record and manage expenses")
                .subcommand(
                    Command::new("add")
                        .arg(user_arg())
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .required(true)
                                .help("essentials|savings|food|fun|shopping|other"),
                        )
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete an expense, reversing the owning topup's spent")
                        .arg(Arg::new("id").long("id").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(user_arg()),
                )),
        )
        .subcommand(json_flags(
            Command::new("balance")
                .about("Reconciled current balance")
                .arg(user_arg()),
        ))
        .subcommand(json_flags(
            Command::new("history")
                .about("Topups with their linked expenses, newest first")
                .arg(user_arg()),
        ))
        .subcommand(json_flags(
            Command::new("predict")
                .about("Forecast how many days the active topup will last")
                .arg(user_arg()),
        ))
        .subcommand(
            Command::new("repair")
                .about("Consolidate double-active topups and resync cached balances")
                .arg(Arg::new("user").long("user"))
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Repair every user"),
                ),
        )
        .subcommand(
            Command::new("rollover")
                .about("Monthly ledger reset")
                .subcommand(Command::new("run").about("Daily trigger; acts when tomorrow is day 1"))
                .subcommand(
                    Command::new("catch-up")
                        .about("Startup repair for month boundaries missed while down"),
                )
                .subcommand(
                    Command::new("user")
                        .about("Force a rollover for one user")
                        .arg(user_arg()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export the ledger")
                .subcommand(
                    Command::new("ledger")
                        .arg(user_arg())
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Scan the ledger for broken invariants"))
}
