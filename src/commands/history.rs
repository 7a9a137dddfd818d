// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::expense;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = m.get_one::<String>("user").unwrap().trim();
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");

    let history = expense::history(conn, user)?;
    if !maybe_print_json(json_flag, jsonl_flag, &history)? {
        let rows: Vec<Vec<String>> = history
            .iter()
            .map(|h| {
                let t = &h.topup;
                vec![
                    t.id.to_string(),
                    t.received_date.to_string(),
                    format!("{:.2}", t.amount),
                    format!("{:.2}", t.carry_over_amount),
                    format!("{:.2}", t.spent),
                    format!("{:.2}", t.remaining_clamped()),
                    if t.is_active { "yes".into() } else { "no".into() },
                    t.days_lasted.map(|d| d.to_string()).unwrap_or_default(),
                    h.expenses.len().to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Topup", "Received", "Amount", "Carried", "Spent", "Remaining", "Active",
                    "Days", "Expenses"
                ],
                rows
            )
        );
    }
    Ok(())
}
