// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::store;
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("ledger", sub)) => export_ledger(conn, sub),
        _ => Ok(()),
    }
}

fn export_ledger(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap().trim();
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let topups = store::topups_for_user(conn, user)?;
    let expenses = store::expenses_for_user(conn, user)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "record", "id", "date", "amount", "category", "spent", "remaining", "carried",
                "active", "topup",
            ])?;
            for t in &topups {
                wtr.write_record([
                    "topup".to_string(),
                    t.id.to_string(),
                    t.received_date.to_string(),
                    t.amount.to_string(),
                    String::new(),
                    t.spent.to_string(),
                    t.remaining_clamped().to_string(),
                    t.carry_over_amount.to_string(),
                    (t.is_active as i64).to_string(),
                    String::new(),
                ])?;
            }
            for e in &expenses {
                wtr.write_record([
                    "expense".to_string(),
                    e.id.to_string(),
                    e.date.to_string(),
                    e.amount.to_string(),
                    e.category.to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    e.topup_id.map(|t| t.to_string()).unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let payload = json!({ "topups": topups, "expenses": expenses });
            std::fs::write(out, serde_json::to_string_pretty(&payload)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported ledger for '{}' to {}", user, out);
    Ok(())
}
