// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{expense, store};
use crate::models::Category;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use std::str::FromStr;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let category = Category::from_str(sub.get_one::<String>("category").unwrap())?;
    let note = sub.get_one::<String>("note").map(|s| s.as_str());
    let now = Utc::now().naive_utc();
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s.trim())?,
        None => now.date(),
    };

    match expense::record_expense(conn, user, amount, category, date, note, now)? {
        Some(topup_id) => println!(
            "Recorded {} {} expense on {} (drawn from topup {})",
            amount, category, date, topup_id
        ),
        None => println!(
            "Recorded {} {} expense on {} (not drawn from allowance)",
            amount, category, date
        ),
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    let deleted = expense::delete_expense(conn, id, Utc::now().naive_utc())?;
    match deleted.topup_id {
        Some(topup_id) => println!(
            "Deleted expense {} ({} restored to topup {})",
            id, deleted.amount, topup_id
        ),
        None => println!("Deleted expense {}", id),
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap().trim();
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = store::expenses_for_user(conn, user)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.date.to_string(),
                    e.category.to_string(),
                    format!("{:.2}", e.amount),
                    e.topup_id.map(|t| t.to_string()).unwrap_or_default(),
                    e.note.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Date", "Category", "Amount", "Topup", "Note"], rows)
        );
    }
    Ok(())
}
