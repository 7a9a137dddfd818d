// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{reconcile, store};
use crate::utils::{fmt_money, get_base_currency, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = m.get_one::<String>("user").unwrap().trim();
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");
    let now = Utc::now().naive_utc();

    let reading = reconcile::authoritative_balance(conn, user, now)?;
    let active = store::active_topups(conn, user)?;
    let summary: Vec<_> = active
        .iter()
        .map(|t| {
            json!({
                "topup_id": t.id,
                "amount": t.amount,
                "spent": t.spent,
                "remaining": t.remaining_clamped(),
                "received_date": t.received_date,
            })
        })
        .collect();

    let payload = json!({
        "user": user,
        "balance": reading.balance,
        "source": reading.source,
        "cached": reading.cached,
        "computed": reading.computed,
        "drift": reading.drift,
        "active_topups": summary,
    });
    if !maybe_print_json(json_flag, jsonl_flag, &payload)? {
        let ccy = get_base_currency(conn)?;
        println!(
            "Balance for '{}': {} ({:?})",
            user,
            fmt_money(&reading.balance, &ccy),
            reading.source
        );
        let rows: Vec<Vec<String>> = active
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    format!("{:.2}", t.amount),
                    format!("{:.2}", t.spent),
                    format!("{:.2}", t.remaining_clamped()),
                    t.received_date.to_string(),
                ]
            })
            .collect();
        if !rows.is_empty() {
            println!(
                "{}",
                pretty_table(&["Topup", "Amount", "Spent", "Remaining", "Received"], rows)
            );
        }
    }
    Ok(())
}
