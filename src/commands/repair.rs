// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::reconcile;
use crate::utils::pretty_table;
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let all = m.get_flag("all");
    let user = m.get_one::<String>("user").map(|s| s.trim().to_string());
    if !all && user.is_none() {
        anyhow::bail!("repair needs --user <id> or --all");
    }

    let outcomes = reconcile::repair_balances(conn, user.as_deref(), Utc::now().naive_utc())?;
    let rows: Vec<Vec<String>> = outcomes
        .iter()
        .map(|o| {
            vec![
                o.user_id.clone(),
                o.folded_topups.to_string(),
                format!("{:.2}", o.old_balance),
                format!("{:.2}", o.new_balance),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["User", "Folded Topups", "Old Balance", "New Balance"], rows)
    );
    Ok(())
}
