// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim();
            crate::ledger::store::create_user(conn, id)?;
            println!("Added user '{}' with balance 0", id);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let mut stmt = conn.prepare(
                "SELECT id, current_balance, IFNULL(last_rollover_period,''), created_at
                 FROM users ORDER BY id",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (id, bal, period, created) = row?;
                data.push(vec![id, bal, period, created]);
            }
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                println!(
                    "{}",
                    pretty_table(&["User", "Cached Balance", "Last Rollover", "Created"], data)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim();
            conn.execute("DELETE FROM users WHERE id=?1", params![id])?;
            println!("Removed user '{}'", id);
        }
        _ => {}
    }
    Ok(())
}
