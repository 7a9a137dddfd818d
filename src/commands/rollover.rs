// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::rollover::{self, RolloverReport};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let now = Utc::now().naive_utc();
    match m.subcommand() {
        Some(("run", _)) => {
            let report = rollover::tick(conn, now)?;
            print_report("scheduled", &report);
        }
        Some(("catch-up", _)) => {
            let report = rollover::catch_up(conn, now)?;
            print_report("catch-up", &report);
        }
        Some(("user", sub)) => {
            let user = sub.get_one::<String>("user").unwrap().trim();
            let period = crate::utils::period_of(now.date());
            rollover::rollover_user(conn, user, &period)?;
            println!("Rolled over '{}' into period {}", user, period);
        }
        _ => {}
    }
    Ok(())
}

fn print_report(kind: &str, report: &RolloverReport) {
    println!(
        "Rollover ({}): {} processed, {} skipped, {} failed",
        kind,
        report.processed.len(),
        report.skipped,
        report.failures.len()
    );
    for (user, err) in &report.failures {
        eprintln!("  {} failed: {}", user, err);
    }
}
