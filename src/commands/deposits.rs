// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::deposit;
use crate::utils::{parse_date, parse_decimal};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = m.get_one::<String>("user").unwrap().trim();
    let amount = parse_decimal(m.get_one::<String>("amount").unwrap().trim())?;
    let description = m.get_one::<String>("description").map(|s| s.as_str());
    let now = Utc::now().naive_utc();
    let date = match m.get_one::<String>("date") {
        Some(s) => parse_date(s.trim())?,
        None => now.date(),
    };

    let topup = deposit::record_deposit(conn, user, amount, description, date, now)?;
    if topup.carry_over_amount > Decimal::ZERO {
        println!(
            "Recorded deposit of {} for '{}' ({} carried over, {} spendable)",
            topup.original_amount, user, topup.carry_over_amount, topup.amount
        );
    } else {
        println!(
            "Recorded deposit of {} for '{}' ({} spendable)",
            topup.original_amount, user, topup.amount
        );
    }
    Ok(())
}
