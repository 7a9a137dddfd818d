// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{reconcile, store};
use crate::utils::pretty_table;
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let now = Utc::now().naive_utc();
    let mut rows = Vec::new();

    for user in store::all_user_ids(conn)? {
        let mut active = 0;
        for t in store::topups_for_user(conn, &user)? {
            if t.remaining != t.amount - t.spent {
                rows.push(vec![
                    "remaining_mismatch".into(),
                    format!("topup {}: {} != {} - {}", t.id, t.remaining, t.amount, t.spent),
                ]);
            }
            if t.amount != t.original_amount + t.carry_over_amount {
                rows.push(vec![
                    "amount_mismatch".into(),
                    format!(
                        "topup {}: {} != {} + {}",
                        t.id, t.amount, t.original_amount, t.carry_over_amount
                    ),
                ]);
            }
            if t.spent < Decimal::ZERO {
                rows.push(vec![
                    "negative_spent".into(),
                    format!("topup {}: {}", t.id, t.spent),
                ]);
            }
            if t.is_active {
                active += 1;
            }
        }
        if active > 1 {
            rows.push(vec![
                "multiple_active_topups".into(),
                format!("{}: {} active (run repair)", user, active),
            ]);
        }
        let reading = reconcile::authoritative_balance(conn, &user, now)?;
        if reading.drift > reconcile::drift_tolerance() {
            rows.push(vec![
                "cache_drift".into(),
                format!(
                    "{}: cached {} vs computed {} (run repair)",
                    user, reading.cached, reading.computed
                ),
            ]);
        }
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
