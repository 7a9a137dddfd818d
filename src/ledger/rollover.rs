// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly rollover: wipe the period's expenses and restore every topup to
//! its pre-spend state. The reset is non-incremental (always re-derived from
//! `amount`), so running it twice in one period lands in the same state; the
//! per-user period marker keeps the scheduled trigger and the startup
//! catch-up from re-processing a user.

use crate::ledger::store;
use anyhow::Result;
use chrono::{Datelike, Days, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;

#[derive(Debug, Default, serde::Serialize)]
pub struct RolloverReport {
    pub processed: Vec<String>,
    pub skipped: usize,
    /// Per-user failures; one user's failure never aborts the batch.
    pub failures: Vec<(String, String)>,
}

impl RolloverReport {
    fn record(&mut self, user: &str, res: Result<()>) {
        match res {
            Ok(()) => self.processed.push(user.to_string()),
            Err(e) => self.failures.push((user.to_string(), format!("{:#}", e))),
        }
    }
}

/// Reset one user's ledger for a fresh budgeting cycle. Idempotent.
pub fn rollover_user(conn: &Connection, user_id: &str, period: &str) -> Result<()> {
    store::require_user(conn, user_id)?;
    store::delete_expenses_for_user(conn, user_id)?;

    let mut total = Decimal::ZERO;
    for mut t in store::topups_for_user(conn, user_id)? {
        t.spent = Decimal::ZERO;
        t.remaining = t.amount;
        t.is_active = t.amount > Decimal::ZERO;
        t.depleted_at = None;
        t.days_lasted = None;
        store::update_topup(conn, &t)?;
        total += t.amount;
    }
    store::set_cached_balance(conn, user_id, total)?;
    store::set_last_rollover_period(conn, user_id, period)?;
    Ok(())
}

/// Daily trigger: acts only when tomorrow is the first of a month, rolling
/// every user over into tomorrow's period unless their marker says it already
/// happened.
pub fn tick(conn: &Connection, now: NaiveDateTime) -> Result<RolloverReport> {
    let mut report = RolloverReport::default();
    let tomorrow = now.date() + Days::new(1);
    if tomorrow.day() != 1 {
        return Ok(report);
    }
    let target = crate::utils::period_of(tomorrow);
    for user in store::all_user_ids(conn)? {
        if store::last_rollover_period(conn, &user)?.as_deref() == Some(target.as_str()) {
            report.skipped += 1;
            continue;
        }
        let res = rollover_user(conn, &user, &target);
        report.record(&user, res);
    }
    Ok(report)
}

/// Startup repair for missed month boundaries: a user with no expense this
/// month but at least one from before the month start was never rolled over
/// while the process was down.
pub fn catch_up(conn: &Connection, now: NaiveDateTime) -> Result<RolloverReport> {
    let mut report = RolloverReport::default();
    let start = crate::utils::month_start(now.date());
    let target = crate::utils::period_of(now.date());
    for user in store::all_user_ids(conn)? {
        if store::last_rollover_period(conn, &user)?.as_deref() == Some(target.as_str()) {
            report.skipped += 1;
            continue;
        }
        let this_month = store::count_expenses_since(conn, &user, start)?;
        let older = store::count_expenses_before(conn, &user, start)?;
        if this_month > 0 || older == 0 {
            report.skipped += 1;
            continue;
        }
        let res = rollover_user(conn, &user, &target);
        report.record(&user, res);
    }
    Ok(report)
}
