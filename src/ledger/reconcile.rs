// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Dual-path balance bookkeeping. The cached scalar on the user record is
//! written optimistically alongside every ledger mutation; the truth is
//! recomputed from the topup and expense records on demand. The decision of
//! which to trust is a pure function of both values, so no call site can
//! apply a different tolerance ad hoc.

use crate::ledger::store;
use crate::models::{BalanceReading, BalanceSource};
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Drift (in currency units) tolerated between cache and recomputed truth
/// before a read stops trusting the cache.
pub fn drift_tolerance() -> Decimal {
    Decimal::TEN
}

pub fn read_cache(conn: &Connection, user_id: &str) -> Result<Decimal> {
    store::cached_balance(conn, user_id)
}

/// Recompute the balance from source records: the amounts of the currently
/// active topups minus this period's expenses drawn against them, never below
/// zero. Retired topups are excluded because their unspent balance was folded
/// into the active one at deposit time.
pub fn compute_truth(conn: &Connection, user_id: &str, now: NaiveDateTime) -> Result<Decimal> {
    let period = crate::utils::period_of(now.date());
    let mut total = Decimal::ZERO;
    for topup in store::active_topups(conn, user_id)? {
        total += topup.amount;
        for e in store::expenses_for_topup(conn, topup.id)? {
            if crate::utils::period_of(e.date) == period {
                total -= e.amount;
            }
        }
    }
    if total < Decimal::ZERO {
        total = Decimal::ZERO;
    }
    Ok(total)
}

/// The reconciliation policy: trust the cache only while it is non-negative
/// and within tolerance of the recomputed value.
pub fn reconcile(cached: Decimal, computed: Decimal) -> (Decimal, BalanceSource) {
    let drift = (cached - computed).abs();
    if drift <= drift_tolerance() && cached >= Decimal::ZERO {
        (cached, BalanceSource::Cache)
    } else {
        (computed, BalanceSource::Recomputed)
    }
}

/// Read-side classification; never fails on drift, only reports it.
pub fn authoritative_balance(
    conn: &Connection,
    user_id: &str,
    now: NaiveDateTime,
) -> Result<BalanceReading> {
    let cached = read_cache(conn, user_id)?;
    let computed = compute_truth(conn, user_id, now)?;
    let (balance, source) = reconcile(cached, computed);
    Ok(BalanceReading {
        balance,
        source,
        cached,
        computed,
        drift: (cached - computed).abs(),
    })
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RepairOutcome {
    pub user_id: String,
    pub folded_topups: usize,
    pub old_balance: Decimal,
    pub new_balance: Decimal,
}

/// Unconditional full recompute: consolidate racy double actives, then
/// overwrite the cache with the recomputed truth regardless of drift.
/// Idempotent; a second run reports no change.
pub fn repair_balances(
    conn: &Connection,
    user_id: Option<&str>,
    now: NaiveDateTime,
) -> Result<Vec<RepairOutcome>> {
    let targets = match user_id {
        Some(u) => {
            store::require_user(conn, u)?;
            vec![u.to_string()]
        }
        None => store::all_user_ids(conn)?,
    };

    let mut outcomes = Vec::new();
    for user in targets {
        let old = store::cached_balance(conn, &user)?;
        let folded = crate::ledger::deposit::consolidate_active(conn, &user, now)?;
        let truth = compute_truth(conn, &user, now)?;
        store::set_cached_balance(conn, &user, truth)?;
        outcomes.push(RepairOutcome {
            user_id: user,
            folded_topups: folded,
            old_balance: old,
            new_balance: truth,
        });
    }
    Ok(outcomes)
}
