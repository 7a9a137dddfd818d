// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Carry-over consolidation: a new deposit folds every still-unspent balance
//! into a single fresh topup, and a repeatable heal collapses the double
//! actives that unlocked concurrent writes can leave behind.

use crate::error::LedgerError;
use crate::ledger::store;
use crate::models::Topup;
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Record a deposit for a user, folding in unspent balance from prior topups.
/// Returns the created topup.
pub fn record_deposit(
    conn: &Connection,
    user_id: &str,
    amount: Decimal,
    description: Option<&str>,
    received_date: NaiveDate,
    now: NaiveDateTime,
) -> Result<Topup> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount).into());
    }
    store::require_user(conn, user_id)?;

    let open = store::topups_with_remaining(conn, user_id)?;
    let carried: Decimal = open.iter().map(|t| t.remaining_clamped()).sum();

    // Retire the folded topups. From their point of view the carried balance
    // was spent via rollover into the new topup, so this shares the natural
    // depletion fields.
    for mut t in open {
        t.remaining = Decimal::ZERO;
        t.spent = t.amount;
        t.is_active = false;
        if t.depleted_at.is_none() {
            t.depleted_at = Some(now);
            t.days_lasted = Some(crate::utils::days_between_ceil(t.received_date, now));
        }
        store::update_topup(conn, &t)?;
    }

    let desc = description.map(|s| s.to_string()).unwrap_or_else(|| {
        if carried > Decimal::ZERO {
            format!("Deposit {} (+{} carried over)", amount, carried)
        } else {
            format!("Deposit {}", amount)
        }
    });

    let total = amount + carried;
    let id = store::insert_topup(
        conn,
        &store::NewTopup {
            user_id,
            amount: total,
            original_amount: amount,
            carry_over_amount: carried,
            received_date,
            description: Some(desc),
        },
        now,
    )?;

    // Full replace, not increment: the older remainders were just folded in.
    store::set_cached_balance(conn, user_id, total)?;

    store::topup_by_id(conn, id)?
        .ok_or_else(|| anyhow::anyhow!("Topup {} vanished after insert", id))
}

/// Collapse simultaneously active topups into the most recently created one.
/// Safe to run repeatedly; does nothing once at most one topup is active.
pub fn consolidate_active(
    conn: &Connection,
    user_id: &str,
    now: NaiveDateTime,
) -> Result<usize> {
    let active = store::active_topups(conn, user_id)?;
    if active.len() <= 1 {
        return Ok(0);
    }

    // `active_topups` orders newest-created first; that one survives.
    let mut keeper = active[0].clone();
    let mut folded = 0usize;
    for mut t in active.into_iter().skip(1) {
        keeper.amount += t.amount;
        keeper.spent += t.spent;
        t.remaining = Decimal::ZERO;
        t.spent = t.amount;
        t.is_active = false;
        if t.depleted_at.is_none() {
            t.depleted_at = Some(now);
            t.days_lasted = Some(crate::utils::days_between_ceil(t.received_date, now));
        }
        store::update_topup(conn, &t)?;
        folded += 1;
    }
    keeper.carry_over_amount = keeper.amount - keeper.original_amount;
    crate::ledger::depletion::rederive(&mut keeper, now);
    store::update_topup(conn, &keeper)?;

    let truth = crate::ledger::reconcile::compute_truth(conn, user_id, now)?;
    store::set_cached_balance(conn, user_id, truth)?;
    Ok(folded)
}
