// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The expense-entry boundary. Overdraw against a topup is rejected here, at
//! commit time; the depletion tracker itself never validates.

use crate::error::LedgerError;
use crate::ledger::{depletion, store};
use crate::models::{Category, Expense, Topup};
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Commit an expense. Ledger-drawing categories are linked to the newest
/// active topup that can absorb the amount; the owning topup id is returned
/// so callers can report which deposit paid for it.
pub fn record_expense(
    conn: &Connection,
    user_id: &str,
    amount: Decimal,
    category: Category,
    date: NaiveDate,
    note: Option<&str>,
    now: NaiveDateTime,
) -> Result<Option<i64>> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount).into());
    }
    store::require_user(conn, user_id)?;

    if !category.draws_on_ledger() {
        store::insert_expense(conn, user_id, amount, category, date, None, note)?;
        return Ok(None);
    }

    let active = store::active_topups(conn, user_id)?;
    if active.is_empty() {
        return Err(LedgerError::NoActiveTopup.into());
    }
    let mut topup = match active.iter().find(|t| t.remaining_clamped() >= amount) {
        Some(t) => t.clone(),
        None => {
            let best = active
                .iter()
                .map(|t| t.remaining_clamped())
                .max()
                .unwrap_or(Decimal::ZERO);
            return Err(LedgerError::InsufficientRemaining {
                remaining: best,
                requested: amount,
            }
            .into());
        }
    };

    store::insert_expense(conn, user_id, amount, category, date, Some(topup.id), note)?;
    depletion::apply_expense(&mut topup, amount, now);
    store::update_topup(conn, &topup)?;
    // Cache write is a separate statement; any drift it accrues is bounded
    // and resolved by the reconciler.
    store::adjust_cached_balance(conn, user_id, -amount)?;
    Ok(Some(topup.id))
}

/// Delete an expense, reversing the owning topup's `spent` when it was
/// linked. An already-recorded depletion stays recorded.
pub fn delete_expense(conn: &Connection, expense_id: i64, now: NaiveDateTime) -> Result<Expense> {
    let expense = store::expense_by_id(conn, expense_id)?
        .ok_or_else(|| anyhow::anyhow!("Expense {} not found", expense_id))?;

    if let Some(topup_id) = expense.topup_id {
        if let Some(mut topup) = store::topup_by_id(conn, topup_id)? {
            depletion::revert_expense(&mut topup, expense.amount, now);
            store::update_topup(conn, &topup)?;
            store::adjust_cached_balance(conn, &expense.user_id, expense.amount)?;
        }
    }
    store::delete_expense_row(conn, expense_id)?;
    Ok(expense)
}

/// One topup with its linked expenses, for the history read surface.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TopupHistory {
    pub topup: Topup,
    pub expenses: Vec<Expense>,
}

pub fn history(conn: &Connection, user_id: &str) -> Result<Vec<TopupHistory>> {
    store::require_user(conn, user_id)?;
    let mut out = Vec::new();
    for topup in store::topups_for_user(conn, user_id)? {
        let expenses = store::expenses_for_topup(conn, topup.id)?;
        out.push(TopupHistory { topup, expenses });
    }
    Ok(out)
}
