// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Row-level access to the topup and expense collections. Amounts are stored
//! as TEXT-encoded decimals; every write here is a single-row statement, which
//! is the only atomicity the ledger relies on.

use crate::error::LedgerError;
use crate::models::{Category, Expense, Topup};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::str::FromStr;

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn create_user(conn: &Connection, user_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO users(id, current_balance) VALUES (?1, '0')",
        params![user_id],
    )?;
    Ok(())
}

pub fn require_user(conn: &Connection, user_id: &str) -> Result<()> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM users WHERE id=?1", params![user_id], |r| {
            r.get(0)
        })
        .optional()?;
    if found.is_none() {
        return Err(LedgerError::UnknownUser(user_id.to_string()).into());
    }
    Ok(())
}

pub fn all_user_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

pub fn cached_balance(conn: &Connection, user_id: &str) -> Result<Decimal> {
    let s: Option<String> = conn
        .query_row(
            "SELECT current_balance FROM users WHERE id=?1",
            params![user_id],
            |r| r.get(0),
        )
        .optional()?;
    match s {
        Some(v) => v
            .parse::<Decimal>()
            .with_context(|| format!("Invalid cached balance '{}' for {}", v, user_id)),
        None => Err(LedgerError::UnknownUser(user_id.to_string()).into()),
    }
}

pub fn set_cached_balance(conn: &Connection, user_id: &str, balance: Decimal) -> Result<()> {
    conn.execute(
        "UPDATE users SET current_balance=?1 WHERE id=?2",
        params![balance.to_string(), user_id],
    )?;
    Ok(())
}

/// Optimistic increment/decrement; deliberately a separate write from the
/// topup mutation it accompanies (see the reconciler's drift tolerance).
pub fn adjust_cached_balance(conn: &Connection, user_id: &str, delta: Decimal) -> Result<()> {
    let current = cached_balance(conn, user_id)?;
    set_cached_balance(conn, user_id, current + delta)
}

pub fn last_rollover_period(conn: &Connection, user_id: &str) -> Result<Option<String>> {
    let v: Option<Option<String>> = conn
        .query_row(
            "SELECT last_rollover_period FROM users WHERE id=?1",
            params![user_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.flatten())
}

pub fn set_last_rollover_period(conn: &Connection, user_id: &str, period: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_rollover_period=?1 WHERE id=?2",
        params![period, user_id],
    )?;
    Ok(())
}

pub struct NewTopup<'a> {
    pub user_id: &'a str,
    pub amount: Decimal,
    pub original_amount: Decimal,
    pub carry_over_amount: Decimal,
    pub received_date: NaiveDate,
    pub description: Option<String>,
}

pub fn insert_topup(conn: &Connection, t: &NewTopup, now: NaiveDateTime) -> Result<i64> {
    conn.execute(
        "INSERT INTO topups(user_id, amount, original_amount, carry_over_amount,
                            spent, remaining, is_active, received_date, description, created_at)
         VALUES (?1, ?2, ?3, ?4, '0', ?2, 1, ?5, ?6, ?7)",
        params![
            t.user_id,
            t.amount.to_string(),
            t.original_amount.to_string(),
            t.carry_over_amount.to_string(),
            t.received_date.to_string(),
            t.description,
            now.format(DT_FMT).to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const TOPUP_COLS: &str = "id, user_id, amount, original_amount, carry_over_amount, spent,
                          remaining, is_active, depleted_at, days_lasted, received_date,
                          description, created_at";

fn parse_dt(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DT_FMT)
        .with_context(|| format!("Invalid datetime '{}' in ledger", s))
}

fn topup_from_raw(
    row: (
        i64,
        String,
        String,
        String,
        String,
        String,
        String,
        i64,
        Option<String>,
        Option<i64>,
        String,
        Option<String>,
        String,
    ),
) -> Result<Topup> {
    let (id, user_id, amount, original, carry, spent, remaining, active, depleted, days, recv, desc, created) =
        row;
    Ok(Topup {
        id,
        user_id,
        amount: crate::utils::parse_decimal(&amount)?,
        original_amount: crate::utils::parse_decimal(&original)?,
        carry_over_amount: crate::utils::parse_decimal(&carry)?,
        spent: crate::utils::parse_decimal(&spent)?,
        remaining: crate::utils::parse_decimal(&remaining)?,
        is_active: active != 0,
        depleted_at: depleted.as_deref().map(parse_dt).transpose()?,
        days_lasted: days,
        received_date: crate::utils::parse_date(&recv)?,
        description: desc,
        created_at: parse_dt(&created)?,
    })
}

fn query_topups(conn: &Connection, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Topup>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, i64>(7)?,
            r.get::<_, Option<String>>(8)?,
            r.get::<_, Option<i64>>(9)?,
            r.get::<_, String>(10)?,
            r.get::<_, Option<String>>(11)?,
            r.get::<_, String>(12)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(topup_from_raw(row?)?);
    }
    Ok(out)
}

pub fn topup_by_id(conn: &Connection, id: i64) -> Result<Option<Topup>> {
    let sql = format!("SELECT {} FROM topups WHERE id=?1", TOPUP_COLS);
    Ok(query_topups(conn, &sql, &[&id])?.into_iter().next())
}

/// All topups for a user, newest deposit first.
pub fn topups_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Topup>> {
    let sql = format!(
        "SELECT {} FROM topups WHERE user_id=?1 ORDER BY received_date DESC, id DESC",
        TOPUP_COLS
    );
    query_topups(conn, &sql, &[&user_id])
}

/// Active topups, most recently created first.
pub fn active_topups(conn: &Connection, user_id: &str) -> Result<Vec<Topup>> {
    let sql = format!(
        "SELECT {} FROM topups WHERE user_id=?1 AND is_active=1 ORDER BY created_at DESC, id DESC",
        TOPUP_COLS
    );
    query_topups(conn, &sql, &[&user_id])
}

/// Topups a new deposit folds in: anything with unspent balance left.
pub fn topups_with_remaining(conn: &Connection, user_id: &str) -> Result<Vec<Topup>> {
    let all = topups_for_user(conn, user_id)?;
    Ok(all
        .into_iter()
        .filter(|t| t.remaining > Decimal::ZERO)
        .collect())
}

/// Most recently depleted topups (natural or forced), for the historical
/// spending-rate estimator.
pub fn depleted_topups(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<Topup>> {
    let sql = format!(
        "SELECT {} FROM topups
         WHERE user_id=?1 AND depleted_at IS NOT NULL AND days_lasted IS NOT NULL
         ORDER BY depleted_at DESC, id DESC LIMIT ?2",
        TOPUP_COLS
    );
    query_topups(conn, &sql, &[&user_id, &(limit as i64)])
}

/// Persist every derived field of a topup in one statement.
pub fn update_topup(conn: &Connection, t: &Topup) -> Result<()> {
    conn.execute(
        "UPDATE topups SET amount=?1, original_amount=?2, carry_over_amount=?3, spent=?4,
                remaining=?5, is_active=?6, depleted_at=?7, days_lasted=?8, description=?9
         WHERE id=?10",
        params![
            t.amount.to_string(),
            t.original_amount.to_string(),
            t.carry_over_amount.to_string(),
            t.spent.to_string(),
            t.remaining.to_string(),
            t.is_active as i64,
            t.depleted_at.map(|d| d.format(DT_FMT).to_string()),
            t.days_lasted,
            t.description,
            t.id,
        ],
    )?;
    Ok(())
}

pub fn insert_expense(
    conn: &Connection,
    user_id: &str,
    amount: Decimal,
    category: Category,
    date: NaiveDate,
    topup_id: Option<i64>,
    note: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses(user_id, amount, category, date, topup_id, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            amount.to_string(),
            category.as_str(),
            date.to_string(),
            topup_id,
            note,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn query_expenses(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<i64>>(5)?,
            r.get::<_, Option<String>>(6)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, user_id, amount, category, date, topup_id, note) = row?;
        out.push(Expense {
            id,
            user_id,
            amount: crate::utils::parse_decimal(&amount)?,
            category: Category::from_str(&category)?,
            date: crate::utils::parse_date(&date)?,
            topup_id,
            note,
        });
    }
    Ok(out)
}

const EXPENSE_COLS: &str = "id, user_id, amount, category, date, topup_id, note";

pub fn expense_by_id(conn: &Connection, id: i64) -> Result<Option<Expense>> {
    let sql = format!("SELECT {} FROM expenses WHERE id=?1", EXPENSE_COLS);
    Ok(query_expenses(conn, &sql, &[&id])?.into_iter().next())
}

pub fn expenses_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses WHERE user_id=?1 ORDER BY date DESC, id DESC",
        EXPENSE_COLS
    );
    query_expenses(conn, &sql, &[&user_id])
}

pub fn expenses_for_topup(conn: &Connection, topup_id: i64) -> Result<Vec<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses WHERE topup_id=?1 ORDER BY date DESC, id DESC",
        EXPENSE_COLS
    );
    query_expenses(conn, &sql, &[&topup_id])
}

pub fn delete_expense_row(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM expenses WHERE id=?1", params![id])?;
    Ok(())
}

pub fn delete_expenses_for_user(conn: &Connection, user_id: &str) -> Result<usize> {
    let n = conn.execute("DELETE FROM expenses WHERE user_id=?1", params![user_id])?;
    Ok(n)
}

/// Count of expenses dated on/after `from` (exclusive upper bound unbounded).
pub fn count_expenses_since(conn: &Connection, user_id: &str, from: NaiveDate) -> Result<i64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM expenses WHERE user_id=?1 AND date>=?2",
        params![user_id, from.to_string()],
        |r| r.get(0),
    )?;
    Ok(n)
}

pub fn count_expenses_before(conn: &Connection, user_id: &str, before: NaiveDate) -> Result<i64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM expenses WHERE user_id=?1 AND date<?2",
        params![user_id, before.to_string()],
        |r| r.get(0),
    )?;
    Ok(n)
}
