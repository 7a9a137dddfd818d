// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use stipend::ledger::{deposit, expense, reconcile, store};
use stipend::models::{BalanceSource, Category};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    stipend::db::init_schema(&conn).unwrap();
    store::create_user(&conn, "ana").unwrap();
    conn
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dt(y: i32, m: u32, day: u32, h: u32) -> NaiveDateTime {
    d(y, m, day).and_hms_opt(h, 0, 0).unwrap()
}

#[test]
fn small_drift_trusts_the_cache() {
    let (balance, source) = reconcile::reconcile(Decimal::from(140), Decimal::from(132));
    assert_eq!(balance, Decimal::from(140));
    assert_eq!(source, BalanceSource::Cache);
}

#[test]
fn drift_at_the_tolerance_still_trusts_the_cache() {
    let (balance, source) = reconcile::reconcile(Decimal::from(142), Decimal::from(132));
    assert_eq!(balance, Decimal::from(142));
    assert_eq!(source, BalanceSource::Cache);
}

#[test]
fn large_drift_returns_the_recomputed_value() {
    let (balance, source) = reconcile::reconcile(Decimal::from(140), Decimal::from(100));
    assert_eq!(balance, Decimal::from(100));
    assert_eq!(source, BalanceSource::Recomputed);
}

#[test]
fn negative_cache_is_never_trusted() {
    let (balance, source) = reconcile::reconcile(Decimal::from(-5), Decimal::from(3));
    assert_eq!(balance, Decimal::from(3));
    assert_eq!(source, BalanceSource::Recomputed);
}

#[test]
fn truth_is_active_amounts_minus_period_expenses() {
    let conn = setup();
    deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(332),
        None,
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap();
    expense::record_expense(
        &conn,
        "ana",
        Decimal::from(200),
        Category::Food,
        d(2026, 8, 5),
        None,
        dt(2026, 8, 5, 12),
    )
    .unwrap();

    let truth = reconcile::compute_truth(&conn, "ana", dt(2026, 8, 20, 12)).unwrap();
    assert_eq!(truth, Decimal::from(132));
}

#[test]
fn truth_is_clamped_at_zero() {
    let conn = setup();
    let topup = deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(100),
        None,
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap();
    // Simulate a racy write path that linked an expense without the topup
    // update landing.
    store::insert_expense(
        &conn,
        "ana",
        Decimal::from(400),
        Category::Fun,
        d(2026, 8, 6),
        Some(topup.id),
        None,
    )
    .unwrap();

    let truth = reconcile::compute_truth(&conn, "ana", dt(2026, 8, 20, 12)).unwrap();
    assert_eq!(truth, Decimal::ZERO);
}

#[test]
fn balance_read_classifies_drift_without_failing() {
    let conn = setup();
    deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(332),
        None,
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap();
    expense::record_expense(
        &conn,
        "ana",
        Decimal::from(200),
        Category::Food,
        d(2026, 8, 5),
        None,
        dt(2026, 8, 5, 12),
    )
    .unwrap();
    let now = dt(2026, 8, 20, 12);

    // Bounded drift: cache wins.
    store::set_cached_balance(&conn, "ana", Decimal::from(140)).unwrap();
    let reading = reconcile::authoritative_balance(&conn, "ana", now).unwrap();
    assert_eq!(reading.balance, Decimal::from(140));
    assert_eq!(reading.source, BalanceSource::Cache);
    assert_eq!(reading.drift, Decimal::from(8));

    // Diverged: recomputed wins; the cache itself stays untouched by a read.
    store::set_cached_balance(&conn, "ana", Decimal::from(180)).unwrap();
    let reading = reconcile::authoritative_balance(&conn, "ana", now).unwrap();
    assert_eq!(reading.balance, Decimal::from(132));
    assert_eq!(reading.source, BalanceSource::Recomputed);
    assert_eq!(store::cached_balance(&conn, "ana").unwrap(), Decimal::from(180));
}

#[test]
fn repair_overwrites_the_cache_unconditionally() {
    let conn = setup();
    deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(332),
        None,
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap();
    // Within tolerance, so a plain read would keep it; repair must not.
    store::set_cached_balance(&conn, "ana", Decimal::from(335)).unwrap();

    let outcomes =
        reconcile::repair_balances(&conn, Some("ana"), dt(2026, 8, 2, 9)).unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].new_balance, Decimal::from(332));
    assert_eq!(store::cached_balance(&conn, "ana").unwrap(), Decimal::from(332));
}

#[test]
fn repair_is_idempotent_across_users() {
    let conn = setup();
    store::create_user(&conn, "ben").unwrap();
    deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(300),
        None,
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap();
    // ben raced two deposits into two active topups.
    for amount in [50, 70] {
        store::insert_topup(
            &conn,
            &store::NewTopup {
                user_id: "ben",
                amount: Decimal::from(amount),
                original_amount: Decimal::from(amount),
                carry_over_amount: Decimal::ZERO,
                received_date: d(2026, 8, 1),
                description: None,
            },
            dt(2026, 8, 1, 9),
        )
        .unwrap();
    }

    let first = reconcile::repair_balances(&conn, None, dt(2026, 8, 2, 9)).unwrap();
    assert_eq!(first.len(), 2);
    let second = reconcile::repair_balances(&conn, None, dt(2026, 8, 2, 10)).unwrap();

    for outcome in &second {
        assert_eq!(outcome.folded_topups, 0);
        assert_eq!(outcome.old_balance, outcome.new_balance);
    }
    assert_eq!(store::cached_balance(&conn, "ben").unwrap(), Decimal::from(120));
    assert_eq!(store::active_topups(&conn, "ben").unwrap().len(), 1);
}
