// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use stipend::error::LedgerError;
use stipend::ledger::{deposit, expense, store};
use stipend::models::Category;

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
fn first_deposit_has_no_carry_over() {
    let conn = setup();
    let t = deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(300),
        None,
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap();

    assert_eq!(t.amount, Decimal::from(300));
    assert_eq!(t.original_amount, Decimal::from(300));
    assert_eq!(t.carry_over_amount, Decimal::ZERO);
    assert_eq!(t.remaining, Decimal::from(300));
    assert!(t.is_active);
    assert!(!t.description.as_deref().unwrap().contains("carried over"));
    assert_eq!(store::cached_balance(&conn, "ana").unwrap(), Decimal::from(300));
}

#[test]
fn deposit_folds_unspent_balance_into_new_topup() {
    let conn = setup();
    let first = deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(300),
        None,
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap();
    expense::record_expense(
        &conn,
        "ana",
        Decimal::from(168),
        Category::Food,
        d(2026, 8, 5),
        None,
        dt(2026, 8, 5, 12),
    )
    .unwrap();

    let second = deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(200),
        None,
        d(2026, 8, 10),
        dt(2026, 8, 10, 9),
    )
    .unwrap();

    assert_eq!(second.original_amount, Decimal::from(200));
    assert_eq!(second.carry_over_amount, Decimal::from(132));
    assert_eq!(second.amount, Decimal::from(332));
    assert_eq!(second.remaining, Decimal::from(332));
    assert!(second.description.as_deref().unwrap().contains("carried over"));

    let old = store::topup_by_id(&conn, first.id).unwrap().unwrap();
    assert_eq!(old.remaining, Decimal::ZERO);
    assert!(!old.is_active);
    assert!(old.depleted_at.is_some());
    assert_eq!(old.days_lasted, Some(10));
    // amount - spent stays consistent after the forced retirement
    assert_eq!(old.remaining, old.amount - old.spent);

    // Cache is replaced, not incremented.
    assert_eq!(store::cached_balance(&conn, "ana").unwrap(), Decimal::from(332));
}

#[test]
fn non_positive_deposit_is_rejected_before_any_write() {
    let conn = setup();
    deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(300),
        None,
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap();

    let err = deposit::record_deposit(
        &conn,
        "ana",
        Decimal::ZERO,
        None,
        d(2026, 8, 2),
        dt(2026, 8, 2, 9),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InvalidAmount(_))
    ));

    // The failed deposit touched nothing.
    let topups = store::topups_for_user(&conn, "ana").unwrap();
    assert_eq!(topups.len(), 1);
    assert!(topups[0].is_active);
    assert_eq!(store::cached_balance(&conn, "ana").unwrap(), Decimal::from(300));
}

#[test]
fn deposit_for_unknown_user_fails() {
    let conn = setup();
    let err = deposit::record_deposit(
        &conn,
        "nobody",
        Decimal::from(50),
        None,
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::UnknownUser(_))
    ));
}

#[test]
fn consolidate_active_heals_double_actives_and_is_idempotent() {
    let conn = setup();
    // Two concurrent deposit paths both created an active topup.
    store::insert_topup(
        &conn,
        &store::NewTopup {
            user_id: "ana",
            amount: Decimal::from(100),
            original_amount: Decimal::from(100),
            carry_over_amount: Decimal::ZERO,
            received_date: d(2026, 8, 1),
            description: None,
        },
        dt(2026, 8, 1, 9),
    )
    .unwrap();
    store::insert_topup(
        &conn,
        &store::NewTopup {
            user_id: "ana",
            amount: Decimal::from(200),
            original_amount: Decimal::from(200),
            carry_over_amount: Decimal::ZERO,
            received_date: d(2026, 8, 1),
            description: None,
        },
        dt(2026, 8, 1, 9),
    )
    .unwrap();

    let folded = deposit::consolidate_active(&conn, "ana", dt(2026, 8, 2, 9)).unwrap();
    assert_eq!(folded, 1);

    let active = store::active_topups(&conn, "ana").unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].amount, Decimal::from(300));
    assert_eq!(active[0].original_amount, Decimal::from(200));
    assert_eq!(active[0].carry_over_amount, Decimal::from(100));
    assert_eq!(active[0].remaining, Decimal::from(300));
    assert_eq!(store::cached_balance(&conn, "ana").unwrap(), Decimal::from(300));

    // No further effect once only one topup is active.
    let folded_again = deposit::consolidate_active(&conn, "ana", dt(2026, 8, 3, 9)).unwrap();
    assert_eq!(folded_again, 0);
    let active = store::active_topups(&conn, "ana").unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].amount, Decimal::from(300));
}
