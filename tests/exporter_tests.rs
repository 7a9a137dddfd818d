// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use stipend::ledger::{deposit, expense, store};
use stipend::models::Category;
use stipend::{cli, commands};

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
fn export_writes_one_csv_row_per_record() {
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
    expense::record_expense(
        &conn,
        "ana",
        Decimal::from(42),
        Category::Food,
        d(2026, 8, 3),
        None,
        dt(2026, 8, 3, 12),
    )
    .unwrap();

    let tmp = tempfile::NamedTempFile::new().unwrap();
    let out = tmp.path().to_str().unwrap().to_string();

    let matches = cli::build_cli().get_matches_from([
        "stipend", "export", "ledger", "--user", "ana", "--format", "csv", "--out", &out,
    ]);
    if let Some(("export", sub)) = matches.subcommand() {
        commands::exporter::handle(&conn, sub).unwrap();
    } else {
        panic!("export command not parsed");
    }

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "topup");
    assert_eq!(&rows[0][3], "300");
    assert_eq!(&rows[1][0], "expense");
    assert_eq!(&rows[1][3], "42");
    assert_eq!(&rows[1][4], "food");
}

#[test]
fn export_json_round_trips_the_ledger() {
    let conn = setup();
    deposit::record_deposit(
        &conn,
        "ana",
        Decimal::from(120),
        Some("pocket money"),
        d(2026, 8, 1),
        dt(2026, 8, 1, 9),
    )
    .unwrap();

    let tmp = tempfile::NamedTempFile::new().unwrap();
    let out = tmp.path().to_str().unwrap().to_string();

    let matches = cli::build_cli().get_matches_from([
        "stipend", "export", "ledger", "--user", "ana", "--format", "json", "--out", &out,
    ]);
    if let Some(("export", sub)) = matches.subcommand() {
        commands::exporter::handle(&conn, sub).unwrap();
    } else {
        panic!("export command not parsed");
    }

    let payload: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(payload["topups"].as_array().unwrap().len(), 1);
    assert_eq!(payload["topups"][0]["description"], "pocket money");
    assert!(payload["expenses"].as_array().unwrap().is_empty());
}
