// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::predict;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = m.get_one::<String>("user").unwrap().trim();
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");

    let (topup, fc) = predict::get_prediction(conn, user, Utc::now().naive_utc())?;
    let payload = json!({
        "user": user,
        "topup_id": topup.id,
        "remaining": topup.remaining_clamped(),
        "forecast": fc,
    });
    if !maybe_print_json(json_flag, jsonl_flag, &payload)? {
        let day_cell = |d: Option<i64>| d.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
        let rate_cell = |r: Option<f64>| r.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into());
        let rows = vec![
            vec![
                "current-rate".into(),
                day_cell(fc.estimates.current_rate),
                rate_cell(fc.daily_rates.current_rate),
            ],
            vec![
                "recent-3-day".into(),
                day_cell(fc.estimates.recent_3_day),
                rate_cell(fc.daily_rates.recent_3_day),
            ],
            vec![
                "historical".into(),
                day_cell(fc.estimates.historical),
                rate_cell(fc.daily_rates.historical),
            ],
            vec![
                "weekday-pattern".into(),
                day_cell(fc.estimates.weekday_pattern),
                rate_cell(fc.daily_rates.weekday_pattern),
            ],
        ];
        println!("{}", pretty_table(&["Method", "Days", "Daily Rate"], rows));
        if fc.fallback_used {
            println!(
                "Forecast: {} days at the floor daily rate (no spending signal)",
                fc.forecast_days
            );
        } else {
            println!(
                "Forecast: {} days ({:.0}% confidence) on {} remaining",
                fc.forecast_days,
                fc.confidence,
                topup.remaining_clamped()
            );
        }
    }
    Ok(())
}
