// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Spending-duration forecast: four independent estimators of how many days
//! the active topup will last, combined by weighted average. A zero spending
//! rate is never divided through; it reads as "no signal" via the day
//! sentinel, and weights are renormalized over whichever estimators spoke.

use crate::error::LedgerError;
use crate::ledger::store;
use crate::models::{DailyRates, Expense, Forecast, MethodEstimates, Topup};
use anyhow::Result;
use chrono::{Datelike, Days, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Day estimates at or above this are "effectively infinite / no data".
pub const NO_SIGNAL: i64 = 999;

/// How many depleted topups feed the historical estimator.
const HISTORY_WINDOW: usize = 10;

/// Calendar days projected by the weekday/weekend pattern estimator.
const PATTERN_HORIZON: u64 = 14;

// Combination weights: current, recent-3-day, historical, pattern.
const WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

fn dec_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// `floor(remaining / rate)` gated on a positive rate, clamped into
/// `[0, NO_SIGNAL]`.
fn estimate_days(remaining: f64, rate: f64) -> i64 {
    if rate <= 0.0 {
        return NO_SIGNAL;
    }
    let est = (remaining / rate).floor() as i64;
    est.clamp(0, NO_SIGNAL)
}

fn is_weekend(date: chrono::NaiveDate) -> bool {
    date.weekday().number_from_monday() >= 6
}

struct Estimator {
    days: i64,
    rate: Option<f64>,
}

fn current_rate(topup: &Topup, days_active: i64, remaining: f64) -> Estimator {
    let rate = dec_f64(topup.spent) / days_active as f64;
    if rate <= 0.0 {
        return Estimator { days: NO_SIGNAL, rate: None };
    }
    Estimator { days: estimate_days(remaining, rate), rate: Some(rate) }
}

fn recent_3_day(
    recent: &[Expense],
    days_active: i64,
    remaining: f64,
    now: NaiveDateTime,
) -> Estimator {
    let cutoff = now.date() - Days::new(3);
    let sum: f64 = recent
        .iter()
        .filter(|e| e.date > cutoff)
        .map(|e| dec_f64(e.amount))
        .sum();
    let rate = sum / days_active.min(3) as f64;
    if rate <= 0.0 {
        return Estimator { days: NO_SIGNAL, rate: None };
    }
    Estimator { days: estimate_days(remaining, rate), rate: Some(rate) }
}

fn historical(history: &[Topup], remaining: f64) -> Estimator {
    let daily: Vec<f64> = history
        .iter()
        .filter(|t| t.days_lasted.map(|d| d > 0).unwrap_or(false))
        .take(HISTORY_WINDOW)
        .map(|t| dec_f64(t.amount) / t.days_lasted.unwrap_or(1) as f64)
        .collect();
    if daily.is_empty() {
        return Estimator { days: NO_SIGNAL, rate: None };
    }
    let rate = daily.iter().sum::<f64>() / daily.len() as f64;
    if rate <= 0.0 {
        return Estimator { days: NO_SIGNAL, rate: None };
    }
    Estimator { days: estimate_days(remaining, rate), rate: Some(rate) }
}

fn weekday_pattern(recent: &[Expense], remaining: f64, now: NaiveDateTime) -> Estimator {
    let (mut wk_sum, mut wk_n, mut we_sum, mut we_n) = (0.0f64, 0usize, 0.0f64, 0usize);
    for e in recent {
        let v = dec_f64(e.amount);
        if is_weekend(e.date) {
            we_sum += v;
            we_n += 1;
        } else {
            wk_sum += v;
            wk_n += 1;
        }
    }
    if wk_n == 0 && we_n == 0 {
        return Estimator { days: NO_SIGNAL, rate: None };
    }
    let wk_avg = if wk_n > 0 { wk_sum / wk_n as f64 } else { 0.0 };
    let we_avg = if we_n > 0 { we_sum / we_n as f64 } else { 0.0 };

    // Project the next 14 calendar days, classifying each one.
    let mut projected = 0.0;
    for offset in 1..=PATTERN_HORIZON {
        let day = now.date() + Days::new(offset);
        projected += if is_weekend(day) { we_avg } else { wk_avg };
    }
    let rate = projected / PATTERN_HORIZON as f64;
    if rate <= 0.0 {
        return Estimator { days: NO_SIGNAL, rate: None };
    }
    Estimator { days: estimate_days(remaining, rate), rate: Some(rate) }
}

/// Forecast how many days the active topup will last given its linked recent
/// expenses and the user's depleted-topup history.
pub fn forecast(
    topup: &Topup,
    recent: &[Expense],
    history: &[Topup],
    now: NaiveDateTime,
) -> Forecast {
    let remaining = dec_f64(topup.remaining_clamped());
    let days_active = crate::utils::days_between_ceil(topup.received_date, now).max(1);

    let methods = [
        current_rate(topup, days_active, remaining),
        recent_3_day(recent, days_active, remaining, now),
        historical(history, remaining),
        weekday_pattern(recent, remaining, now),
    ];

    let opt = |e: &Estimator| if e.days < NO_SIGNAL { Some(e.days.max(0)) } else { None };
    let estimates = MethodEstimates {
        current_rate: opt(&methods[0]),
        recent_3_day: opt(&methods[1]),
        historical: opt(&methods[2]),
        weekday_pattern: opt(&methods[3]),
    };
    let daily_rates = DailyRates {
        current_rate: methods[0].rate,
        recent_3_day: methods[1].rate,
        historical: methods[2].rate,
        weekday_pattern: methods[3].rate,
    };

    let valid: Vec<(f64, f64)> = methods
        .iter()
        .zip(WEIGHTS)
        .filter(|(e, _)| e.days < NO_SIGNAL)
        .map(|(e, w)| (e.days.max(0) as f64, w))
        .collect();

    if valid.is_empty() {
        // Floor daily rate rather than reporting no prediction at all.
        let fallback_rate = (dec_f64(topup.amount) * 0.1).max(10.0);
        return Forecast {
            estimates,
            daily_rates,
            forecast_days: (remaining / fallback_rate).floor().max(0.0) as i64,
            confidence: 0.0,
            fallback_used: true,
        };
    }

    let total_w: f64 = valid.iter().map(|(_, w)| w).sum();
    let mean: f64 = valid.iter().map(|(d, w)| d * w).sum::<f64>() / total_w;

    // Population variance of the valid estimates around the weighted mean.
    let variance: f64 =
        valid.iter().map(|(d, _)| (d - mean).powi(2)).sum::<f64>() / valid.len() as f64;
    let stddev = variance.sqrt();
    let confidence = if mean == 0.0 {
        100.0
    } else {
        (100.0 - stddev / mean * 100.0).clamp(0.0, 100.0)
    };

    Forecast {
        estimates,
        daily_rates,
        forecast_days: mean.floor().max(0.0) as i64,
        confidence,
        fallback_used: false,
    }
}

/// Load the newest active topup plus its inputs and forecast it.
pub fn get_prediction(
    conn: &Connection,
    user_id: &str,
    now: NaiveDateTime,
) -> Result<(Topup, Forecast)> {
    store::require_user(conn, user_id)?;
    let topup = store::active_topups(conn, user_id)?
        .into_iter()
        .next()
        .ok_or(LedgerError::NoActiveTopup)?;
    let recent = store::expenses_for_topup(conn, topup.id)?;
    let history = store::depleted_topups(conn, user_id, HISTORY_WINDOW)?;
    let fc = forecast(&topup, &recent, &history, now);
    Ok((topup, fc))
}
