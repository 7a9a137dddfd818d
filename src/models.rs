// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One deposit event and its consumption history. At most one topup per user
/// is active outside of the write races healed by `ledger::deposit::consolidate_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topup {
    pub id: i64,
    pub user_id: String,
    /// Total spendable: `original_amount + carry_over_amount`.
    pub amount: Decimal,
    pub original_amount: Decimal,
    pub carry_over_amount: Decimal,
    pub spent: Decimal,
    /// Stored as `amount - spent`; clamp at zero for consumer-facing reads.
    pub remaining: Decimal,
    pub is_active: bool,
    pub depleted_at: Option<NaiveDateTime>,
    pub days_lasted: Option<i64>,
    pub received_date: NaiveDate,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Topup {
    /// Consumer-facing remaining, never below zero.
    pub fn remaining_clamped(&self) -> Decimal {
        if self.remaining < Decimal::ZERO {
            Decimal::ZERO
        } else {
            self.remaining
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: String,
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDate,
    /// Set iff the category draws on the allowance ledger.
    pub topup_id: Option<i64>,
    pub note: Option<String>,
}

/// Closed category set. Essentials and savings belong to the separate
/// essentials-budgeting feature and never draw on the allowance ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Essentials,
    Savings,
    Food,
    Fun,
    Shopping,
    Other,
}

impl Category {
    pub fn draws_on_ledger(&self) -> bool {
        !matches!(self, Category::Essentials | Category::Savings)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Essentials => "essentials",
            Category::Savings => "savings",
            Category::Food => "food",
            Category::Fun => "fun",
            Category::Shopping => "shopping",
            Category::Other => "other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::Essentials,
            Category::Savings,
            Category::Food,
            Category::Fun,
            Category::Shopping,
            Category::Other,
        ]
    }
}

impl FromStr for Category {
    type Err = crate::error::LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "essentials" => Ok(Category::Essentials),
            "savings" => Ok(Category::Savings),
            "food" => Ok(Category::Food),
            "fun" => Ok(Category::Fun),
            "shopping" => Ok(Category::Shopping),
            "other" => Ok(Category::Other),
            other => Err(crate::error::LedgerError::UnknownCategory(other.to_string())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the cache/truth comparison a balance read came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSource {
    Cache,
    Recomputed,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceReading {
    pub balance: Decimal,
    pub source: BalanceSource,
    pub cached: Decimal,
    pub computed: Decimal,
    pub drift: Decimal,
}

/// Per-method day estimates; `None` means the estimator had no signal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MethodEstimates {
    pub current_rate: Option<i64>,
    pub recent_3_day: Option<i64>,
    pub historical: Option<i64>,
    pub weekday_pattern: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyRates {
    pub current_rate: Option<f64>,
    pub recent_3_day: Option<f64>,
    pub historical: Option<f64>,
    pub weekday_pattern: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub estimates: MethodEstimates,
    pub daily_rates: DailyRates,
    pub forecast_days: i64,
    /// 0..=100; 100 with a single valid estimate, 0 on fallback.
    pub confidence: f64,
    pub fallback_used: bool,
}
