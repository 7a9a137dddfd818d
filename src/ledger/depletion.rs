// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Depletion tracking: every mutation of a topup's `spent` flows through the
//! pure functions here, so `remaining = amount - spent` and the one-shot
//! depletion edge cannot be bypassed by a write path.

use crate::models::Topup;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Consume `amount` from the topup and rederive its state.
pub fn apply_expense(topup: &mut Topup, amount: Decimal, now: NaiveDateTime) {
    topup.spent += amount;
    rederive(topup, now);
}

/// Reverse a previously applied expense. `spent` never goes negative, and a
/// depletion already recorded stays recorded: the edge fires once and does
/// not flap back even if the balance reopens.
pub fn revert_expense(topup: &mut Topup, amount: Decimal, now: NaiveDateTime) {
    topup.spent -= amount;
    if topup.spent < Decimal::ZERO {
        topup.spent = Decimal::ZERO;
    }
    rederive(topup, now);
    if topup.depleted_at.is_none() && topup.remaining > Decimal::ZERO {
        topup.is_active = true;
    }
}

/// Recompute `remaining` and detect the depletion edge. Runs on every change
/// to `spent`, not only at creation.
pub fn rederive(topup: &mut Topup, now: NaiveDateTime) {
    topup.remaining = topup.amount - topup.spent;
    if topup.remaining <= Decimal::ZERO
        && topup.spent > Decimal::ZERO
        && topup.depleted_at.is_none()
    {
        topup.depleted_at = Some(now);
        topup.days_lasted = Some(crate::utils::days_between_ceil(topup.received_date, now));
        topup.is_active = false;
    }
}
