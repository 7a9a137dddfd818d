// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Domain failures raised by the ledger core. Everything else travels as
/// `anyhow::Error`; these are distinguishable via `downcast_ref`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
    #[error("User '{0}' not found")]
    UnknownUser(String),
    #[error("No active topup with spendable balance")]
    NoActiveTopup,
    #[error("Insufficient remaining balance: {remaining} available, {requested} requested")]
    InsufficientRemaining {
        remaining: Decimal,
        requested: Decimal,
    },
}
