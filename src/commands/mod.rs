// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod users;
pub mod deposits;
pub mod expenses;
pub mod balance;
pub mod history;
pub mod predict;
pub mod repair;
pub mod rollover;
pub mod exporter;
pub mod doctor;
