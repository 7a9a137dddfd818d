// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod store;
pub mod depletion;
pub mod deposit;
pub mod expense;
pub mod reconcile;
pub mod predict;
pub mod rollover;
