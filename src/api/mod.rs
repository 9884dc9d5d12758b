// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Darwinex API access: transport, token refresh and wire types.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::refresh;
pub use client::{
    conditional_order_path, current_positions_path, investor_accounts_path, DarwinexClient,
    Outcome,
};
pub use types::{ConditionalOrderUpdate, CurrentPosition, InvestorAccount, Threshold, TokenPair};
