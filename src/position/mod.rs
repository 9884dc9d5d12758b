// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Position management module.

pub mod trailing_sl;

pub use trailing_sl::{decide, TrailingDistance};
