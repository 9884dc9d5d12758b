// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Order update execution module.

pub mod dispatch;

pub use dispatch::{dispatch, StopLossUpdate};
