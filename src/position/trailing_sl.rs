// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Trailing stop-loss implementation.
//!
//! A rule is either an absolute distance (`46.5`) or a percentage of the
//! current quote (`2.53%`). The stop-loss is only raised when the live quote
//! has moved further away from the recorded stop than the rule allows.

use crate::api::{CurrentPosition, Threshold};
use crate::error::{Result, TrailError};
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

/// Slack added to the distance before comparing, so sub-cent drift never
/// produces an update.
pub const EPSILON: f64 = 0.005;

lazy_static! {
    static ref TRAILING_SL_PATTERN: Regex =
        Regex::new(r"^\d+(\.\d+)?%?$").expect("static pattern compiles");
}

/// How far behind the current quote the stop-loss should trail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrailingDistance {
    /// Fixed distance in quote units.
    Absolute(f64),
    /// Percentage of the current quote.
    Percent(f64),
}

impl TrailingDistance {
    /// Distance in quote units for a given live quote.
    pub fn resolve(&self, current_quote: f64) -> f64 {
        match *self {
            TrailingDistance::Absolute(distance) => distance,
            TrailingDistance::Percent(pct) => (pct / 100.0) * current_quote,
        }
    }
}

impl FromStr for TrailingDistance {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self> {
        if !TRAILING_SL_PATTERN.is_match(s) {
            return Err(TrailError::ConfigInvalid(format!(
                "trailingSL must be a number or a percentage, e.g. 46.5 or 2.53% (got {:?})",
                s
            )));
        }

        let parse = |raw: &str| {
            raw.parse::<f64>().map_err(|e| {
                TrailError::ConfigInvalid(format!("unparseable trailingSL {:?}: {}", s, e))
            })
        };

        match s.strip_suffix('%') {
            Some(pct) => Ok(TrailingDistance::Percent(parse(pct)?)),
            None => Ok(TrailingDistance::Absolute(parse(s)?)),
        }
    }
}

/// Replacement values for an existing stop-loss order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewStopLoss {
    pub quote: f64,
    /// Order amount, carried over unchanged.
    pub amount: f64,
}

/// Decide whether the stop-loss order behind `threshold` should be raised.
///
/// Returns the new quote when the gap between the live quote and the recorded
/// stop is larger than the trailing distance plus [`EPSILON`].
pub fn decide(
    distance: &TrailingDistance,
    position: &CurrentPosition,
    threshold: &Threshold,
) -> Option<NewStopLoss> {
    let distance = distance.resolve(position.current_quote);
    let candidate = position.current_quote - distance;
    let current_gap = position.current_quote - threshold.quote;

    if distance + EPSILON < current_gap {
        Some(NewStopLoss {
            quote: candidate,
            amount: threshold.amount,
        })
    } else {
        None
    }
}
