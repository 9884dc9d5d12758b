// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wire types for the Darwinex REST API.

use serde::{Deserialize, Deserializer};

/// An investor account owned by the authenticated user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvestorAccount {
    pub id: u64,
    pub name: String,
}

/// Kind of conditional order attached to a position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThresholdType {
    StopLoss,
    #[serde(other)]
    Other,
}

/// An existing conditional order on a position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Threshold {
    #[serde(rename = "type")]
    pub kind: ThresholdType,
    #[serde(rename = "orderId", alias = "orderid")]
    pub order_id: u64,
    pub amount: f64,
    pub quote: f64,
}

/// An open position in a Darwin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentPosition {
    #[serde(rename = "productName", alias = "productname")]
    pub product_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub thresholds: Vec<Threshold>,
    #[serde(rename = "currentQuote", alias = "currentquote")]
    pub current_quote: f64,
}

impl CurrentPosition {
    /// Product name without its `.SUFFIX` marker, used to match config rules.
    pub fn base_name(&self) -> &str {
        self.product_name
            .split('.')
            .next()
            .unwrap_or(&self.product_name)
    }

    /// First stop-loss threshold, if any. Later stop-loss entries are ignored.
    pub fn stop_loss(&self) -> Option<&Threshold> {
        self.thresholds
            .iter()
            .find(|t| t.kind == ThresholdType::StopLoss)
    }
}

// The API sends `null` instead of `[]` for positions without orders.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Threshold>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Threshold>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of a conditional order update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionalOrderUpdate {
    pub amount: f64,
    pub quote: f64,
}

impl ConditionalOrderUpdate {
    /// JSON body with both values quoted to two decimals, as the API expects.
    pub fn to_json(&self) -> String {
        format!(
            r#"{{"amount":{:.2},"quote":{:.2}}}"#,
            self.amount, self.quote
        )
    }
}
