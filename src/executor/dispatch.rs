// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Concurrent submission of stop-loss updates.
//!
//! One task per update, all joined before returning. A failing update never
//! affects its siblings.

use crate::api::{conditional_order_path, ConditionalOrderUpdate, DarwinexClient, Outcome};
use crate::config::Credentials;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A stop-loss order that should be moved.
#[derive(Debug, Clone, PartialEq)]
pub struct StopLossUpdate {
    /// Configured Darwin name the update belongs to.
    pub darwin: String,
    pub order_id: u64,
    pub amount: f64,
    pub quote: f64,
}

/// Result of one submitted update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub update: StopLossUpdate,
    pub result: Result<(), String>,
}

/// Submit every update in parallel and wait for all of them.
///
/// Outcomes are returned in the same order as `updates`.
pub async fn dispatch(
    client: &DarwinexClient,
    investor_id: u64,
    updates: Vec<StopLossUpdate>,
    credentials: Arc<Credentials>,
) -> Vec<UpdateOutcome> {
    let handles: Vec<_> = updates
        .iter()
        .cloned()
        .map(|update| {
            let client = client.clone();
            let credentials = Arc::clone(&credentials);
            tokio::spawn(async move {
                let result = submit(&client, investor_id, &update, &credentials).await;
                UpdateOutcome { update, result }
            })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .zip(updates)
        .map(|(joined, update)| match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Update task for {} did not complete: {}", update.darwin, e);
                UpdateOutcome {
                    update,
                    result: Err(format!("task failed: {}", e)),
                }
            }
        })
        .collect()
}

async fn submit(
    client: &DarwinexClient,
    investor_id: u64,
    update: &StopLossUpdate,
    credentials: &Credentials,
) -> Result<(), String> {
    let path = conditional_order_path(investor_id, update.order_id);
    let body = ConditionalOrderUpdate {
        amount: update.amount,
        quote: update.quote,
    }
    .to_json();

    match client.put(&path, body, credentials).await {
        Outcome::Success(_) => {
            info!(
                "✅ Trailing stop-loss order updated for {}. New stop-loss value: {:.2}",
                update.darwin, update.quote
            );
            Ok(())
        }
        Outcome::Unauthorized => {
            warn!(
                "❌ Unauthorized while updating the trailing stop-loss order for {}",
                update.darwin
            );
            Err("unauthorized".to_string())
        }
        Outcome::Failure(detail) => {
            warn!(
                "❌ Error while updating the trailing stop-loss order for {}: {}",
                update.darwin, detail
            );
            Err(detail)
        }
    }
}
