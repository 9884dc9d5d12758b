// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! One reconciliation pass: fetch positions, decide, dispatch.
//!
//! Every fetch goes through [`Runner::fetch`], which refreshes the access
//! token at most once per call site. The refreshed config replaces the old
//! one before anything else runs, so all update tasks share a single,
//! already-refreshed set of credentials.

use crate::api::{
    current_positions_path, investor_accounts_path, refresh, CurrentPosition, DarwinexClient,
    InvestorAccount, Outcome,
};
use crate::config::{Config, CredentialStore, TrailingRule};
use crate::error::{Result, TrailError};
use crate::executor::{dispatch, StopLossUpdate};
use crate::position::decide;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Updates derived from one positions snapshot.
#[derive(Debug, Default, PartialEq)]
pub struct Plan {
    pub updates: Vec<StopLossUpdate>,
    /// Rules that matched a position with no stop-loss order.
    pub missing_stop_loss: Vec<String>,
    /// Rules whose stop-loss was looked at.
    pub checked: usize,
}

/// What a run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
    pub missing_stop_loss: usize,
}

/// Join positions against rules and decide which stop-losses move.
pub fn plan_updates(rules: &[TrailingRule], positions: &[CurrentPosition]) -> Result<Plan> {
    let mut plan = Plan::default();

    for position in positions {
        let Some(rule) = rules.iter().find(|r| r.name == position.base_name()) else {
            continue;
        };

        let Some(threshold) = position.stop_loss() else {
            warn!(
                "No stop-loss found for {}, so it can not be updated. Please set a stop-loss order manually in the Darwinex website.",
                rule.name
            );
            plan.missing_stop_loss.push(rule.name.clone());
            continue;
        };

        plan.checked += 1;
        let distance = rule.distance()?;

        match decide(&distance, position, threshold) {
            Some(new_stop) => plan.updates.push(StopLossUpdate {
                darwin: rule.name.clone(),
                order_id: threshold.order_id,
                amount: new_stop.amount,
                quote: new_stop.quote,
            }),
            None => debug!("Stop-loss checked but not modified for {}", rule.name),
        }
    }

    Ok(plan)
}

/// Drives a single run against the API.
pub struct Runner<S: CredentialStore> {
    client: DarwinexClient,
    config: Config,
    store: S,
}

impl<S: CredentialStore> Runner<S> {
    pub fn new(client: DarwinexClient, config: Config, store: S) -> Self {
        Self {
            client,
            config,
            store,
        }
    }

    /// GET `path`, refreshing the token and retrying once on 401.
    async fn fetch<T: DeserializeOwned>(&mut self, call: &str, path: &str) -> Result<T> {
        let mut outcome = self.client.get(path, &self.config.credentials).await;

        if outcome == Outcome::Unauthorized {
            self.config = refresh(&self.client, &self.config, &self.store).await?;
            outcome = self.client.get(path, &self.config.credentials).await;
        }

        match outcome {
            Outcome::Success(body) => {
                serde_json::from_slice(&body).map_err(|source| TrailError::Decode {
                    call: call.to_string(),
                    source,
                })
            }
            Outcome::Unauthorized => Err(TrailError::AuthExpired {
                call: call.to_string(),
            }),
            Outcome::Failure(detail) => Err(TrailError::Transport {
                call: call.to_string(),
                detail,
            }),
        }
    }

    pub async fn investor_accounts(&mut self) -> Result<Vec<InvestorAccount>> {
        self.fetch("investor accounts", &investor_accounts_path())
            .await
    }

    pub async fn current_positions(&mut self, investor_id: u64) -> Result<Vec<CurrentPosition>> {
        self.fetch("current positions", &current_positions_path(investor_id))
            .await
    }

    /// Configured investor id, or the first account the API returns.
    async fn resolve_investor_id(&mut self) -> Result<u64> {
        if let Some(id) = self.config.investor_id() {
            return Ok(id);
        }

        let accounts = self.investor_accounts().await?;
        let first = accounts.first().ok_or(TrailError::NoInvestorAccounts)?;
        warn!(
            "No investorid configured, using the first account: {} ({})",
            first.name, first.id
        );
        Ok(first.id)
    }

    /// Full pass: validate, fetch, decide, dispatch.
    pub async fn run(&mut self) -> Result<RunSummary> {
        self.config.validate()?;

        let investor_id = self.resolve_investor_id().await?;
        let positions = self.current_positions(investor_id).await?;
        debug!("Fetched {} positions for investor {}", positions.len(), investor_id);

        let plan = plan_updates(&self.config.darwins, &positions)?;

        if plan.checked == 0 {
            warn!("No stop-loss order found for any of the Darwins in the config file.");
        }

        let mut summary = RunSummary {
            checked: plan.checked,
            missing_stop_loss: plan.missing_stop_loss.len(),
            ..Default::default()
        };

        if plan.updates.is_empty() {
            info!("No stop-loss updates needed");
            return Ok(summary);
        }

        info!("📤 Submitting {} stop-loss updates", plan.updates.len());
        let credentials = Arc::new(self.config.credentials.clone());
        let outcomes = dispatch(&self.client, investor_id, plan.updates, credentials).await;

        for outcome in &outcomes {
            match &outcome.result {
                Ok(()) => summary.updated += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        "Stop-loss for {} (order {}) left unchanged: {}",
                        outcome.update.darwin, outcome.update.order_id, e
                    );
                }
            }
        }

        info!(
            "📊 Run complete: {} checked, {} updated, {} failed, {} without stop-loss",
            summary.checked, summary.updated, summary.failed, summary.missing_stop_loss
        );
        Ok(summary)
    }
}
