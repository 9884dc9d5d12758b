// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Access token refresh.

use crate::api::DarwinexClient;
use crate::config::{Config, CredentialStore};
use crate::error::Result;
use tracing::info;

/// Exchange the refresh token for a new pair and persist it.
///
/// The returned config is the one every later call must use. It is written
/// to `store` before being handed back so the next run starts from it.
pub async fn refresh<S: CredentialStore + ?Sized>(
    client: &DarwinexClient,
    config: &Config,
    store: &S,
) -> Result<Config> {
    info!("🔑 Expired authentication token. Refreshing...");

    let pair = client.refresh_exchange(&config.credentials).await?;

    let mut refreshed = config.clone();
    refreshed.credentials.access_token = pair.access_token;
    refreshed.credentials.refresh_token = pair.refresh_token;

    store.save(&refreshed)?;
    info!("💾 New authentication tokens saved");

    Ok(refreshed)
}
