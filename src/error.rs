// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error types for a trailing stop-loss run.
//!
//! Every fatal condition is a [`TrailError`] value that bubbles up to `main`,
//! which is the only place that decides the process exit status.

use thiserror::Error;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum TrailError {
    /// Missing field, empty credential or malformed trailing rule.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the expected shape.
    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Config could not be rendered as JSON for saving.
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[source] serde_json::Error),

    /// Refreshed credentials could not be written back.
    #[error("failed to save config file {path}: {source}")]
    ConfigWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Still unauthorized after the one allowed refresh.
    #[error("{call}: still unauthorized after refreshing the access token")]
    AuthExpired { call: String },

    /// The accounts endpoint returned an empty list.
    #[error("no investor accounts available for these credentials")]
    NoInvestorAccounts,

    /// Non-200/401 response or connection failure on a fetch.
    #[error("{call}: {detail}")]
    Transport { call: String, detail: String },

    /// The token endpoint answered with something other than 200.
    #[error("token refresh rejected with status {status}")]
    RefreshRejected { status: String },

    /// The token endpoint could not be reached or answered garbage.
    #[error("token refresh failed: {0}")]
    RefreshTransport(#[from] reqwest::Error),

    /// A 200 response whose body did not match the expected JSON.
    #[error("failed to parse {call} response: {source}")]
    Decode {
        call: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, TrailError>;
