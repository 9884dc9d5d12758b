// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Authenticated HTTP transport for the Darwinex API.

use crate::api::TokenPair;
use crate::config::Credentials;
use crate::error::{Result, TrailError};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Classified response of an authenticated call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 200 with the raw body.
    Success(Vec<u8>),
    /// 401, the access token has expired.
    Unauthorized,
    /// Any other status, or the request never completed.
    Failure(String),
}

pub fn investor_accounts_path() -> String {
    "/investoraccountinfo/2.0/investoraccounts".to_string()
}

pub fn current_positions_path(investor_id: u64) -> String {
    format!(
        "/investoraccountinfo/2.0/investoraccounts/{}/currentpositions",
        investor_id
    )
}

pub fn conditional_order_path(investor_id: u64, order_id: u64) -> String {
    format!(
        "/trading/1.1/investoraccounts/{}/conditionalorders/{}",
        investor_id, order_id
    )
}

/// Thin client over `reqwest` that knows the API base and how to sign calls.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DarwinexClient {
    http: Client,
    base_url: String,
}

impl DarwinexClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrailError::Transport {
                call: "http client".to_string(),
                detail: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
        request
            .bearer_auth(&credentials.access_token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
    }

    /// Authenticated GET.
    pub async fn get(&self, path: &str, credentials: &Credentials) -> Outcome {
        let request = self.authorized(self.http.get(self.url(path)), credentials);
        Self::classify(request).await
    }

    /// Authenticated PUT with a pre-rendered JSON body.
    pub async fn put(&self, path: &str, body: String, credentials: &Credentials) -> Outcome {
        let request = self.authorized(self.http.put(self.url(path)), credentials).body(body);
        Self::classify(request).await
    }

    async fn classify(request: RequestBuilder) -> Outcome {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Outcome::Failure(e.to_string()),
        };

        match response.status() {
            StatusCode::OK => match response.bytes().await {
                Ok(body) => Outcome::Success(body.to_vec()),
                Err(e) => Outcome::Failure(format!("failed to read body: {}", e)),
            },
            StatusCode::UNAUTHORIZED => Outcome::Unauthorized,
            status => Outcome::Failure(format!("status {}", status)),
        }
    }

    /// Trade the refresh token for a new token pair.
    ///
    /// Any failure here is fatal: there is nothing left to retry with.
    pub async fn refresh_exchange(&self, credentials: &Credentials) -> Result<TokenPair> {
        debug!("Requesting new token pair");

        let response = self
            .http
            .post(self.url("/token"))
            .basic_auth(&credentials.consumer_key, Some(&credentials.consumer_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", credentials.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(TrailError::RefreshRejected {
                status: response.status().to_string(),
            });
        }

        Ok(response.json::<TokenPair>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            access_token: "access".to_string(),
            refresh_token: "old-refresh".to_string(),
            consumer_key: "key".to_string(),
            consumer_secret: "secret".to_string(),
        }
    }

    async fn client(server: &MockServer) -> DarwinexClient {
        DarwinexClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn get_classifies_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .and(header("authorization", "Bearer access"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/expired"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let creds = credentials();

        assert_eq!(
            client.get("/ok", &creds).await,
            Outcome::Success(b"[]".to_vec())
        );
        assert_eq!(client.get("/expired", &creds).await, Outcome::Unauthorized);
        assert!(matches!(
            client.get("/broken", &creds).await,
            Outcome::Failure(_)
        ));
    }

    #[tokio::test]
    async fn connection_error_is_failure() {
        let client =
            DarwinexClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.get("/anything", &credentials()).await,
            Outcome::Failure(_)
        ));
    }

    #[tokio::test]
    async fn refresh_exchange_posts_form_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string(
                "grant_type=refresh_token&refresh_token=old-refresh",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pair = client(&server)
            .await
            .refresh_exchange(&credentials())
            .await
            .unwrap();
        assert_eq!(pair.access_token, "new-access");
        assert_eq!(pair.refresh_token, "new-refresh");
    }

    #[tokio::test]
    async fn refresh_exchange_connection_error_is_fatal() {
        let client =
            DarwinexClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let err = client.refresh_exchange(&credentials()).await.unwrap_err();
        assert!(matches!(err, TrailError::RefreshTransport(_)));
    }

    #[tokio::test]
    async fn refresh_exchange_garbage_body_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .refresh_exchange(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, TrailError::RefreshTransport(_)));
    }

    #[tokio::test]
    async fn refresh_exchange_rejection_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .refresh_exchange(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, TrailError::RefreshRejected { .. }));
    }
}
