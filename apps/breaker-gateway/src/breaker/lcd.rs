// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain client backed by the node's REST (LCD) interface.
//!
//! Answers the read-only circuit breaker queries. Tripping and resetting
//! need a transaction signer, which this client does not hold; those calls
//! fail with [`BreakerClientError::SigningUnavailable`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::client::{BreakerClient, BreakerClientError};
use super::types::{AccountsResponse, DisabledListResponse};

const DISABLE_LIST_PATH: &str = "cosmos/circuit/v1/disable_list";
const ACCOUNTS_PATH: &str = "cosmos/circuit/v1/accounts";

/// LCD-backed circuit breaker client.
#[derive(Clone)]
pub struct LcdBreakerClient {
    base_url: String,
    client: reqwest::Client,
}

impl LcdBreakerClient {
    /// Create a client for the given REST endpoint (e.g. `http://127.0.0.1:1317`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BreakerClientError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| BreakerClientError::InvalidUrl(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BreakerClientError::Query(e.to_string()))?;

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BreakerClientError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(path, "Querying chain REST endpoint");

        // reqwest errors carry the full URL, which may include userinfo.
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BreakerClientError::Query(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(BreakerClientError::Query(format!(
                "HTTP {} from {path}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BreakerClientError::Query(e.without_url().to_string()))
    }
}

#[async_trait]
impl BreakerClient for LcdBreakerClient {
    async fn trip_circuit_breaker(&self, _urls: &[String]) -> Result<String, BreakerClientError> {
        Err(BreakerClientError::SigningUnavailable)
    }

    async fn reset_circuit_breaker(&self, _urls: &[String]) -> Result<String, BreakerClientError> {
        Err(BreakerClientError::SigningUnavailable)
    }

    async fn list_disabled_commands(&self) -> Result<DisabledListResponse, BreakerClientError> {
        self.get_json(DISABLE_LIST_PATH).await
    }

    async fn accounts(&self) -> Result<AccountsResponse, BreakerClientError> {
        self.get_json(ACCOUNTS_PATH).await
    }
}
