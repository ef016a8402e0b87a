// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The chain client contract the gateway consumes.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{AccountsResponse, DisabledListResponse};

/// Client for the chain's circuit breaker module.
///
/// Implementations own key material, transaction construction and
/// broadcasting. The gateway only ever calls these four operations, each as
/// a single batch, and treats every call as all-or-nothing.
#[async_trait]
pub trait BreakerClient: Send + Sync {
    /// Disable the given message type URLs. Returns the transaction hash.
    async fn trip_circuit_breaker(&self, urls: &[String]) -> Result<String, BreakerClientError>;

    /// Re-enable the given message type URLs. Returns the transaction hash.
    async fn reset_circuit_breaker(&self, urls: &[String]) -> Result<String, BreakerClientError>;

    /// List message type URLs with a tripped circuit.
    async fn list_disabled_commands(&self) -> Result<DisabledListResponse, BreakerClientError>;

    /// List accounts holding circuit breaker permissions.
    async fn accounts(&self) -> Result<AccountsResponse, BreakerClientError>;
}

/// Run a chain client call with an upper bound on its duration.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, BreakerClientError>
where
    F: Future<Output = Result<T, BreakerClientError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| BreakerClientError::Timeout(limit))?
}

/// Errors that can occur during chain client operations.
#[derive(Debug, thiserror::Error)]
pub enum BreakerClientError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Transaction broadcast failed: {0}")]
    Broadcast(String),

    #[error("Transaction signing is not available on this client")]
    SigningUnavailable,

    #[error("Chain call timed out after {0:?}")]
    Timeout(Duration),
}
