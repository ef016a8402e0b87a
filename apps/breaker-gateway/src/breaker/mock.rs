// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory chain client used by handler and lifecycle tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::client::{BreakerClient, BreakerClientError};
use super::types::{AccountPermissions, AccountsResponse, DisabledListResponse, Permissions};

/// Records every call and answers with canned results.
#[derive(Default)]
pub struct MockBreakerClient {
    trip_calls: AtomicUsize,
    reset_calls: AtomicUsize,
    query_calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MockBreakerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a broadcast/query error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Every call sleeps for `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn trip_calls(&self) -> usize {
        self.trip_calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) -> usize {
        self.reset_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Total number of calls of any kind.
    pub fn calls(&self) -> usize {
        self.trip_calls() + self.reset_calls() + self.query_calls()
    }

    /// URL batches passed to trip/reset, in call order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    async fn broadcast(&self, kind: &str, urls: &[String]) -> Result<String, BreakerClientError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut batches = self.batches.lock().unwrap();
        batches.push(urls.to_vec());
        match &self.failure {
            Some(message) => Err(BreakerClientError::Broadcast(message.clone())),
            None => Ok(format!("{kind}TX{:04}", batches.len())),
        }
    }

    async fn query(&self) -> Result<(), BreakerClientError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(BreakerClientError::Query(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BreakerClient for MockBreakerClient {
    async fn trip_circuit_breaker(&self, urls: &[String]) -> Result<String, BreakerClientError> {
        self.trip_calls.fetch_add(1, Ordering::SeqCst);
        self.broadcast("TRIP", urls).await
    }

    async fn reset_circuit_breaker(&self, urls: &[String]) -> Result<String, BreakerClientError> {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        self.broadcast("RESET", urls).await
    }

    async fn list_disabled_commands(&self) -> Result<DisabledListResponse, BreakerClientError> {
        self.query().await?;
        Ok(DisabledListResponse {
            disabled_list: vec!["/cosmos.circuit.v1.MsgAuthorizeCircuitBreaker".to_string()],
        })
    }

    async fn accounts(&self) -> Result<AccountsResponse, BreakerClientError> {
        self.query().await?;
        Ok(AccountsResponse {
            accounts: vec![AccountPermissions {
                address: "cosmos1operator".to_string(),
                permissions: Some(Permissions {
                    level: "LEVEL_SUPER_ADMIN".to_string(),
                    limit_type_urls: Vec::new(),
                }),
            }],
            pagination: None,
        })
    }
}
