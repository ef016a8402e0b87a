// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Circuit breaker chain integration.
//!
//! This module provides:
//! - The `BreakerClient` contract the HTTP handlers call
//! - Query result types for disabled commands and permissioned accounts
//! - An LCD (REST) client for the read-only queries

pub mod client;
pub mod lcd;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use client::{with_timeout, BreakerClient, BreakerClientError};
pub use lcd::LcdBreakerClient;
pub use types::*;
