// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Circuit breaker query result types.
//!
//! Field names follow the chain's REST (LCD) JSON encoding so results can
//! be passed through to status callers unchanged.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message type URLs whose circuits are currently tripped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DisabledListResponse {
    /// Disabled message type URLs
    #[serde(default)]
    pub disabled_list: Vec<String>,
}

/// Permission level granted to an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Permissions {
    /// Level name (e.g. `LEVEL_SUPER_ADMIN`, `LEVEL_SOME_MSGS`)
    #[serde(default)]
    pub level: String,
    /// Message type URLs the account may act on when the level is limited
    #[serde(default)]
    pub limit_type_urls: Vec<String>,
}

/// An account and the permissions it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountPermissions {
    /// Bech32 account address
    pub address: String,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

/// Pagination cursor returned with paged queries. Opaque to the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageResponse {
    #[serde(default)]
    pub next_key: Option<String>,
    #[serde(default)]
    pub total: Option<String>,
}

/// Accounts holding circuit breaker permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountsResponse {
    #[serde(default)]
    pub accounts: Vec<AccountPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageResponse>,
}
