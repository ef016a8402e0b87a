// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only circuit breaker status endpoints.
//!
//! These routes are public unless `status_requires_auth` is set.

use axum::{extract::State, Json};

use crate::{
    breaker::{with_timeout, AccountsResponse, DisabledListResponse},
    error::ApiError,
    state::AppState,
};

/// List message type URLs whose circuits are tripped.
#[utoipa::path(
    get,
    path = "/v1/status/listDisabledCommands",
    tag = "Status",
    responses(
        (status = 200, description = "Disabled message type URLs", body = DisabledListResponse),
        (status = 500, description = "Query failed or no breaker client configured")
    )
)]
pub async fn list_disabled_commands(
    State(state): State<AppState>,
) -> Result<Json<DisabledListResponse>, ApiError> {
    let client = state.breaker.as_ref().ok_or_else(ApiError::no_client)?;

    with_timeout(state.config.chain_call_timeout, client.list_disabled_commands())
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list disabled commands");
            ApiError::internal("failed to list disabled commands")
        })
}

/// List accounts holding circuit breaker permissions.
#[utoipa::path(
    get,
    path = "/v1/status/accounts",
    tag = "Status",
    responses(
        (status = 200, description = "Permissioned accounts", body = AccountsResponse),
        (status = 500, description = "Query failed or no breaker client configured")
    )
)]
pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<AccountsResponse>, ApiError> {
    let client = state.breaker.as_ref().ok_or_else(ApiError::no_client)?;

    with_timeout(state.config.chain_call_timeout, client.accounts())
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list accounts");
            ApiError::internal("failed to list accounts")
        })
}
