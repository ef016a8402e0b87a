// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issue a bearer token for the gateway.
//!
//! Reads the same environment as the gateway plus `BREAKER_TOKEN_IDENTIFIER`
//! and prints the token on stdout. Logs go to stderr and never include the
//! token.

use std::process::ExitCode;

use breaker_gateway::{
    auth::TokenService,
    config::{GatewayConfig, TOKEN_IDENTIFIER_ENV},
    logging::init_tracing_stderr,
};

fn main() -> ExitCode {
    init_tracing_stderr();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let identifier = std::env::var(TOKEN_IDENTIFIER_ENV).unwrap_or_default();

    let tokens = TokenService::new(
        &config.token_secret,
        config.identifier_field.as_deref(),
        config.token_validity_secs,
    );

    match tokens.issue(&identifier, None) {
        Ok(token) => {
            tracing::info!(
                identifier_field = ?config.identifier_field,
                validity_secs = config.token_validity_secs,
                "Issued token"
            );
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue token");
            ExitCode::FAILURE
        }
    }
}
