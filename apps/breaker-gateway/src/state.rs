// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenService;
use crate::breaker::BreakerClient;
use crate::config::GatewayConfig;

/// Shared request handler state.
///
/// Built before the listener starts and never mutated afterwards, so
/// handlers read it without locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub tokens: Arc<TokenService>,
    /// Chain client, when one has been bound
    pub breaker: Option<Arc<dyn BreakerClient>>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let tokens = TokenService::new(
            &config.token_secret,
            config.identifier_field.as_deref(),
            config.token_validity_secs,
        );
        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            breaker: None,
        }
    }

    /// Bind the chain client used by the webhook and status handlers.
    pub fn with_breaker_client(mut self, client: Arc<dyn BreakerClient>) -> Self {
        self.breaker = Some(client);
        self
    }

    pub fn dry_run(&self) -> bool {
        self.config.dry_run
    }
}
