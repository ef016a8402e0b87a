// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use breaker_gateway::{
    breaker::LcdBreakerClient,
    config::{redact_url, GatewayConfig},
    gateway::Gateway,
    logging::init_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(config = ?config, "Loaded configuration");

    let lcd_client = match config.lcd_url.as_deref() {
        Some(url) => match LcdBreakerClient::new(url, config.chain_call_timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build LCD client");
                return ExitCode::FAILURE;
            }
        },
        None => {
            tracing::warn!("No LCD endpoint configured; chain calls will be rejected");
            None
        }
    };

    let mut gateway = Gateway::new(config);
    if let Some(client) = lcd_client {
        tracing::info!(base_url = %redact_url(client.base_url()), "Bound LCD breaker client");
        gateway = gateway.with_breaker_client(Arc::new(client));
    }
    let gateway = Arc::new(gateway);

    {
        let gateway = gateway.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received");
            gateway.stop().await;
        });
    }

    match gateway.serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
