// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Gateway lifecycle
//!
//! Owns the listening socket and the cancellable lifetime of the HTTP server.
//!
//! ```text
//! Created ──serve()──▶ Serving ──stop()──▶ ShuttingDown ──drained──▶ Stopped
//!    │                                                                  ▲
//!    └──────────────────────────stop()──────────────────────────────────┘
//! ```
//!
//! `serve()` blocks until the server fails or `stop()` is called. On
//! cancellation the listener stops accepting and in-flight requests get
//! `shutdown_grace` to finish. Requests still running after that are
//! cancelled and awaited, so no handler outlives `Stopped`. `stop()` returns
//! only once `serve()` has reached `Stopped`.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::api;
use crate::breaker::BreakerClient;
use crate::config::GatewayConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of requests cut off when the drain grace period runs out.
pub const SHUTDOWN_MESSAGE: &str = "gateway shutting down";

/// Where a gateway is in its lifetime. Ordered so waiters can ask for
/// "at least" a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Created,
    Serving,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),

    #[error("Server task failed: {0}")]
    Task(String),

    #[error("Gateway already started")]
    AlreadyStarted,
}

pub struct Gateway {
    state: AppState,
    /// Stops accepting and starts the drain
    shutdown: CancellationToken,
    /// Cancels handlers still running once the grace period is over
    abort: CancellationToken,
    requests: TaskTracker,
    lifecycle: watch::Sender<LifecycleState>,
    started: AtomicBool,
    local_addr: OnceLock<SocketAddr>,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self::from_state(AppState::new(config))
    }

    pub fn from_state(state: AppState) -> Self {
        let (lifecycle, _) = watch::channel(LifecycleState::Created);
        Self {
            state,
            shutdown: CancellationToken::new(),
            abort: CancellationToken::new(),
            requests: TaskTracker::new(),
            lifecycle,
            started: AtomicBool::new(false),
            local_addr: OnceLock::new(),
        }
    }

    /// Bind the chain client. Must happen before `serve()`.
    pub fn with_breaker_client(mut self, client: Arc<dyn BreakerClient>) -> Self {
        self.state = self.state.with_breaker_client(client);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn lifecycle(&self) -> LifecycleState {
        *self.lifecycle.borrow()
    }

    /// The bound socket address, once `serve()` has bound it.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Wait until the lifecycle has reached at least `target`.
    pub async fn wait_for(&self, target: LifecycleState) {
        let mut rx = self.lifecycle.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| *state >= target).await;
    }

    /// Bind the listener and serve until stopped or the server fails.
    ///
    /// Bind failures are returned to the caller. Cancellation via `stop()`
    /// is not an error. Dropping the returned future also shuts the
    /// gateway down and publishes `Stopped`.
    pub async fn serve(&self) -> Result<(), GatewayError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(GatewayError::AlreadyStarted);
        }

        let _stopped = StopOnDrop(self);
        let result = self.run().await;
        info!("Breaker gateway stopped");
        result
    }

    async fn run(&self) -> Result<(), GatewayError> {
        let addr = self.state.config.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        let bound = listener.local_addr().map_err(GatewayError::Serve)?;
        let _ = self.local_addr.set(bound);

        let in_flight = InFlight {
            requests: self.requests.clone(),
            abort: self.abort.clone(),
        };
        let app = api::router(self.state.clone())
            .layer(middleware::from_fn_with_state(in_flight, track_in_flight));
        let shutdown = self.shutdown.clone();
        let mut server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
        });

        self.lifecycle.send_replace(LifecycleState::Serving);
        info!(
            addr = %bound,
            dry_run = self.state.dry_run(),
            breaker_client = self.state.breaker.is_some(),
            "Breaker gateway listening"
        );

        tokio::select! {
            joined = &mut server => server_result(joined),
            _ = self.shutdown.cancelled() => {
                self.lifecycle.send_replace(LifecycleState::ShuttingDown);
                let grace = self.state.config.shutdown_grace;
                info!(grace_ms = grace.as_millis() as u64, "Shutting down, draining in-flight requests");

                match tokio::time::timeout(grace, &mut server).await {
                    Ok(joined) => server_result(joined),
                    Err(_) => {
                        warn!(
                            grace_ms = grace.as_millis() as u64,
                            in_flight = self.requests.len(),
                            "Drain grace period exceeded, cancelling in-flight requests"
                        );
                        self.abort.cancel();
                        self.requests.close();
                        self.requests.wait().await;
                        server.abort();
                        Ok(())
                    }
                }
            }
        }
    }

    /// Signal shutdown and wait for `serve()` to acknowledge it.
    ///
    /// Stopping a gateway that was never started moves it straight to
    /// `Stopped`; a later `serve()` is rejected.
    pub async fn stop(&self) {
        self.shutdown.cancel();

        if !self.started.swap(true, Ordering::SeqCst) {
            self.lifecycle.send_replace(LifecycleState::Stopped);
            return;
        }

        self.wait_for(LifecycleState::Stopped).await;
    }
}

/// Publishes `Stopped` however `serve()` ends, including when its future
/// is dropped mid-flight.
struct StopOnDrop<'a>(&'a Gateway);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.shutdown.cancel();
        self.0.abort.cancel();
        self.0.lifecycle.send_replace(LifecycleState::Stopped);
    }
}

#[derive(Clone)]
struct InFlight {
    requests: TaskTracker,
    abort: CancellationToken,
}

/// Run each request as a tracked future that the drain can cancel.
async fn track_in_flight(
    State(in_flight): State<InFlight>,
    request: Request,
    next: Next,
) -> Response {
    let abort = in_flight.abort.clone();
    in_flight
        .requests
        .track_future(async move {
            tokio::select! {
                biased;
                _ = abort.cancelled() => {
                    ApiError::new(StatusCode::SERVICE_UNAVAILABLE, SHUTDOWN_MESSAGE).into_response()
                }
                response = next.run(request) => response,
            }
        })
        .await
}

fn server_result(joined: Result<io::Result<()>, JoinError>) -> Result<(), GatewayError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(GatewayError::Serve(e)),
        Err(e) => Err(GatewayError::Task(e.to_string())),
    }
}
