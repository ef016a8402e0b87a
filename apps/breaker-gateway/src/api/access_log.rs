// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request access logging.
//!
//! Runs inside the request-id layer so every line carries the id, and
//! outside authentication so rejected requests are logged with their 401.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    http::header::USER_AGENT,
    middleware::Next,
    response::Response,
};
use tower_http::request_id::RequestId;

pub async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let real_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(request).await;

    tracing::info!(
        path = %path,
        query = %query,
        method = %method,
        user_agent = %user_agent,
        status = response.status().as_u16(),
        took_ms = start.elapsed().as_millis() as u64,
        real_ip = %real_ip,
        request_id = %request_id,
        "request completed"
    );

    response
}
