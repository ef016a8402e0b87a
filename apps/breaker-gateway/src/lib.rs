// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Breaker Gateway - Authenticated Circuit Breaker Webhook Service
//!
//! Accepts bearer-token authenticated webhook calls and turns them into
//! trip/reset operations against a chain's circuit breaker module. Also
//! serves read-only status queries.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and router (Axum)
//! - `auth` - HS256 bearer tokens and the request gate
//! - `breaker` - Chain client contract and the LCD query adapter
//! - `gateway` - Listener ownership, cancellation, and drain
//! - `config` - Environment-driven configuration
//! - `logging` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod breaker;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod state;
