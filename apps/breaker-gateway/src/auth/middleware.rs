// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied with `route_layer` to the route groups that need a token:
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/webhook", post(webhook::handle_webhook_v1))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_token));
//! ```
//!
//! The request is forwarded untouched on success. Claims are only used for
//! the gate itself; handlers never see them.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{claims::TokenClaims, AuthError, TokenService};
use crate::state::AppState;

/// Extract the token from an authorization header value.
///
/// Accepts `Bearer: <token>` (the form existing clients send) as well as
/// `Bearer <token>`. The scheme is case-insensitive.
pub fn bearer_token(value: &str) -> Option<&str> {
    let scheme = value.get(..6)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let rest = &value[6..];
    let rest = if let Some(stripped) = rest.strip_prefix(':') {
        stripped
    } else if rest.starts_with(char::is_whitespace) {
        rest
    } else {
        return None;
    };

    let token = rest.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Verify the bearer token carried by `headers`.
pub fn authorize(headers: &HeaderMap, tokens: &TokenService) -> Result<TokenClaims, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = bearer_token(header).ok_or(AuthError::InvalidAuthHeader)?;
    tokens.authenticate(token)
}

/// Authentication middleware function.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match authorize(request.headers(), &state.tokens) {
        Ok(_) => next.run(request).await,
        Err(e) => {
            tracing::warn!(
                error_code = e.error_code(),
                path = %request.uri().path(),
                "Rejected unauthenticated request"
            );
            e.into_response()
        }
    }
}
