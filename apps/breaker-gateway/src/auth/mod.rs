// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for the mutating gateway routes.
//!
//! ## Auth Flow
//!
//! 1. An operator issues a token with the `issue-token` binary
//! 2. The caller sends `Authorization: Bearer: <token>`
//! 3. The gateway:
//!    - Verifies the HS256 signature against the shared secret
//!    - Checks the token is inside its `[iat, exp)` window
//!    - Requires the configured identifier claim, when one is set
//!
//! ## Security
//!
//! - The signing secret never leaves `TokenService` and is redacted from `Debug`
//! - Tokens cannot be revoked; keep the validity window short
//! - Any failure answers 401 and stops the request

pub mod claims;
pub mod error;
pub mod middleware;
pub mod token;

pub use claims::TokenClaims;
pub use error::AuthError;
pub use middleware::require_token;
pub use token::TokenService;
