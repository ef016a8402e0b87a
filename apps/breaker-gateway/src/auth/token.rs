// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issuing and verifying gateway bearer tokens.
//!
//! Tokens are HS256 JWTs signed with a process-held secret. A token is live
//! for `[iat, iat + validity)`; there is no revocation list, expiry is the
//! only way a token stops working.

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

use super::{claims::TokenClaims, AuthError};

/// Issues and verifies bearer tokens.
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    identifier_field: Option<String>,
    validity_secs: u64,
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Arguments
    /// - `secret`: shared HMAC secret
    /// - `identifier_field`: claim every token must carry; `None` or empty disables the check
    /// - `validity_secs`: lifetime of issued tokens
    pub fn new(secret: &str, identifier_field: Option<&str>, validity_secs: u64) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            identifier_field: identifier_field
                .filter(|f| !f.is_empty())
                .map(str::to_string),
            validity_secs,
        }
    }

    /// Configured identifier claim, if any.
    pub fn identifier_field(&self) -> Option<&str> {
        self.identifier_field.as_deref()
    }

    pub fn validity_secs(&self) -> u64 {
        self.validity_secs
    }

    /// Issue a token valid from now.
    pub fn issue(
        &self,
        identifier: &str,
        extra_claims: Option<Map<String, Value>>,
    ) -> Result<String, AuthError> {
        self.issue_at(identifier, extra_claims, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        identifier: &str,
        extra_claims: Option<Map<String, Value>>,
        now: i64,
    ) -> Result<String, AuthError> {
        let mut extra = extra_claims.unwrap_or_default();
        extra.remove("iat");
        extra.remove("exp");

        if let Some(field) = &self.identifier_field {
            if !identifier.is_empty() {
                extra.insert(field.clone(), Value::String(identifier.to_string()));
            }
        }

        let validity = i64::try_from(self.validity_secs).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            iat: now,
            exp: now.saturating_add(validity),
            extra,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::EncodingFailure(e.to_string()))
    }

    /// Verify signature and time claims at the current time.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.decode_at(token, Utc::now().timestamp())
    }

    /// Verify signature and time claims as if the current time were `now`.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<TokenClaims, AuthError> {
        // Time claims are checked below against `now` so the window is exact.
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                _ => AuthError::MalformedToken,
            })?
            .claims;

        if !claims.is_live_at(now) {
            return Err(if now < claims.iat {
                AuthError::TokenNotYetValid
            } else {
                AuthError::TokenExpired
            });
        }
        if let Some(nbf) = claims.get("nbf").and_then(Value::as_i64) {
            if now < nbf {
                return Err(AuthError::TokenNotYetValid);
            }
        }

        Ok(claims)
    }

    /// Check the decoded claim set against the identifier policy.
    pub fn validate(&self, claims: &TokenClaims) -> Result<(), AuthError> {
        match &self.identifier_field {
            Some(field) if !claims.has_identifier(field) => {
                Err(AuthError::MissingIdentifierClaim(field.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Decode and validate in one step.
    pub fn authenticate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.decode(token)?;
        self.validate(&claims)?;
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("identifier_field", &self.identifier_field)
            .field("validity_secs", &self.validity_secs)
            .finish_non_exhaustive()
    }
}
