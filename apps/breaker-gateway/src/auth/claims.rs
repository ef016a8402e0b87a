// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claims carried by gateway bearer tokens.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded token claims.
///
/// `iat` and `exp` are always present on tokens the gateway issues; every
/// other claim (the identifier claim and any caller-supplied extras) lands
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds), always `iat + validity window`
    pub exp: i64,
    /// Remaining claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Look up a non-standard claim.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Whether `name` holds a usable identifier: present, not null and,
    /// for strings, not empty.
    pub fn has_identifier(&self, name: &str) -> bool {
        match self.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Whether `now` falls inside `[iat, exp)`.
    pub fn is_live_at(&self, now: i64) -> bool {
        self.iat <= now && now < self.exp
    }
}
