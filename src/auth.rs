//! Capability gates over a pluggable access policy.
//!
//! The `Caller` extractor resolves the `Authorization: Bearer <token>` header through the
//! state's `AccessPolicy`; handlers then check the entity's `Gate`.

use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::collections::HashMap;

pub const NOT_AUTHORIZED: &str = "User not authorized";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub role: Role,
    pub verified: bool,
}

/// Resolves a bearer token to a caller.
pub trait AccessPolicy: Send + Sync {
    fn resolve(&self, token: &str) -> Option<Caller>;
}

/// Fixed token table, built from settings.
#[derive(Clone, Debug, Default)]
pub struct StaticTokenPolicy {
    tokens: HashMap<String, Caller>,
}

impl StaticTokenPolicy {
    pub fn new(admin_tokens: &[String], user_tokens: &[String]) -> Self {
        let mut tokens = HashMap::new();
        for t in user_tokens {
            tokens.insert(t.clone(), Caller { role: Role::User, verified: true });
        }
        for t in admin_tokens {
            tokens.insert(t.clone(), Caller { role: Role::Admin, verified: true });
        }
        StaticTokenPolicy { tokens }
    }
}

impl AccessPolicy for StaticTokenPolicy {
    fn resolve(&self, token: &str) -> Option<Caller> {
        self.tokens.get(token).cloned()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Verified,
    User,
    Admin,
}

impl Gate {
    pub fn check(&self, caller: Option<&Caller>) -> Result<(), AppError> {
        let allowed = match (self, caller) {
            (_, None) => false,
            (Gate::Verified, Some(c)) => c.verified,
            (Gate::User, Some(c)) => c.verified && matches!(c.role, Role::User | Role::Admin),
            (Gate::Admin, Some(c)) => c.role == Role::Admin,
        };
        if allowed {
            Ok(())
        } else {
            Err(AppError::Unauthorized(NOT_AUTHORIZED.into()))
        }
    }
}

/// Optional authenticated caller. Unknown tokens resolve to `None`.
#[derive(Clone, Debug)]
pub struct MaybeCaller(pub Option<Caller>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeCaller {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|token| state.policy.resolve(token));
        Ok(MaybeCaller(caller))
    }
}
