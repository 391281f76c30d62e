//! Password hashing, bearer sessions and the `AuthUser` extractor.
//!
//! Tokens are opaque random strings kept in memory with an expiry. Access tokens
//! authorize requests; refresh tokens can only be traded for a new pair and are
//! consumed in the process.

use std::collections::HashMap;
use std::fmt::Write as _;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use parking_lot::RwLock;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::api::AppState;
use crate::error::AppError;
use crate::models::{Id, Tokens};

/// Pluggable password hashing so the digest scheme can be swapped.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Salted, iterated SHA-256 stored as `sha256$<rounds>$<salt>$<digest>`.
pub struct Sha256Hasher {
    rounds: u32,
}

impl Sha256Hasher {
    pub const DEFAULT_ROUNDS: u32 = 10_000;

    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    fn digest(&self, salt: &str, password: &str, rounds: u32) -> String {
        let mut acc: Vec<u8> = Sha256::new()
            .chain_update(salt.as_bytes())
            .chain_update(password.as_bytes())
            .finalize()
            .to_vec();
        for _ in 1..rounds {
            acc = Sha256::new()
                .chain_update(&acc)
                .chain_update(salt.as_bytes())
                .finalize()
                .to_vec();
        }
        to_hex(&acc)
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROUNDS)
    }
}

impl PasswordHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> String {
        let salt = random_hex(16);
        let digest = self.digest(&salt, password, self.rounds);
        format!("sha256${}${salt}${digest}", self.rounds)
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let mut parts = stored.split('$');
        let (Some("sha256"), Some(rounds), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        let Ok(rounds) = rounds.parse::<u32>() else {
            return false;
        };
        let actual = self.digest(salt, password, rounds.max(1));
        constant_time_eq(actual.as_bytes(), expected.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn random_hex(n_bytes: usize) -> String {
    let mut buf = vec![0u8; n_bytes];
    rand::rng().fill(buf.as_mut_slice());
    to_hex(&buf)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone)]
struct Session {
    user_id: Id,
    kind: TokenKind,
    expires_at: DateTime<Utc>,
}

/// In-memory token table.
pub struct Sessions {
    inner: RwLock<HashMap<String, Session>>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl Sessions {
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue a fresh access/refresh pair.
    pub fn issue(&self, user_id: Id) -> Tokens {
        let now = Utc::now();
        let access = random_hex(32);
        let refresh = random_hex(32);

        let mut map = self.inner.write();
        map.retain(|_, s| s.expires_at > now);
        map.insert(
            access.clone(),
            Session {
                user_id,
                kind: TokenKind::Access,
                expires_at: now + self.access_ttl,
            },
        );
        map.insert(
            refresh.clone(),
            Session {
                user_id,
                kind: TokenKind::Refresh,
                expires_at: now + self.refresh_ttl,
            },
        );
        debug!(user_id, "session issued");

        Tokens {
            access_token: access,
            refresh_token: refresh,
            token_type: "bearer".to_string(),
        }
    }

    /// Resolve a token of the given kind to its user.
    pub fn resolve(&self, token: &str, kind: TokenKind) -> Result<Id, AppError> {
        let map = self.inner.read();
        let s = map
            .get(token)
            .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".into()))?;
        if s.kind != kind {
            return Err(AppError::Unauthorized("Invalid token type".into()));
        }
        if s.expires_at <= Utc::now() {
            return Err(AppError::Unauthorized("Token expired".into()));
        }
        Ok(s.user_id)
    }

    /// Trade a refresh token for a new pair. The old refresh token stops working.
    pub fn refresh(&self, refresh_token: &str) -> Result<(Id, Tokens), AppError> {
        let user_id = {
            let mut map = self.inner.write();
            let s = map
                .get(refresh_token)
                .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;
            if s.kind != TokenKind::Refresh {
                return Err(AppError::Unauthorized("Invalid refresh token type".into()));
            }
            if s.expires_at <= Utc::now() {
                return Err(AppError::Unauthorized("Refresh token expired".into()));
            }
            let id = s.user_id;
            map.remove(refresh_token);
            id
        };
        Ok((user_id, self.issue(user_id)))
    }
}

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Id);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let result = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))
            .and_then(|token| state.sessions.resolve(token, TokenKind::Access))
            .and_then(|id| {
                state
                    .store
                    .user(id)
                    .map(|u| AuthUser(u.id))
                    .ok_or_else(|| AppError::Unauthorized("User not found".into()))
            });
        if result.is_err() {
            counter!("http_auth_failures_total").increment(1);
        }
        result
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrip_and_mismatch() {
        let h = Sha256Hasher::new(50);
        let stored = h.hash("correct horse");
        assert!(stored.starts_with("sha256$50$"));
        assert!(h.verify("correct horse", &stored));
        assert!(!h.verify("wrong horse", &stored));
        assert!(!h.verify("correct horse", "garbage"));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let h = Sha256Hasher::new(2);
        assert_ne!(h.hash("pw"), h.hash("pw"));
    }

    #[test]
    fn access_and_refresh_tokens_are_not_interchangeable() {
        let s = Sessions::new(Duration::minutes(5), Duration::days(1));
        let t = s.issue(7);
        assert_eq!(s.resolve(&t.access_token, TokenKind::Access).unwrap(), 7);
        assert!(s.resolve(&t.refresh_token, TokenKind::Access).is_err());
        assert!(s.resolve(&t.access_token, TokenKind::Refresh).is_err());
        assert!(s.resolve("nope", TokenKind::Access).is_err());
    }

    #[test]
    fn refresh_rotates_the_refresh_token() {
        let s = Sessions::new(Duration::minutes(5), Duration::days(1));
        let t = s.issue(3);
        let (uid, t2) = s.refresh(&t.refresh_token).unwrap();
        assert_eq!(uid, 3);
        assert_ne!(t2.access_token, t.access_token);
        assert!(s.refresh(&t.refresh_token).is_err());
        assert!(s.refresh(&t2.refresh_token).is_ok());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let s = Sessions::new(Duration::seconds(-1), Duration::days(1));
        let t = s.issue(1);
        assert!(matches!(
            s.resolve(&t.access_token, TokenKind::Access),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn bearer_header_parsing() {
        let req = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer abc123")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(bearer_token(&parts), Some("abc123"));

        let req = axum::http::Request::builder()
            .header(AUTHORIZATION, "Basic abc123")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(bearer_token(&parts), None);
    }
}
