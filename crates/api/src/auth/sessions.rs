//! Session lookup
//!
//! Sessions are issued by the auth service and stored in the `sessions`
//! table. This side only reads them: a token resolves to its user while
//! `expires_at` lies in the future.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::middleware::AuthUser;

#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolve a session token to its user. `Ok(None)` for unknown or expired tokens.
    async fn resolve(&self, token: &str) -> Result<Option<AuthUser>, sqlx::Error>;
}

#[derive(Debug, FromRow)]
struct SessionUserRow {
    user_id: String,
    email: String,
}

#[derive(Clone)]
pub struct PgSessionResolver {
    pool: PgPool,
}

impl PgSessionResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionResolver for PgSessionResolver {
    async fn resolve(&self, token: &str) -> Result<Option<AuthUser>, sqlx::Error> {
        let row: Option<SessionUserRow> = sqlx::query_as(
            r#"
            SELECT u.id AS user_id, u.email
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
              AND s.expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| AuthUser {
            id: row.user_id,
            email: row.email,
        }))
    }
}

/// Process-local sessions for development and tests
#[derive(Default)]
pub struct InMemorySessionResolver {
    sessions: RwLock<HashMap<String, (AuthUser, OffsetDateTime)>>,
}

impl InMemorySessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, token: impl Into<String>, user: AuthUser, expires_at: OffsetDateTime) {
        self.sessions
            .write()
            .await
            .insert(token.into(), (user, expires_at));
    }
}

#[async_trait]
impl SessionResolver for InMemorySessionResolver {
    async fn resolve(&self, token: &str) -> Result<Option<AuthUser>, sqlx::Error> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .sessions
            .read()
            .await
            .get(token)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(user, _)| user.clone()))
    }
}
