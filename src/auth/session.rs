//! Server-side sessions for the cookie strategy.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

const SESSION_ID_LEN: usize = 48;

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl Session {
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: new_session_id(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc()
    }
}

fn new_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> anyhow::Result<()>;

    async fn find(&self, id: &str) -> anyhow::Result<Option<Session>>;

    async fn delete(&self, id: &str) -> anyhow::Result<()>;

    /// Returns the number of removed sessions.
    async fn delete_expired(&self) -> anyhow::Result<u64>;
}

pub struct PgSessionRepository {
    db: PgPool,
}

impl PgSessionRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &Session) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.db)
        .await
        .context("insert session")?;
        Ok(())
    }

    async fn find(&self, id: &str) -> anyhow::Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find session")?;
        Ok(session)
    }

    async fn delete(&self, id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete session")?;
        Ok(())
    }

    async fn delete_expired(&self) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.db)
            .await
            .context("delete expired sessions")?;
        Ok(res.rows_affected())
    }
}

#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, session: &Session) -> anyhow::Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, id: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> anyhow::Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn delete_expired(&self) -> anyhow::Result<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_random_and_long() {
        let a = Session::new(Uuid::new_v4(), Duration::hours(1));
        let b = Session::new(Uuid::new_v4(), Duration::hours(1));
        assert_eq!(a.id.len(), SESSION_ID_LEN);
        assert_ne!(a.id, b.id);
        assert!(a.id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn expiry_follows_ttl() {
        assert!(!Session::new(Uuid::new_v4(), Duration::hours(1)).is_expired());
        assert!(Session::new(Uuid::new_v4(), Duration::seconds(-1)).is_expired());
    }

    #[tokio::test]
    async fn memory_repo_create_find_delete() {
        let repo = MemorySessionRepository::default();
        let session = Session::new(Uuid::new_v4(), Duration::hours(1));
        repo.create(&session).await.unwrap();

        let found = repo.find(&session.id).await.unwrap().expect("stored");
        assert_eq!(found.user_id, session.user_id);

        repo.delete(&session.id).await.unwrap();
        assert!(repo.find(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_repo_sweeps_only_expired() {
        let repo = MemorySessionRepository::default();
        let live = Session::new(Uuid::new_v4(), Duration::hours(1));
        let dead = Session::new(Uuid::new_v4(), Duration::seconds(-5));
        repo.create(&live).await.unwrap();
        repo.create(&dead).await.unwrap();

        assert_eq!(repo.delete_expired().await.unwrap(), 1);
        assert!(repo.find(&live.id).await.unwrap().is_some());
        assert!(repo.find(&dead.id).await.unwrap().is_none());
    }
}
