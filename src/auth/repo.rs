use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User, UserChanges};
use crate::db::RepoError;

/// Credential store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by (already normalized) email.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Insert a user. Fails with `DuplicateEmail` if the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError>;

    /// Apply a profile patch. `Ok(None)` when the user does not exist.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "insert user"))
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name          = COALESCE($2, name),
                   email         = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   updated_at    = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "update user"))
    }
}

/// Process-local credential store, used when no `DATABASE_URL` is configured.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(RepoError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(RepoError::DuplicateEmail);
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann Lee".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn memory_repo_rejects_duplicate_email() {
        let repo = MemoryUserRepository::default();
        repo.create(new_user("ann@example.com")).await.unwrap();
        let err = repo.create(new_user("ann@example.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::DuplicateEmail));
    }

    #[tokio::test]
    async fn memory_repo_update_applies_only_supplied_fields() {
        let repo = MemoryUserRepository::default();
        let user = repo.create(new_user("ann@example.com")).await.unwrap();

        let updated = repo
            .update(
                user.id,
                UserChanges {
                    name: Some("Ann Smith".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .expect("user exists");

        assert_eq!(updated.name, "Ann Smith");
        assert_eq!(updated.email, "ann@example.com");
        assert_eq!(updated.password_hash, "hash");
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn memory_repo_update_rejects_email_of_other_user() {
        let repo = MemoryUserRepository::default();
        repo.create(new_user("ann@example.com")).await.unwrap();
        let bob = repo.create(new_user("bob@example.com")).await.unwrap();

        let err = repo
            .update(
                bob.id,
                UserChanges {
                    email: Some("ann@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::DuplicateEmail));
    }

    #[tokio::test]
    async fn memory_repo_update_unknown_user_is_none() {
        let repo = MemoryUserRepository::default();
        let res = repo.update(Uuid::new_v4(), UserChanges::default()).await.unwrap();
        assert!(res.is_none());
    }
}
