use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::locations::repo_types::{Location, LocationFields};

/// Location store. Every lookup after creation is scoped to `(id, user_id)`, so a
/// location owned by someone else behaves exactly like one that does not exist.
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, fields: LocationFields) -> anyhow::Result<Location>;

    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Location>>;

    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Location>>;

    async fn update_owned(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: LocationFields,
    ) -> anyhow::Result<Option<Location>>;

    /// `false` when nothing matched.
    async fn delete_owned(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
}

const LOCATION_COLUMNS: &str = "id, user_id, city, country, latitude, longitude, nickname, \
                                is_favorite, created_at, updated_at";

pub struct PgLocationRepository {
    db: PgPool,
}

impl PgLocationRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocationRepository for PgLocationRepository {
    async fn create(&self, user_id: Uuid, fields: LocationFields) -> anyhow::Result<Location> {
        let location = sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO locations (id, user_id, city, country, latitude, longitude, nickname, is_favorite)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(fields.city)
        .bind(fields.country)
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(fields.nickname)
        .bind(fields.is_favorite)
        .fetch_one(&self.db)
        .await
        .context("insert location")?;
        Ok(location)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Location>> {
        let rows = sqlx::query_as::<_, Location>(&format!(
            r#"
            SELECT {LOCATION_COLUMNS}
            FROM locations
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list locations by user")?;
        Ok(rows)
    }

    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Location>> {
        let row = sqlx::query_as::<_, Location>(&format!(
            r#"
            SELECT {LOCATION_COLUMNS}
            FROM locations
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find location")?;
        Ok(row)
    }

    async fn update_owned(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: LocationFields,
    ) -> anyhow::Result<Option<Location>> {
        let row = sqlx::query_as::<_, Location>(&format!(
            r#"
            UPDATE locations
               SET city = $3, country = $4, latitude = $5, longitude = $6,
                   nickname = $7, is_favorite = $8, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(fields.city)
        .bind(fields.country)
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(fields.nickname)
        .bind(fields.is_favorite)
        .fetch_optional(&self.db)
        .await
        .context("update location")?;
        Ok(row)
    }

    async fn delete_owned(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM locations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete location")?;
        Ok(res.rows_affected() > 0)
    }
}

/// Insertion-ordered in-memory store.
#[derive(Default)]
pub struct MemoryLocationRepository {
    rows: RwLock<Vec<Location>>,
}

#[async_trait]
impl LocationRepository for MemoryLocationRepository {
    async fn create(&self, user_id: Uuid, fields: LocationFields) -> anyhow::Result<Location> {
        let now = OffsetDateTime::now_utc();
        let location = Location {
            id: Uuid::new_v4(),
            user_id,
            city: fields.city,
            country: fields.country,
            latitude: fields.latitude,
            longitude: fields.longitude,
            nickname: fields.nickname,
            is_favorite: fields.is_favorite,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.push(location.clone());
        Ok(location)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Location>> {
        let rows = self.rows.read().await;
        // Reverse first so equal timestamps still come out newest-inserted first.
        let mut owned: Vec<Location> = rows
            .iter()
            .rev()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Location>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|l| l.id == id && l.user_id == user_id)
            .cloned())
    }

    async fn update_owned(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: LocationFields,
    ) -> anyhow::Result<Option<Location>> {
        let mut rows = self.rows.write().await;
        let Some(loc) = rows.iter_mut().find(|l| l.id == id && l.user_id == user_id) else {
            return Ok(None);
        };
        loc.city = fields.city;
        loc.country = fields.country;
        loc.latitude = fields.latitude;
        loc.longitude = fields.longitude;
        loc.nickname = fields.nickname;
        loc.is_favorite = fields.is_favorite;
        loc.updated_at = OffsetDateTime::now_utc();
        Ok(Some(loc.clone()))
    }

    async fn delete_owned(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|l| !(l.id == id && l.user_id == user_id));
        Ok(rows.len() < before)
    }
}
