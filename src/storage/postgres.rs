//! Persistent storage backend using PostgreSQL.
//!
//! Tables are created on connect (`CREATE TABLE IF NOT EXISTS`). The unique constraint
//! on `stores.slug` is what ultimately guarantees slug uniqueness; the store service
//! retries with a higher suffix when it trips.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::domain::slug::collision_pattern;
use crate::domain::{
    Location, NewReview, Review, ReviewId, Store, StoreFields, StoreId, UserId,
};
use crate::error::StorageError;
use crate::storage::search;
use crate::storage::{HeartRepository, ReviewRepository, StoreRepository};

const STORE_COLUMNS: &str = "id, name, slug, description, tags, created, location_type, \
     longitude, latitude, address, photo, author";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS stores (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        description TEXT,
        tags TEXT[] NOT NULL DEFAULT '{}',
        created TIMESTAMPTZ NOT NULL DEFAULT now(),
        location_type TEXT NOT NULL DEFAULT 'Point',
        longitude DOUBLE PRECISION NOT NULL,
        latitude DOUBLE PRECISION NOT NULL,
        address TEXT NOT NULL,
        photo TEXT,
        author BIGINT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS stores_text_idx ON stores
        USING GIN (to_tsvector('simple', name || ' ' || coalesce(description, '')))",
    "CREATE INDEX IF NOT EXISTS stores_tags_idx ON stores USING GIN (tags)",
    "CREATE TABLE IF NOT EXISTS reviews (
        id BIGSERIAL PRIMARY KEY,
        store BIGINT NOT NULL,
        author BIGINT NOT NULL,
        text TEXT NOT NULL DEFAULT '',
        rating INTEGER NOT NULL,
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS reviews_store_idx ON reviews (store)",
    "CREATE TABLE IF NOT EXISTS hearts (
        user_id BIGINT NOT NULL,
        store_id BIGINT NOT NULL,
        PRIMARY KEY (user_id, store_id)
    )",
];

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Connects to `database_url` and makes sure the schema exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let storage = Self { pool };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn store_from_row(row: &PgRow) -> Result<Store, sqlx::Error> {
    Ok(Store {
        id: StoreId(row.try_get("id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        tags: row.try_get("tags")?,
        created: row.try_get("created")?,
        location: Location {
            kind: row.try_get("location_type")?,
            coordinates: [row.try_get("longitude")?, row.try_get("latitude")?],
            address: row.try_get("address")?,
        },
        photo: row.try_get("photo")?,
        author: UserId(row.try_get("author")?),
    })
}

fn review_from_row(row: &PgRow) -> Result<Review, sqlx::Error> {
    Ok(Review {
        id: ReviewId(row.try_get("id")?),
        store: StoreId(row.try_get("store")?),
        author: UserId(row.try_get("author")?),
        text: row.try_get("text")?,
        rating: row.try_get("rating")?,
        created: row.try_get("created")?,
    })
}

fn stores_from_rows(rows: &[PgRow]) -> Result<Vec<Store>, StorageError> {
    Ok(rows
        .iter()
        .map(store_from_row)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Maps a unique-constraint violation on `slug` to [`StorageError::SlugTaken`].
fn slug_conflict(err: sqlx::Error, slug: &str) -> StorageError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StorageError::SlugTaken {
                slug: slug.to_string(),
            };
        }
    }
    StorageError::Database(err)
}

#[async_trait]
impl StoreRepository for PgStorage {
    async fn insert_store(
        &self,
        fields: &StoreFields,
        slug: &str,
        created: DateTime<Utc>,
    ) -> Result<Store, StorageError> {
        let sql = format!(
            "INSERT INTO stores (name, slug, description, tags, created, location_type, \
             longitude, latitude, address, photo, author) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
            STORE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&fields.name)
            .bind(slug)
            .bind(&fields.description)
            .bind(&fields.tags)
            .bind(created)
            .bind(&fields.location.kind)
            .bind(fields.location.longitude())
            .bind(fields.location.latitude())
            .bind(&fields.location.address)
            .bind(&fields.photo)
            .bind(fields.author.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| slug_conflict(e, slug))?;
        Ok(store_from_row(&row)?)
    }

    async fn update_store(
        &self,
        id: StoreId,
        fields: &StoreFields,
        slug: &str,
    ) -> Result<Store, StorageError> {
        let sql = format!(
            "UPDATE stores SET name = $2, slug = $3, description = $4, tags = $5, \
             location_type = $6, longitude = $7, latitude = $8, address = $9, photo = $10, \
             author = $11 WHERE id = $1 RETURNING {}",
            STORE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.0)
            .bind(&fields.name)
            .bind(slug)
            .bind(&fields.description)
            .bind(&fields.tags)
            .bind(&fields.location.kind)
            .bind(fields.location.longitude())
            .bind(fields.location.latitude())
            .bind(&fields.location.address)
            .bind(&fields.photo)
            .bind(fields.author.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| slug_conflict(e, slug))?;
        match row {
            Some(row) => Ok(store_from_row(&row)?),
            None => Err(StorageError::StoreNotFound(id)),
        }
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, StorageError> {
        let sql = format!("SELECT {} FROM stores WHERE id = $1", STORE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(store_from_row).transpose()?)
    }

    async fn get_store_by_slug(&self, slug: &str) -> Result<Option<Store>, StorageError> {
        let sql = format!("SELECT {} FROM stores WHERE slug = $1", STORE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(store_from_row).transpose()?)
    }

    async fn delete_store(&self, id: StoreId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_stores(&self, tag: Option<&str>) -> Result<Vec<Store>, StorageError> {
        let sql = format!(
            "SELECT {} FROM stores WHERE $1::text IS NULL OR $1 = ANY(tags) \
             ORDER BY created DESC, id DESC",
            STORE_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(tag).fetch_all(&self.pool).await?;
        stores_from_rows(&rows)
    }

    async fn colliding_slugs(
        &self,
        base: &str,
        exclude: Option<StoreId>,
    ) -> Result<Vec<String>, StorageError> {
        let slugs: Vec<String> = sqlx::query_scalar(
            "SELECT slug FROM stores WHERE slug ~* $1 AND ($2::bigint IS NULL OR id <> $2)",
        )
        .bind(collision_pattern(base))
        .bind(exclude.map(|id| id.0))
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }

    async fn search_stores(&self, query: &str, limit: usize) -> Result<Vec<Store>, StorageError> {
        let terms = search::terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {cols}, ts_rank(setweight(to_tsvector('simple', name), 'A') || \
             setweight(to_tsvector('simple', coalesce(description, '')), 'B'), q) AS rank \
             FROM stores, to_tsquery('simple', $1) q \
             WHERE to_tsvector('simple', name || ' ' || coalesce(description, '')) @@ q \
             ORDER BY rank DESC, created DESC LIMIT $2",
            cols = STORE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(search::prefix_tsquery(&terms))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        stores_from_rows(&rows)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for PgStorage {
    async fn insert_review(&self, review: &NewReview) -> Result<Review, StorageError> {
        let mut tx = self.pool.begin().await?;
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1)")
            .bind(review.store.0)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(StorageError::StoreNotFound(review.store));
        }
        let row = sqlx::query(
            "INSERT INTO reviews (store, author, text, rating) VALUES ($1, $2, $3, $4) \
             RETURNING id, store, author, text, rating, created",
        )
        .bind(review.store.0)
        .bind(review.author.0)
        .bind(&review.text)
        .bind(review.rating)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(review_from_row(&row)?)
    }

    async fn reviews_for_store(&self, store: StoreId) -> Result<Vec<Review>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, store, author, text, rating, created FROM reviews \
             WHERE store = $1 ORDER BY created, id",
        )
        .bind(store.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(review_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, store, author, text, rating, created FROM reviews ORDER BY created, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(review_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl HeartRepository for PgStorage {
    async fn toggle_heart(&self, user: UserId, store: StoreId) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await?;
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1)")
            .bind(store.0)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(StorageError::StoreNotFound(store));
        }
        let removed = sqlx::query("DELETE FROM hearts WHERE user_id = $1 AND store_id = $2")
            .bind(user.0)
            .bind(store.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            sqlx::query(
                "INSERT INTO hearts (user_id, store_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user.0)
            .bind(store.0)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(removed == 0)
    }

    async fn hearts_for_user(&self, user: UserId) -> Result<Vec<StoreId>, StorageError> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT store_id FROM hearts WHERE user_id = $1 ORDER BY store_id")
                .bind(user.0)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(StoreId).collect())
    }
}
