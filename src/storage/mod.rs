//! Storage seams for stores, reviews and hearts.
//!
//! The store record manager only talks to these traits. `MemoryStorage` backs tests
//! and local runs; `PgStorage` persists to Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewReview, Review, Store, StoreFields, StoreId, UserId};
use crate::error::StorageError;

pub mod memory;
pub mod postgres;
pub mod search;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Inserts a new store. Fails with [`StorageError::SlugTaken`] if another store
    /// already owns `slug`.
    async fn insert_store(
        &self,
        fields: &StoreFields,
        slug: &str,
        created: DateTime<Utc>,
    ) -> Result<Store, StorageError>;

    /// Replaces the mutable fields of an existing store. `id` and `created` are kept.
    async fn update_store(
        &self,
        id: StoreId,
        fields: &StoreFields,
        slug: &str,
    ) -> Result<Store, StorageError>;

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, StorageError>;

    async fn get_store_by_slug(&self, slug: &str) -> Result<Option<Store>, StorageError>;

    /// Returns `false` if no such store existed.
    async fn delete_store(&self, id: StoreId) -> Result<bool, StorageError>;

    /// All stores, newest first, optionally restricted to those carrying `tag`.
    async fn list_stores(&self, tag: Option<&str>) -> Result<Vec<Store>, StorageError>;

    /// Slugs equal to `base` or `base-<digits>` (case-insensitive), leaving out the
    /// slug held by `exclude`.
    async fn colliding_slugs(
        &self,
        base: &str,
        exclude: Option<StoreId>,
    ) -> Result<Vec<String>, StorageError>;

    /// Text search over name and description, best matches first.
    async fn search_stores(&self, query: &str, limit: usize) -> Result<Vec<Store>, StorageError>;

    async fn ping(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(&self, review: &NewReview) -> Result<Review, StorageError>;

    /// Reviews whose back-reference points at `store`, oldest first.
    async fn reviews_for_store(&self, store: StoreId) -> Result<Vec<Review>, StorageError>;

    async fn list_reviews(&self) -> Result<Vec<Review>, StorageError>;
}

#[async_trait]
pub trait HeartRepository: Send + Sync {
    /// Flips the user's heart on `store` and reports whether it is now set.
    async fn toggle_heart(&self, user: UserId, store: StoreId) -> Result<bool, StorageError>;

    async fn hearts_for_user(&self, user: UserId) -> Result<Vec<StoreId>, StorageError>;
}

/// Everything the store record manager needs from a backend.
pub trait Storage: StoreRepository + ReviewRepository + HeartRepository {}

impl<T> Storage for T where T: StoreRepository + ReviewRepository + HeartRepository {}
