//! The store record manager.
//!
//! Every write runs validate -> derive slug -> commit. Slugs are derived from the store
//! name whenever the name changes: the base slug gets a numeric suffix when other stores
//! already hold it or a numbered variant of it. A renamed store whose current slug is
//! still a variant of the new base keeps it. The collision count is only a first
//! guess; the storage unique constraint on `slug` is authoritative. A rejected commit
//! re-reads the colliding slugs and takes the lowest free one, giving up after
//! `slug_retry_limit` rejections.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::slug::{first_free, is_variant_of, slugify, with_suffix};
use crate::domain::{
    tag_counts, top_stores, HeartState, Review, ReviewInput, Store, StoreFields, StoreId,
    StoreInput, TagCount, TopStore, UserId,
};
use crate::error::{StorageError, StoreError};
use crate::infra::config::ServiceConfig;
use crate::storage::Storage;

/// Where a validated write lands.
#[derive(Debug, Clone, Copy)]
enum WriteTarget {
    Insert { created: DateTime<Utc> },
    Update { id: StoreId },
}

/// How the slug for a write is chosen.
enum SlugPlan {
    /// Name unchanged: keep the current slug.
    Keep(String),
    /// New record or renamed: derive from `base`, ignoring the record's own slug.
    Derive {
        base: String,
        exclude: Option<StoreId>,
    },
}

pub struct StoreService {
    storage: Arc<dyn Storage>,
    config: ServiceConfig,
}

impl StoreService {
    pub fn new(storage: Arc<dyn Storage>, config: ServiceConfig) -> Self {
        Self { storage, config }
    }

    /// Validates and inserts a new store with a freshly derived slug.
    pub async fn create(&self, input: StoreInput) -> Result<Store, StoreError> {
        let fields = input.validate()?;
        let plan = SlugPlan::Derive {
            base: slugify(&fields.name),
            exclude: None,
        };
        let store = self
            .commit(
                &fields,
                WriteTarget::Insert {
                    created: Utc::now(),
                },
                plan,
            )
            .await?;
        info!(store_id = %store.id, slug = %store.slug, "store created");
        Ok(store)
    }

    /// Applies a partial update. The slug is re-derived only when the name changes.
    pub async fn update(&self, id: StoreId, input: StoreInput) -> Result<Store, StoreError> {
        let existing = self.get(id).await?;
        let fields = input.merge_onto(&existing)?;
        let base = slugify(&fields.name);
        let plan = if fields.name == existing.name || is_variant_of(&existing.slug, &base) {
            SlugPlan::Keep(existing.slug.clone())
        } else {
            SlugPlan::Derive {
                base,
                exclude: Some(id),
            }
        };
        let store = self.commit(&fields, WriteTarget::Update { id }, plan).await?;
        if store.slug != existing.slug {
            info!(store_id = %id, old_slug = %existing.slug, slug = %store.slug, "store renamed");
        } else {
            info!(store_id = %id, "store updated");
        }
        Ok(store)
    }

    async fn commit(
        &self,
        fields: &StoreFields,
        target: WriteTarget,
        plan: SlugPlan,
    ) -> Result<Store, StoreError> {
        let (base, exclude) = match plan {
            SlugPlan::Keep(slug) => return Ok(self.write(fields, target, &slug).await?),
            SlugPlan::Derive { base, exclude } => (base, exclude),
        };

        let colliding = self.storage.colliding_slugs(&base, exclude).await?;
        let mut slug = with_suffix(&base, colliding.len());
        // Candidates storage rejected, in case a re-read doesn't show the winner yet.
        let mut rejected: Vec<String> = Vec::new();
        let attempts = self.config.slug_retry_limit.max(1);
        for attempt in 1..=attempts {
            debug!(%slug, attempt, "trying slug");
            match self.write(fields, target, &slug).await {
                Ok(store) => return Ok(store),
                Err(StorageError::SlugTaken { slug: taken }) => {
                    warn!(slug = %taken, attempt, "slug already taken, picking the next free one");
                    rejected.push(taken);
                    let colliding = self.storage.colliding_slugs(&base, exclude).await?;
                    slug = first_free(
                        &base,
                        colliding.iter().chain(rejected.iter()).map(String::as_str),
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::SlugExhausted { base, attempts })
    }

    async fn write(
        &self,
        fields: &StoreFields,
        target: WriteTarget,
        slug: &str,
    ) -> Result<Store, StorageError> {
        match target {
            WriteTarget::Insert { created } => self.storage.insert_store(fields, slug, created).await,
            WriteTarget::Update { id } => self.storage.update_store(id, fields, slug).await,
        }
    }

    pub async fn get(&self, id: StoreId) -> Result<Store, StoreError> {
        self.storage
            .get_store(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Store, StoreError> {
        self.storage
            .get_store_by_slug(slug)
            .await?
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }

    /// Stores newest first, optionally only those tagged `tag`.
    pub async fn list(&self, tag: Option<&str>) -> Result<Vec<Store>, StoreError> {
        Ok(self.storage.list_stores(tag).await?)
    }

    pub async fn delete(&self, id: StoreId) -> Result<(), StoreError> {
        if self.storage.delete_store(id).await? {
            info!(store_id = %id, "store deleted");
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    /// The store's reviews, looked up through their back-reference.
    pub async fn reviews_for(&self, id: StoreId) -> Result<Vec<Review>, StoreError> {
        self.get(id).await?;
        Ok(self.storage.reviews_for_store(id).await?)
    }

    pub async fn add_review(&self, id: StoreId, input: ReviewInput) -> Result<Review, StoreError> {
        let review = input.validate(id)?;
        let stored = self.storage.insert_review(&review).await?;
        info!(store_id = %id, review_id = %stored.id, rating = stored.rating, "review added");
        Ok(stored)
    }

    /// Every tag with its number of occurrences, most used first.
    pub async fn tags_list(&self) -> Result<Vec<TagCount>, StoreError> {
        let stores = self.storage.list_stores(None).await?;
        Ok(tag_counts(&stores))
    }

    /// Best-rated stores with at least two reviews.
    pub async fn top_stores(&self) -> Result<Vec<TopStore>, StoreError> {
        let stores = self.storage.list_stores(None).await?;
        let reviews = self.storage.list_reviews().await?;
        Ok(top_stores(&stores, &reviews, self.config.top_stores_limit))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Store>, StoreError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .storage
            .search_stores(query, self.config.search_limit)
            .await?)
    }

    pub async fn toggle_heart(&self, user: UserId, store: StoreId) -> Result<HeartState, StoreError> {
        let hearted = self.storage.toggle_heart(user, store).await?;
        let hearts = self.storage.hearts_for_user(user).await?;
        debug!(user = %user, store_id = %store, hearted, "heart toggled");
        Ok(HeartState {
            store,
            hearted,
            hearts,
        })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        Ok(self.storage.ping().await?)
    }
}
