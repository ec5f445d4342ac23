//! In-process storage backend.
//!
//! Enforces the same unique-slug constraint as the Postgres schema so the retry path in
//! the store service behaves identically against either backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::domain::slug::collision_regex;
use crate::domain::{NewReview, Review, ReviewId, Store, StoreFields, StoreId, UserId};
use crate::error::StorageError;
use crate::storage::search;
use crate::storage::{HeartRepository, ReviewRepository, StoreRepository};

#[derive(Default)]
struct Tables {
    stores: BTreeMap<StoreId, Store>,
    reviews: Vec<Review>,
    hearts: HashMap<UserId, BTreeSet<StoreId>>,
    next_store_id: i64,
    next_review_id: i64,
}

impl Tables {
    fn slug_owner(&self, slug: &str) -> Option<StoreId> {
        self.stores
            .values()
            .find(|s| s.slug == slug)
            .map(|s| s.id)
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(stores: &mut [Store]) {
    stores.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
}

#[async_trait]
impl StoreRepository for MemoryStorage {
    async fn insert_store(
        &self,
        fields: &StoreFields,
        slug: &str,
        created: DateTime<Utc>,
    ) -> Result<Store, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.slug_owner(slug).is_some() {
            return Err(StorageError::SlugTaken {
                slug: slug.to_string(),
            });
        }
        tables.next_store_id += 1;
        let store = Store {
            id: StoreId(tables.next_store_id),
            name: fields.name.clone(),
            slug: slug.to_string(),
            description: fields.description.clone(),
            tags: fields.tags.clone(),
            created,
            location: fields.location.clone(),
            photo: fields.photo.clone(),
            author: fields.author,
        };
        tables.stores.insert(store.id, store.clone());
        Ok(store)
    }

    async fn update_store(
        &self,
        id: StoreId,
        fields: &StoreFields,
        slug: &str,
    ) -> Result<Store, StorageError> {
        let mut tables = self.tables.write().await;
        if let Some(owner) = tables.slug_owner(slug) {
            if owner != id {
                return Err(StorageError::SlugTaken {
                    slug: slug.to_string(),
                });
            }
        }
        let store = tables
            .stores
            .get_mut(&id)
            .ok_or(StorageError::StoreNotFound(id))?;
        store.name = fields.name.clone();
        store.slug = slug.to_string();
        store.description = fields.description.clone();
        store.tags = fields.tags.clone();
        store.location = fields.location.clone();
        store.photo = fields.photo.clone();
        store.author = fields.author;
        Ok(store.clone())
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, StorageError> {
        Ok(self.tables.read().await.stores.get(&id).cloned())
    }

    async fn get_store_by_slug(&self, slug: &str) -> Result<Option<Store>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.stores.values().find(|s| s.slug == slug).cloned())
    }

    async fn delete_store(&self, id: StoreId) -> Result<bool, StorageError> {
        Ok(self.tables.write().await.stores.remove(&id).is_some())
    }

    async fn list_stores(&self, tag: Option<&str>) -> Result<Vec<Store>, StorageError> {
        let tables = self.tables.read().await;
        let mut stores: Vec<Store> = tables
            .stores
            .values()
            .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
            .cloned()
            .collect();
        newest_first(&mut stores);
        Ok(stores)
    }

    async fn colliding_slugs(
        &self,
        base: &str,
        exclude: Option<StoreId>,
    ) -> Result<Vec<String>, StorageError> {
        let re = collision_regex(base)
            .map_err(|e| StorageError::Unavailable(format!("bad slug pattern: {}", e)))?;
        let tables = self.tables.read().await;
        Ok(tables
            .stores
            .values()
            .filter(|s| Some(s.id) != exclude && re.is_match(&s.slug))
            .map(|s| s.slug.clone())
            .collect())
    }

    async fn search_stores(&self, query: &str, limit: usize) -> Result<Vec<Store>, StorageError> {
        let terms = search::terms(query);
        let tables = self.tables.read().await;
        let mut hits: Vec<(u32, &Store)> = tables
            .stores
            .values()
            .filter_map(|s| search::score(s, &terms).map(|score| (score, s)))
            .collect();
        hits.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| b.created.cmp(&a.created)));
        Ok(hits
            .into_iter()
            .take(limit)
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStorage {
    async fn insert_review(&self, review: &NewReview) -> Result<Review, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.stores.contains_key(&review.store) {
            return Err(StorageError::StoreNotFound(review.store));
        }
        tables.next_review_id += 1;
        let stored = Review {
            id: ReviewId(tables.next_review_id),
            store: review.store,
            author: review.author,
            text: review.text.clone(),
            rating: review.rating,
            created: Utc::now(),
        };
        tables.reviews.push(stored.clone());
        Ok(stored)
    }

    async fn reviews_for_store(&self, store: StoreId) -> Result<Vec<Review>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.store == store)
            .cloned()
            .collect())
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, StorageError> {
        Ok(self.tables.read().await.reviews.clone())
    }
}

#[async_trait]
impl HeartRepository for MemoryStorage {
    async fn toggle_heart(&self, user: UserId, store: StoreId) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.stores.contains_key(&store) {
            return Err(StorageError::StoreNotFound(store));
        }
        let hearts = tables.hearts.entry(user).or_default();
        if hearts.remove(&store) {
            Ok(false)
        } else {
            hearts.insert(store);
            Ok(true)
        }
    }

    async fn hearts_for_user(&self, user: UserId) -> Result<Vec<StoreId>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .hearts
            .get(&user)
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Location, UserId};

    fn fields(name: &str) -> StoreFields {
        StoreFields {
            name: name.to_string(),
            description: None,
            tags: vec!["wifi".to_string()],
            location: Location {
                kind: "Point".to_string(),
                coordinates: [1.0, 2.0],
                address: "1 Main St".to_string(),
            },
            photo: None,
            author: UserId(1),
        }
    }

    #[tokio::test]
    async fn slug_uniqueness_is_enforced() {
        let storage = MemoryStorage::new();
        storage
            .insert_store(&fields("A"), "a", Utc::now())
            .await
            .unwrap();
        let err = storage
            .insert_store(&fields("A"), "a", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::SlugTaken { ref slug } if slug == "a"));
    }

    #[tokio::test]
    async fn update_may_keep_its_own_slug() {
        let storage = MemoryStorage::new();
        let store = storage
            .insert_store(&fields("A"), "a", Utc::now())
            .await
            .unwrap();
        let updated = storage
            .update_store(store.id, &fields("A prime"), "a")
            .await
            .unwrap();
        assert_eq!(updated.name, "A prime");
        assert_eq!(updated.created, store.created);
    }

    #[tokio::test]
    async fn colliding_slugs_can_exclude_a_store() {
        let storage = MemoryStorage::new();
        let first = storage
            .insert_store(&fields("Cafe"), "cafe", Utc::now())
            .await
            .unwrap();
        storage
            .insert_store(&fields("Cafe"), "cafe-2", Utc::now())
            .await
            .unwrap();
        storage
            .insert_store(&fields("Cafe Shop"), "cafe-shop", Utc::now())
            .await
            .unwrap();
        let mut all = storage.colliding_slugs("cafe", None).await.unwrap();
        all.sort();
        assert_eq!(all, vec!["cafe", "cafe-2"]);
        assert_eq!(
            storage.colliding_slugs("cafe", Some(first.id)).await.unwrap(),
            vec!["cafe-2"]
        );
    }

    #[tokio::test]
    async fn hearts_toggle_on_and_off() {
        let storage = MemoryStorage::new();
        let store = storage
            .insert_store(&fields("A"), "a", Utc::now())
            .await
            .unwrap();
        let user = UserId(42);
        assert!(storage.toggle_heart(user, store.id).await.unwrap());
        assert_eq!(storage.hearts_for_user(user).await.unwrap(), vec![store.id]);
        assert!(!storage.toggle_heart(user, store.id).await.unwrap());
        assert!(storage.hearts_for_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reviews_require_an_existing_store() {
        let storage = MemoryStorage::new();
        let review = NewReview {
            store: StoreId(5),
            author: UserId(1),
            text: String::new(),
            rating: 3,
        };
        assert!(matches!(
            storage.insert_review(&review).await,
            Err(StorageError::StoreNotFound(StoreId(5)))
        ));
    }
}
