//! Read-side aggregations over committed stores and reviews.
//!
//! Both functions work on plain slices so they can be exercised without a database;
//! storage backends only need to hand over a snapshot.

use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::domain::review::Review;
use crate::domain::store::{Store, StoreId};

/// Stores with fewer reviews than this are left out of the top list.
pub const MIN_REVIEWS_FOR_TOP: usize = 2;

/// Default length of the top list.
pub const TOP_STORES_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopStore {
    pub id: StoreId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub name: String,
    pub slug: String,
    pub reviews: Vec<Review>,
    pub average_rating: f64,
}

/// Counts every tag occurrence across all stores, most frequent first.
///
/// A tag repeated within one store counts once per repetition.
pub fn tag_counts(stores: &[Store]) -> Vec<TagCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for tag in stores.iter().flat_map(|s| s.tags.iter()) {
        *counts.entry(tag.as_str()).or_insert(0) += 1;
    }

    let mut out: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    // Ties fall back to the tag name so responses don't shuffle between calls.
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    out
}

/// Joins stores with their reviews, keeps those with at least
/// [`MIN_REVIEWS_FOR_TOP`] reviews and returns up to `limit` of them by mean rating.
pub fn top_stores(stores: &[Store], reviews: &[Review], limit: usize) -> Vec<TopStore> {
    let mut by_store: HashMap<StoreId, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_store.entry(review.store).or_default().push(review.clone());
    }

    let mut ranked: Vec<TopStore> = stores
        .iter()
        .filter_map(|store| {
            let reviews = by_store.remove(&store.id)?;
            if reviews.len() < MIN_REVIEWS_FOR_TOP {
                return None;
            }
            let total: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
            let average_rating = total / reviews.len() as f64;
            Some(TopStore {
                id: store.id,
                photo: store.photo.clone(),
                name: store.name.clone(),
                slug: store.slug.clone(),
                reviews,
                average_rating,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    ranked.truncate(limit);
    ranked
}
