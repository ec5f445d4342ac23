//! Storefront domain: the store entity, its reviews and the read-side aggregations.

pub mod aggregate;
pub mod heart;
pub mod review;
pub mod slug;
pub mod store;

pub use aggregate::{tag_counts, top_stores, TagCount, TopStore};
pub use heart::HeartState;
pub use review::{NewReview, Review, ReviewId, ReviewInput};
pub use store::{Location, LocationInput, Store, StoreFields, StoreId, StoreInput, UserId};
