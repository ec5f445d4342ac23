//! Reviews reference their store through a back-reference; the store never lists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::domain::store::{StoreId, UserId};
use crate::error::{FieldViolation, ValidationError};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ReviewId(pub i64);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: ReviewId,
    /// Back-reference to the reviewed store.
    pub store: StoreId,
    pub author: UserId,
    pub text: String,
    pub rating: i32,
    pub created: DateTime<Utc>,
}

/// Review payload as submitted for a given store.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewInput {
    pub author: Option<UserId>,
    #[serde(default)]
    pub text: Option<String>,
    pub rating: Option<i32>,
}

/// A validated review ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub store: StoreId,
    pub author: UserId,
    pub text: String,
    pub rating: i32,
}

impl ReviewInput {
    pub fn validate(self, store: StoreId) -> Result<NewReview, ValidationError> {
        let mut violations = Vec::new();
        if self.author.is_none() {
            violations.push(FieldViolation::new("author", "You must supply an author"));
        }
        match self.rating {
            None => violations.push(FieldViolation::new("rating", "You must supply a rating")),
            Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => violations.push(
                FieldViolation::new(
                    "rating",
                    format!("Rating must be between {} and {}", MIN_RATING, MAX_RATING),
                ),
            ),
            Some(_) => {}
        }
        match (self.author, self.rating) {
            (Some(author), Some(rating)) if violations.is_empty() => Ok(NewReview {
                store,
                author,
                text: self.text.unwrap_or_default().trim().to_string(),
                rating,
            }),
            _ => Err(ValidationError { violations }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_must_be_in_range() {
        let input = ReviewInput {
            author: Some(UserId(1)),
            text: None,
            rating: Some(6),
        };
        assert_eq!(input.validate(StoreId(1)).unwrap_err().fields(), vec!["rating"]);
    }

    #[test]
    fn valid_review_keeps_back_reference() {
        let input = ReviewInput {
            author: Some(UserId(2)),
            text: Some(" great coffee ".to_string()),
            rating: Some(4),
        };
        let review = input.validate(StoreId(3)).unwrap();
        assert_eq!(review.store, StoreId(3));
        assert_eq!(review.text, "great coffee");
    }
}
