//! The store entity and its write-side validation.
//!
//! A `StoreInput` is what callers submit; it is validated into `StoreFields` before any
//! slug is derived or anything reaches storage. Missing required fields are reported
//! together, each naming the offending field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::{FieldViolation, ValidationError};

/// Location discriminator; the only geometry stores carry.
pub const POINT: &str = "Point";

/// Opaque store identifier assigned by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct StoreId(pub i64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a user owned by the (external) account system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`
    #[schema(value_type = Vec<f64>)]
    pub coordinates: [f64; 2],
    pub address: String,
}

impl Location {
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub author: UserId,
}

impl Store {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LocationInput {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Vec<f64>>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Create/update payload. Every field is optional at the wire level; required ones are
/// enforced by [`StoreInput::validate`].
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StoreInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub location: Option<LocationInput>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub author: Option<UserId>,
}

/// Validated store content: everything except the storage-owned `id`, the derived
/// `slug` and the immutable `created` timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreFields {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: UserId,
}

impl StoreInput {
    /// Validates a complete payload (used on create).
    pub fn validate(self) -> Result<StoreFields, ValidationError> {
        let mut violations = Vec::new();

        let name = trimmed(self.name);
        if name.is_none() {
            violations.push(FieldViolation::new("name", "Please enter a store name!"));
        }

        let location = self.location.unwrap_or_default();
        let kind = location.kind.unwrap_or_else(|| POINT.to_string());
        if kind != POINT {
            violations.push(FieldViolation::new(
                "location.type",
                format!("Unsupported location type '{}'", kind),
            ));
        }

        let coordinates = match location.coordinates {
            None => {
                violations.push(FieldViolation::new(
                    "location.coordinates",
                    "You must supply coordinates!",
                ));
                None
            }
            Some(c) if c.is_empty() => {
                violations.push(FieldViolation::new(
                    "location.coordinates",
                    "You must supply coordinates!",
                ));
                None
            }
            Some(c) => match check_coordinates(&c) {
                Ok(pair) => Some(pair),
                Err(msg) => {
                    violations.push(FieldViolation::new("location.coordinates", msg));
                    None
                }
            },
        };

        let address = trimmed(location.address);
        if address.is_none() {
            violations.push(FieldViolation::new(
                "location.address",
                "You must supply an address!",
            ));
        }

        if self.author.is_none() {
            violations.push(FieldViolation::new("author", "You must supply an author"));
        }

        match (name, coordinates, address, self.author) {
            (Some(name), Some(coordinates), Some(address), Some(author)) if violations.is_empty() => {
                Ok(StoreFields {
                    name,
                    description: trimmed(self.description),
                    tags: self.tags.unwrap_or_default(),
                    location: Location {
                        kind,
                        coordinates,
                        address,
                    },
                    photo: self.photo.filter(|p| !p.is_empty()),
                    author,
                })
            }
            _ => Err(ValidationError { violations }),
        }
    }

    /// Overlays this (partial) payload on an existing store and validates the result.
    /// Fields the payload leaves out keep their current values.
    pub fn merge_onto(self, existing: &Store) -> Result<StoreFields, ValidationError> {
        let location = self.location.unwrap_or_default();
        let merged = StoreInput {
            name: self.name.or_else(|| Some(existing.name.clone())),
            description: self.description.or_else(|| existing.description.clone()),
            tags: self.tags.or_else(|| Some(existing.tags.clone())),
            location: Some(LocationInput {
                kind: location.kind.or_else(|| Some(existing.location.kind.clone())),
                coordinates: location
                    .coordinates
                    .or_else(|| Some(existing.location.coordinates.to_vec())),
                address: location
                    .address
                    .or_else(|| Some(existing.location.address.clone())),
            }),
            photo: self.photo.or_else(|| existing.photo.clone()),
            author: self.author.or(Some(existing.author)),
        };
        merged.validate()
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn check_coordinates(coordinates: &[f64]) -> Result<[f64; 2], String> {
    let [lng, lat] = coordinates else {
        return Err(format!(
            "Coordinates must be a [longitude, latitude] pair, got {} values",
            coordinates.len()
        ));
    };
    if !lng.is_finite() || !lat.is_finite() {
        return Err("Coordinates must be finite numbers".to_string());
    }
    if !(-180.0..=180.0).contains(lng) {
        return Err(format!("Longitude {} is out of range [-180, 180]", lng));
    }
    if !(-90.0..=90.0).contains(lat) {
        return Err(format!("Latitude {} is out of range [-90, 90]", lat));
    }
    Ok([*lng, *lat])
}
