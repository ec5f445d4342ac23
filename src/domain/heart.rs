use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::store::StoreId;

/// Outcome of toggling a user's heart on a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HeartState {
    pub store: StoreId,
    /// Whether the store is hearted after the toggle.
    pub hearted: bool,
    /// All stores the user has hearted, after the toggle.
    pub hearts: Vec<StoreId>,
}
