pub mod router;
pub mod types;
pub mod handlers {
    pub mod aggregates;
    pub mod common;
    pub mod health;
    pub mod hearts;
    pub mod reviews;
    pub mod stores;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
