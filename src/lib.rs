pub mod app;
pub mod client;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::store_service::StoreService;
pub use error::{StorageError, StoreError, ValidationError};
pub use infra::config::{AppConfig, ServiceConfig};
pub use storage::{MemoryStorage, PgStorage, Storage};
