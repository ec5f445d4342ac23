pub mod store_service;

pub use store_service::StoreService;
