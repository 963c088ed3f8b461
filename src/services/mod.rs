// Service exports
pub mod background;
pub mod memory;
pub mod postgres;
pub mod rating;
pub mod store;
pub mod vote_processor;

pub use background::{refresh_catalog_metrics, spawn_metrics_refresh};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use rating::RatingService;
pub use store::{RatingStore, StoreError};
pub use vote_processor::VoteProcessor;
