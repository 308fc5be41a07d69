//! SQLite backend for the booking repository.

mod decimal;
mod factory;
mod repository;

pub use factory::{SqliteRepositoryFactory, seeds_dir};
pub use repository::SqliteRepository;
