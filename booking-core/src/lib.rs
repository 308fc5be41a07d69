pub mod calculations;
pub mod config;
pub mod db;
pub mod flow;
pub mod models;
pub mod services;
pub mod store;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use config::FlowConfig;
pub use db::repository::{BookingRepository, RepositoryError};
pub use flow::{BookingFlow, Notification, NotificationKind};
pub use models::*;
pub use store::{BookingPatch, BookingStore, DraftUpdate};
pub use validation::{FieldErrors, ValidationRule};
