use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Booking, Coupon, NewBooking, NewCoupon};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    // Coupons
    async fn get_coupon_by_code(&self, code: &str) -> Result<Coupon, RepositoryError>;
    async fn list_coupons(&self) -> Result<Vec<Coupon>, RepositoryError>;

    /// Inserts the coupon or replaces the definition stored under the same
    /// code. `used_count` of an existing coupon is preserved.
    async fn upsert_coupon(&self, coupon: &NewCoupon) -> Result<Coupon, RepositoryError>;

    async fn increment_coupon_usage(&self, coupon_id: i64) -> Result<(), RepositoryError>;

    // Bookings
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, RepositoryError>;

    async fn get_booking(&self, id: i64) -> Result<Booking, RepositoryError>;

    async fn list_bookings(
        &self,
        booking_date: Option<NaiveDate>,
    ) -> Result<Vec<Booking>, RepositoryError>;
}
