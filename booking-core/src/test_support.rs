//! In-memory repository shared by the unit tests of this crate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use crate::db::repository::{BookingRepository, RepositoryError};
use crate::models::{Booking, Coupon, DiscountType, NewBooking, NewCoupon, normalize_code};

#[derive(Default)]
struct Tables {
    coupons: Vec<Coupon>,
    bookings: Vec<Booking>,
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    pub coupon_lookups: AtomicUsize,
    pub fail_bookings: AtomicBool,
}

impl MemoryRepository {
    pub fn with_sample_coupons() -> Self {
        let repo = Self::default();
        {
            let mut tables = repo.tables.lock().unwrap();
            for (id, coupon) in sample_coupons().into_iter().enumerate() {
                tables.coupons.push(stored(id as i64 + 1, coupon, 0));
            }
        }
        repo
    }

    pub fn coupon_used_count(
        &self,
        code: &str,
    ) -> u32 {
        let tables = self.tables.lock().unwrap();
        tables
            .coupons
            .iter()
            .find(|c| c.code == code)
            .map_or(0, |c| c.used_count)
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.tables.lock().unwrap().bookings.clone()
    }
}

fn stored(
    id: i64,
    coupon: NewCoupon,
    used_count: u32,
) -> Coupon {
    Coupon {
        id,
        code: normalize_code(&coupon.code),
        name: coupon.name,
        description: coupon.description,
        discount_type: coupon.discount_type,
        discount_value: coupon.discount_value,
        minimum_amount: coupon.minimum_amount,
        maximum_discount: coupon.maximum_discount,
        usage_limit: coupon.usage_limit,
        used_count,
        valid_from: coupon.valid_from,
        valid_until: coupon.valid_until,
        is_active: coupon.is_active,
    }
}

pub fn sample_coupons() -> Vec<NewCoupon> {
    let valid_from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let valid_until = Utc.with_ymd_and_hms(2030, 12, 31, 23, 59, 59).unwrap();
    vec![
        NewCoupon {
            code: "WELCOME10".to_string(),
            name: "Welcome Discount".to_string(),
            description: "10% off for new customers".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            minimum_amount: dec!(100),
            maximum_discount: Some(dec!(100)),
            usage_limit: Some(100),
            valid_from,
            valid_until,
            is_active: true,
        },
        NewCoupon {
            code: "SAVE50".to_string(),
            name: "Save 50 SAR".to_string(),
            description: "50 SAR off orders over 200".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: dec!(50),
            minimum_amount: dec!(200),
            maximum_discount: None,
            usage_limit: Some(50),
            valid_from,
            valid_until,
            is_active: true,
        },
    ]
}

#[async_trait]
impl BookingRepository for MemoryRepository {
    async fn get_coupon_by_code(
        &self,
        code: &str,
    ) -> Result<Coupon, RepositoryError> {
        self.coupon_lookups.fetch_add(1, Ordering::SeqCst);
        let code = normalize_code(code);
        let tables = self.tables.lock().unwrap();
        tables
            .coupons
            .iter()
            .find(|c| c.code == code)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>, RepositoryError> {
        Ok(self.tables.lock().unwrap().coupons.clone())
    }

    async fn upsert_coupon(
        &self,
        coupon: &NewCoupon,
    ) -> Result<Coupon, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let code = normalize_code(&coupon.code);
        if let Some(existing) = tables.coupons.iter_mut().find(|c| c.code == code) {
            *existing = stored(existing.id, coupon.clone(), existing.used_count);
            return Ok(existing.clone());
        }
        let saved = stored(tables.coupons.len() as i64 + 1, coupon.clone(), 0);
        tables.coupons.push(saved.clone());
        Ok(saved)
    }

    async fn increment_coupon_usage(
        &self,
        coupon_id: i64,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let coupon = tables
            .coupons
            .iter_mut()
            .find(|c| c.id == coupon_id)
            .ok_or(RepositoryError::NotFound)?;
        coupon.used_count += 1;
        Ok(())
    }

    async fn create_booking(
        &self,
        booking: NewBooking,
    ) -> Result<Booking, RepositoryError> {
        if self.fail_bookings.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database("bookings table is locked".to_string()));
        }
        let mut tables = self.tables.lock().unwrap();
        let id = tables.bookings.len() as i64 + 1;
        let created_at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let saved = Booking {
            id,
            reference: Booking::make_reference(id, created_at),
            service_id: booking.service_id,
            service_name: booking.service_name,
            address_id: booking.address_id,
            booking_date: booking.booking_date,
            booking_time: booking.booking_time,
            payment_method: booking.payment_method,
            special_requests: booking.special_requests,
            price: booking.price,
            coupon_id: booking.coupon_id,
            discount_amount: booking.discount_amount,
            final_price: booking.final_price,
            status: booking.status,
            cart_lines: booking.cart_lines,
            created_at,
        };
        tables.bookings.push(saved.clone());
        Ok(saved)
    }

    async fn get_booking(
        &self,
        id: i64,
    ) -> Result<Booking, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        tables
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_bookings(
        &self,
        booking_date: Option<NaiveDate>,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .bookings
            .iter()
            .filter(|b| booking_date.is_none_or(|date| b.booking_date == date))
            .cloned()
            .collect())
    }
}
