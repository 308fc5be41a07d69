use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::calculations::coupon_base_amount;
use crate::calculations::common::non_negative;
use crate::db::repository::{BookingRepository, RepositoryError};
use crate::models::{
    AddressRef, BookingDraft, BookingStatus, CartItem, CartLine, CouponError, NewBooking,
    PaymentMethodRef, ServiceRef,
};
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Please correct the highlighted fields: {0}")]
    Validation(FieldErrors),

    #[error("Booking is missing {0}")]
    Incomplete(&'static str),

    #[error("Booking was rejected: {0}")]
    Rejected(String),

    #[error("Booking service error: {0}")]
    Repository(String),
}

impl From<RepositoryError> for SubmissionError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err.to_string())
    }
}

/// Everything the booking service needs, taken from a complete draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSubmission {
    pub service: ServiceRef,
    pub date: NaiveDate,
    pub time: String,
    pub address: AddressRef,
    pub payment_method: PaymentMethodRef,
    pub special_requests: String,
    /// Undiscounted amount: the cart subtotal, or the service price.
    pub price: Decimal,
    pub coupon_code: Option<String>,
    pub coupon_id: Option<i64>,
    pub cart_items: Vec<CartItem>,
}

impl BookingSubmission {
    pub fn from_draft(draft: &BookingDraft) -> Result<Self, SubmissionError> {
        let service = draft
            .selected_service
            .clone()
            .ok_or(SubmissionError::Incomplete("a service"))?;
        let date = draft
            .selected_date
            .ok_or(SubmissionError::Incomplete("a date"))?;
        let time = draft
            .selected_time
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(SubmissionError::Incomplete("a time"))?;
        let address = draft
            .selected_address
            .clone()
            .ok_or(SubmissionError::Incomplete("an address"))?;
        let payment_method = draft
            .payment_method
            .clone()
            .ok_or(SubmissionError::Incomplete("a payment method"))?;

        Ok(Self {
            service,
            date,
            time: time.trim().to_string(),
            address,
            payment_method,
            special_requests: draft.special_requests.clone(),
            price: coupon_base_amount(draft),
            coupon_code: draft.coupon_data.as_ref().map(|c| c.code.clone()),
            coupon_id: draft.coupon_data.as_ref().map(|c| c.coupon_id),
            cart_items: draft.cart.items().to_vec(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub booking_id: i64,
    pub reference: String,
    pub price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub status: BookingStatus,
}

#[async_trait]
pub trait BookingSubmitter: Send + Sync {
    async fn submit(
        &self,
        submission: BookingSubmission,
    ) -> Result<BookingConfirmation, SubmissionError>;
}

/// [`BookingSubmitter`] that prices and stores the booking through a
/// [`BookingRepository`].
///
/// The coupon is evaluated again against the submitted price; a coupon that
/// is no longer redeemable rejects the booking instead of silently charging
/// the full price.
pub struct RepositoryBookingSubmitter {
    repo: Arc<dyn BookingRepository>,
}

impl RepositoryBookingSubmitter {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    async fn discount_for(
        &self,
        submission: &BookingSubmission,
    ) -> Result<(Option<i64>, Decimal), SubmissionError> {
        let Some(code) = submission.coupon_code.as_deref() else {
            return Ok((None, Decimal::ZERO));
        };

        let evaluated = match self.repo.get_coupon_by_code(code).await {
            Ok(coupon) => coupon.evaluate(submission.price, Utc::now()),
            Err(err) => Err(CouponError::from(err)),
        };

        match evaluated {
            Ok(result) => Ok((Some(result.coupon_id), result.discount_amount)),
            Err(CouponError::Repository(msg)) => Err(SubmissionError::Repository(msg)),
            Err(err) => Err(SubmissionError::Rejected(err.to_string())),
        }
    }
}

#[async_trait]
impl BookingSubmitter for RepositoryBookingSubmitter {
    async fn submit(
        &self,
        submission: BookingSubmission,
    ) -> Result<BookingConfirmation, SubmissionError> {
        let (coupon_id, discount_amount) = self.discount_for(&submission).await?;
        let final_price = non_negative(submission.price - discount_amount);

        let cart_lines = submission
            .cart_items
            .iter()
            .map(|item| CartLine {
                service_id: item.id,
                name: item.name.clone(),
                price: item.price(),
                quantity: item.quantity(),
            })
            .collect();

        let booking = self
            .repo
            .create_booking(NewBooking {
                service_id: submission.service.id,
                service_name: submission.service.name,
                address_id: submission.address.id,
                booking_date: submission.date,
                booking_time: submission.time,
                payment_method: submission.payment_method.id,
                special_requests: submission.special_requests,
                price: submission.price,
                coupon_id,
                discount_amount,
                final_price,
                status: BookingStatus::Confirmed,
                cart_lines,
            })
            .await?;

        if let Some(coupon_id) = coupon_id {
            if let Err(err) = self.repo.increment_coupon_usage(coupon_id).await {
                warn!(coupon_id, booking = %booking.reference, "could not record coupon usage: {err}");
            }
        }

        info!(
            booking = %booking.reference,
            price = %booking.price,
            discount = %booking.discount_amount,
            final_price = %booking.final_price,
            "booking created"
        );

        Ok(BookingConfirmation {
            booking_id: booking.id,
            reference: booking.reference,
            price: booking.price,
            discount_amount: booking.discount_amount,
            final_price: booking.final_price,
            status: booking.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Cart, CouponResult, DiscountType};
    use crate::test_support::MemoryRepository;

    fn draft() -> BookingDraft {
        BookingDraft {
            selected_service: Some(ServiceRef::new(3, "Bridal makeup", dec!(250))),
            selected_date: NaiveDate::from_ymd_opt(2026, 11, 2),
            selected_time: Some("16:00".to_string()),
            selected_address: Some(AddressRef {
                id: 12,
                title: "Home".to_string(),
                address: "Al Malqa".to_string(),
            }),
            payment_method: Some(PaymentMethodRef::cash()),
            total_price: dec!(250),
            ..BookingDraft::default()
        }
    }

    fn with_coupon(
        mut draft: BookingDraft,
        code: &str,
        coupon_id: i64,
    ) -> BookingDraft {
        draft.coupon_code = code.to_string();
        draft.coupon_data = Some(CouponResult {
            coupon_id,
            code: code.to_string(),
            name: code.to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            discount_amount: dec!(25),
        });
        draft
    }

    #[test]
    fn from_draft_reports_first_missing_piece() {
        let incomplete = BookingDraft {
            selected_address: None,
            ..draft()
        };

        assert_eq!(
            BookingSubmission::from_draft(&incomplete),
            Err(SubmissionError::Incomplete("an address"))
        );
    }

    #[test]
    fn from_draft_prices_cart_at_subtotal() {
        let cart: Cart = [
            CartItem::new(1, "Haircut", dec!(80), 1).unwrap(),
            CartItem::new(2, "Manicure", dec!(45), 2).unwrap(),
        ]
        .into_iter()
        .collect();
        let with_cart = BookingDraft { cart, ..draft() };

        let submission = BookingSubmission::from_draft(&with_cart).unwrap();

        assert_eq!(submission.price, dec!(170));
        assert_eq!(submission.cart_items.len(), 2);
    }

    #[tokio::test]
    async fn submit_without_coupon_charges_full_price() {
        let repo = Arc::new(MemoryRepository::with_sample_coupons());
        let submitter = RepositoryBookingSubmitter::new(repo.clone());

        let confirmation = submitter
            .submit(BookingSubmission::from_draft(&draft()).unwrap())
            .await
            .unwrap();

        assert_eq!(confirmation.final_price, dec!(250));
        assert_eq!(confirmation.status, BookingStatus::Confirmed);
        assert!(confirmation.reference.starts_with("BK"));
        assert_eq!(repo.bookings().len(), 1);
    }

    #[tokio::test]
    async fn submit_applies_coupon_once_and_records_usage() {
        let repo = Arc::new(MemoryRepository::with_sample_coupons());
        let submitter = RepositoryBookingSubmitter::new(repo.clone());
        let submission = BookingSubmission::from_draft(&with_coupon(draft(), "WELCOME10", 1)).unwrap();

        let confirmation = submitter.submit(submission).await.unwrap();

        assert_eq!(confirmation.price, dec!(250));
        assert_eq!(confirmation.discount_amount, dec!(25));
        assert_eq!(confirmation.final_price, dec!(225));
        assert_eq!(repo.coupon_used_count("WELCOME10"), 1);
        assert_eq!(repo.bookings()[0].coupon_id, Some(1));
    }

    #[tokio::test]
    async fn unredeemable_coupon_rejects_booking() {
        let repo = Arc::new(MemoryRepository::with_sample_coupons());
        let submitter = RepositoryBookingSubmitter::new(repo.clone());
        let cheap = BookingDraft {
            selected_service: Some(ServiceRef::new(4, "Eyebrows", dec!(60))),
            ..with_coupon(draft(), "SAVE50", 2)
        };

        let result = submitter
            .submit(BookingSubmission::from_draft(&cheap).unwrap())
            .await;

        assert!(matches!(result, Err(SubmissionError::Rejected(_))));
        assert!(repo.bookings().is_empty());
    }

    #[tokio::test]
    async fn repository_failure_is_reported() {
        let repo = Arc::new(MemoryRepository::with_sample_coupons());
        repo.fail_bookings.store(true, Ordering::SeqCst);
        let submitter = RepositoryBookingSubmitter::new(repo);

        let result = submitter
            .submit(BookingSubmission::from_draft(&draft()).unwrap())
            .await;

        assert!(matches!(result, Err(SubmissionError::Repository(_))));
    }
}
