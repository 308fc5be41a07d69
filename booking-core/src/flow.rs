//! One booking session from first selection to confirmation.
//!
//! [`BookingFlow`] wires a [`BookingStore`] to the coupon and submission
//! collaborators and keeps the user-facing error and notification state.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::calculations::{CartTotals, coupon_base_amount, single_service_total};
use crate::config::FlowConfig;
use crate::models::{AddressRef, BookingDraft, CouponError, CouponResult, PaymentMethodRef, ServiceRef};
use crate::services::{
    BookingConfirmation, BookingSubmission, BookingSubmitter, CouponValidator, SubmissionError,
};
use crate::store::{BookingPatch, BookingStore};
use crate::validation::validate_for_submit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient message that disappears on its own after a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    expires_at: Instant,
}

impl Notification {
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

pub struct BookingFlow {
    store: BookingStore,
    coupons: Arc<dyn CouponValidator>,
    submitter: Arc<dyn BookingSubmitter>,
    config: FlowConfig,
    coupon_error: Option<CouponError>,
    submission_error: Option<SubmissionError>,
    notification: Option<Notification>,
    confirmation: Option<BookingConfirmation>,
}

impl BookingFlow {
    /// Starts a flow with an empty draft.
    ///
    /// # Panics
    /// When called outside a tokio runtime.
    pub fn new(
        coupons: Arc<dyn CouponValidator>,
        submitter: Arc<dyn BookingSubmitter>,
        config: FlowConfig,
    ) -> Self {
        Self {
            store: BookingStore::from_config(&config),
            coupons,
            submitter,
            config,
            coupon_error: None,
            submission_error: None,
            notification: None,
            confirmation: None,
        }
    }

    pub fn store(&self) -> &BookingStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BookingStore {
        &mut self.store
    }

    pub fn draft(&self) -> BookingDraft {
        self.store.draft()
    }

    // ── selections ──────────────────────────────────────────────────────

    /// Selects a service. Without a cart the total follows the service price,
    /// less any applied coupon.
    ///
    /// A coupon discount was computed against the previous price, so a price
    /// change drops it while keeping the entered code; call
    /// [`apply_coupon`](Self::apply_coupon) again to re-evaluate it.
    pub fn select_service(
        &self,
        service: ServiceRef,
    ) {
        let mut patch = BookingPatch::new();
        let (cart_is_empty, coupon, previous_price) = self.store.with_draft(|d| {
            (
                d.cart.is_empty(),
                d.coupon_data.clone(),
                d.selected_service.as_ref().map(|s| s.price),
            )
        });
        if cart_is_empty {
            let stale = coupon.is_some() && previous_price != Some(service.price);
            if stale {
                debug!(service = service.id, "service price changed; coupon discount dropped");
                patch = patch.coupon_data(None).total_price(service.price);
            } else {
                patch = patch.total_price(single_service_total(service.price, coupon.as_ref()));
            }
        }
        self.store.batch_update(patch.service(service));
    }

    pub fn select_date(
        &self,
        date: NaiveDate,
    ) {
        self.store.batch_update(BookingPatch::new().date(date));
    }

    pub fn select_time(
        &self,
        time: impl Into<String>,
    ) {
        self.store.batch_update(BookingPatch::new().time(time));
    }

    pub fn select_address(
        &self,
        address: AddressRef,
    ) {
        self.store.batch_update(BookingPatch::new().address(address));
    }

    pub fn select_payment_method(
        &self,
        method: PaymentMethodRef,
    ) {
        self.store.batch_update(BookingPatch::new().payment_method(method));
    }

    /// Free-text input, so it goes through the debounce window.
    pub fn set_special_requests(
        &self,
        text: impl Into<String>,
    ) {
        self.store.update(BookingPatch::new().special_requests(text));
    }

    // ── coupons ─────────────────────────────────────────────────────────

    pub fn set_coupon_code(
        &mut self,
        code: impl Into<String>,
    ) {
        self.coupon_error = None;
        self.store.batch_update(BookingPatch::new().coupon_code(code));
    }

    /// Validates the entered coupon code against the current base amount.
    ///
    /// A blank code is a no-op and returns `Ok(None)`. On failure the error is
    /// kept for display and the draft is left as it was.
    pub async fn apply_coupon(&mut self) -> Result<Option<CouponResult>, CouponError> {
        let (code, amount, single_service_price) = self.store.with_draft(|d| {
            let single = if d.cart.is_empty() {
                d.selected_service.as_ref().map(|s| s.price)
            } else {
                None
            };
            (d.coupon_code.trim().to_string(), coupon_base_amount(d), single)
        });

        if code.is_empty() {
            return Ok(None);
        }

        match self.coupons.validate(&code, amount).await {
            Ok(result) => {
                info!(code = %result.code, discount = %result.discount_amount, "coupon applied");
                let mut patch = BookingPatch::new().coupon_data(Some(result.clone()));
                if let Some(price) = single_service_price {
                    patch = patch.total_price(single_service_total(price, Some(&result)));
                }
                self.store.batch_update(patch);
                self.coupon_error = None;
                Ok(Some(result))
            }
            Err(err) => {
                warn!(%code, "coupon rejected: {err}");
                self.coupon_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drops the coupon code and its discount.
    pub fn remove_coupon(&mut self) {
        self.coupon_error = None;
        let single_service_price = self.store.with_draft(|d| {
            if d.cart.is_empty() {
                d.selected_service.as_ref().map(|s| s.price)
            } else {
                None
            }
        });

        let mut patch = BookingPatch::new().coupon_code("").coupon_data(None);
        if let Some(price) = single_service_price {
            patch = patch.total_price(price);
        }
        self.store.batch_update(patch);
    }

    pub fn coupon_error(&self) -> Option<&CouponError> {
        self.coupon_error.as_ref()
    }

    pub fn dismiss_coupon_error(&mut self) {
        self.coupon_error = None;
    }

    // ── submission ──────────────────────────────────────────────────────

    /// Submits the booking using today's local date for the date check.
    pub async fn submit(&mut self) -> Result<BookingConfirmation, SubmissionError> {
        self.submit_on(Local::now().date_naive()).await
    }

    /// Flushes pending edits, validates, and hands the booking to the
    /// submitter. On success the draft is discarded and a success
    /// notification is shown; on failure the draft is kept for a retry.
    pub async fn submit_on(
        &mut self,
        today: NaiveDate,
    ) -> Result<BookingConfirmation, SubmissionError> {
        self.store.flush().await;
        let draft = self.store.draft();

        let errors = validate_for_submit(&draft, today);
        self.store.set_field_errors(errors.clone());
        if !errors.is_valid() {
            return Err(self.fail(SubmissionError::Validation(errors)));
        }

        let submission = match BookingSubmission::from_draft(&draft) {
            Ok(submission) => submission,
            Err(err) => return Err(self.fail(err)),
        };

        match self.submitter.submit(submission).await {
            Ok(confirmation) => {
                info!(booking = %confirmation.reference, "booking confirmed");
                self.notify(
                    NotificationKind::Success,
                    format!("Booking confirmed: {}", confirmation.reference),
                );
                self.submission_error = None;
                self.coupon_error = None;
                self.confirmation = Some(confirmation.clone());
                self.store.reset();
                Ok(confirmation)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(
        &mut self,
        err: SubmissionError,
    ) -> SubmissionError {
        warn!("booking submission failed: {err}");
        self.submission_error = Some(err.clone());
        err
    }

    fn notify(
        &mut self,
        kind: NotificationKind,
        message: String,
    ) {
        self.notification = Some(Notification {
            kind,
            message,
            expires_at: Instant::now() + self.config.notification_timeout(),
        });
    }

    pub fn submission_error(&self) -> Option<&SubmissionError> {
        self.submission_error.as_ref()
    }

    pub fn dismiss_submission_error(&mut self) {
        self.submission_error = None;
    }

    /// The current notification, unless it has timed out.
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref().filter(|n| !n.is_expired())
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    pub fn confirmation(&self) -> Option<&BookingConfirmation> {
        self.confirmation.as_ref()
    }

    // ── derived ─────────────────────────────────────────────────────────

    pub fn progress_percentage(&self) -> u8 {
        self.store.progress_percentage()
    }

    pub fn can_proceed(&self) -> bool {
        self.store.can_proceed()
    }

    pub fn cart_totals(&self) -> CartTotals {
        self.store.cart_totals()
    }

    /// Abandons the flow. Pending edits are dropped, the draft is discarded
    /// and the store accepts no further changes.
    pub fn close(&mut self) {
        self.store.reset();
        self.store.close();
        self.coupon_error = None;
        self.submission_error = None;
        self.notification = None;
    }
}
