use std::{fmt, sync::Arc};

use anyhow::{Context, Result};
use booking_core::{
    BookingFlow, BookingRepository, CouponError, FlowConfig,
    calculations::CartTotals,
    db::{DbConfig, RepositoryRegistry},
    models::{Booking, Coupon, DiscountType},
    services::{BookingConfirmation, RepositoryBookingSubmitter, RepositoryCouponValidator},
};
use booking_db_sqlite::SqliteRepositoryFactory;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::request::BookingRequest;

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

pub async fn open_repository(config: &DbConfig) -> Result<Arc<dyn BookingRepository>> {
    debug!("connecting to {} backend", config.backend);
    let repo = build_registry()
        .create(config)
        .await
        .with_context(|| format!("Failed to open {} database", config.backend))?;
    Ok(Arc::from(repo))
}

/// Result of a scripted booking run.
#[derive(Debug, Clone)]
pub struct BookingRun {
    pub confirmation: BookingConfirmation,
    /// Cart figures as shown just before submission.
    pub cart: CartTotals,
    /// Set when the requested coupon was refused; the booking then went
    /// ahead at full price.
    pub coupon_error: Option<CouponError>,
}

/// Walks a [`BookingFlow`] through the steps a customer would take and
/// submits it.
pub async fn run_booking(
    repo: Arc<dyn BookingRepository>,
    config: &FlowConfig,
    request: &BookingRequest,
    today: NaiveDate,
) -> Result<BookingRun> {
    let mut flow = BookingFlow::new(
        Arc::new(RepositoryCouponValidator::new(repo.clone(), config)),
        Arc::new(RepositoryBookingSubmitter::new(repo)),
        config.clone(),
    );

    for item in &request.cart {
        flow.store().add_to_cart(item.clone());
    }
    if let Some(service) = &request.service {
        flow.select_service(service.clone());
    }
    flow.select_date(request.date);
    flow.select_time(request.time.clone());
    flow.select_address(request.address.clone());
    flow.select_payment_method(request.payment_method.clone());
    if !request.special_requests.is_empty() {
        flow.set_special_requests(request.special_requests.clone());
    }
    debug!(progress = flow.progress_percentage(), "selections made");

    let mut coupon_error = None;
    if let Some(code) = request.coupon_code() {
        flow.set_coupon_code(code);
        if let Err(err) = flow.apply_coupon().await {
            warn!(code, "continuing without coupon: {err}");
            coupon_error = Some(err);
            flow.remove_coupon();
        }
    }

    let cart = flow.cart_totals();
    let result = flow.submit_on(today).await;
    flow.close();

    let confirmation = result.context("Booking was not accepted")?;
    info!(reference = %confirmation.reference, "booking stored");

    Ok(BookingRun {
        confirmation,
        cart,
        coupon_error,
    })
}

// ─── output formatting ───────────────────────────────────────────────────────

impl fmt::Display for BookingRun {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let c = &self.confirmation;
        writeln!(f, "Booking confirmed: {}", c.reference)?;
        if self.cart.item_count > 0 {
            writeln!(f, "  Items:    {}", self.cart.item_count)?;
        }
        writeln!(f, "  Price:    {:.2}", c.price)?;
        if let Some(err) = &self.coupon_error {
            writeln!(f, "  Coupon:   not applied ({err})")?;
        }
        writeln!(f, "  Discount: {:.2}", c.discount_amount)?;
        write!(f, "  Total:    {:.2}", c.final_price)
    }
}

pub fn format_booking(booking: &Booking) -> String {
    format!(
        "{:<22} {} {:<5} {:<24} {:>10.2} {}",
        booking.reference,
        booking.booking_date,
        booking.booking_time,
        booking.service_name,
        booking.final_price,
        booking.status.as_str(),
    )
}

pub fn format_coupon(coupon: &Coupon) -> String {
    let discount = match coupon.discount_type {
        DiscountType::Percentage => format!("{}%", coupon.discount_value.normalize()),
        DiscountType::Fixed => format!("{:.2}", coupon.discount_value),
    };
    let usage = match coupon.usage_limit {
        Some(limit) => format!("{}/{}", coupon.used_count, limit),
        None => format!("{}/-", coupon.used_count),
    };
    format!(
        "{:<12} {:>8} min {:>8.2} used {:<9} until {} {}",
        coupon.code,
        discount,
        coupon.minimum_amount,
        usage,
        coupon.valid_until.date_naive(),
        if coupon.is_active { "active" } else { "inactive" },
    )
}
