use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingPayment,
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(Self::PendingPayment),
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// A cart line frozen into a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub service_id: i64,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub reference: String,
    pub service_id: i64,
    pub service_name: String,
    pub address_id: i64,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub payment_method: String,
    pub special_requests: String,

    // Pricing
    pub price: Decimal,
    pub coupon_id: Option<i64>,
    pub discount_amount: Decimal,
    pub final_price: Decimal,

    pub status: BookingStatus,
    pub cart_lines: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
}

/// For creating new bookings (no id, reference or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub service_id: i64,
    pub service_name: String,
    pub address_id: i64,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub payment_method: String,
    pub special_requests: String,
    pub price: Decimal,
    pub coupon_id: Option<i64>,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub status: BookingStatus,
    pub cart_lines: Vec<CartLine>,
}

impl Booking {
    /// Human-facing reference, `BK` followed by the creation timestamp and the
    /// zero-padded id.
    pub fn make_reference(
        id: i64,
        created_at: DateTime<Utc>,
    ) -> String {
        format!("BK{}{:06}", created_at.format("%Y%m%d%H%M%S"), id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn reference_embeds_timestamp_and_padded_id() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();

        assert_eq!(Booking::make_reference(42, created_at), "BK20250309140507000042");
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            BookingStatus::PendingPayment,
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
    }
}
