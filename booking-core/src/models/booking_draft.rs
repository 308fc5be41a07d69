use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AddressRef, Cart, CouponResult, PaymentMethodRef, ServiceRef};

/// The in-progress, unsaved booking form for one session.
///
/// Starts with every field empty. Only the booking store mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub selected_service: Option<ServiceRef>,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<String>,
    pub selected_address: Option<AddressRef>,
    pub payment_method: Option<PaymentMethodRef>,
    pub coupon_code: String,
    pub coupon_data: Option<CouponResult>,
    pub special_requests: String,
    pub cart: Cart,
    pub total_price: Decimal,
}

impl BookingDraft {
    /// A time has been picked. Its format is checked at submit.
    pub fn has_time(&self) -> bool {
        self.selected_time.is_some()
    }

    /// Service, date and time are all chosen.
    pub fn has_required_fields(&self) -> bool {
        self.selected_service.is_some() && self.selected_date.is_some() && self.has_time()
    }

    /// Required fields plus an address. Payment and coupon do not matter.
    pub fn can_proceed(&self) -> bool {
        self.has_required_fields() && self.selected_address.is_some()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn ready_draft() -> BookingDraft {
        BookingDraft {
            selected_service: Some(ServiceRef::new(1, "Haircut", dec!(80))),
            selected_date: NaiveDate::from_ymd_opt(2025, 6, 2),
            selected_time: Some("10:30".to_string()),
            selected_address: Some(AddressRef {
                id: 3,
                title: "Home".to_string(),
                address: "King Fahd Rd".to_string(),
            }),
            ..BookingDraft::default()
        }
    }

    #[test]
    fn empty_draft_cannot_proceed() {
        let draft = BookingDraft::default();

        assert!(!draft.has_required_fields());
        assert!(!draft.can_proceed());
    }

    #[test]
    fn can_proceed_ignores_payment_and_coupon() {
        let draft = ready_draft();

        assert!(draft.payment_method.is_none());
        assert!(draft.coupon_code.is_empty());
        assert!(draft.can_proceed());
    }

    #[test]
    fn any_picked_time_counts_even_blank() {
        let draft = BookingDraft {
            selected_time: Some(" ".to_string()),
            ..ready_draft()
        };

        assert!(draft.has_required_fields());
        assert!(draft.can_proceed());
    }

    #[test]
    fn missing_time_blocks_proceeding() {
        let draft = BookingDraft {
            selected_time: None,
            ..ready_draft()
        };

        assert!(!draft.has_required_fields());
        assert!(!draft.can_proceed());
    }

    #[test]
    fn address_is_needed_to_proceed() {
        let draft = BookingDraft {
            selected_address: None,
            ..ready_draft()
        };

        assert!(draft.has_required_fields());
        assert!(!draft.can_proceed());
    }
}
