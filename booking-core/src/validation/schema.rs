//! Rules a draft must satisfy before it is submitted.

use chrono::NaiveDate;

use super::rules::{self, DATE_FORMAT};
use super::{FieldErrors, ValidationRule, validate_field};
use crate::models::BookingDraft;

pub const SERVICE: &str = "service";
pub const DATE: &str = "date";
pub const TIME: &str = "time";
pub const ADDRESS: &str = "address";
pub const PAYMENT_METHOD: &str = "payment_method";

fn presence(message: &str) -> ValidationRule {
    rules::required().with_message(message)
}

/// Checks every submit-time field of `draft` and returns the outcome for each.
pub fn validate_for_submit(
    draft: &BookingDraft,
    today: NaiveDate,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let service = draft
        .selected_service
        .as_ref()
        .map(|s| s.name.clone())
        .unwrap_or_default();
    validate_field(&mut errors, SERVICE, &service, &[presence("Please select a service")]);

    let date = draft
        .selected_date
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    validate_field(
        &mut errors,
        DATE,
        &date,
        &[presence("Please select a date"), rules::date_not_past(today)],
    );

    let time = draft.selected_time.clone().unwrap_or_default();
    validate_field(
        &mut errors,
        TIME,
        time.trim(),
        &[presence("Please select a time"), rules::time_format()],
    );

    let address = if draft.selected_address.is_some() { "set" } else { "" };
    validate_field(&mut errors, ADDRESS, address, &[presence("Please select an address")]);

    let payment = draft
        .payment_method
        .as_ref()
        .map(|p| p.id.clone())
        .unwrap_or_default();
    validate_field(
        &mut errors,
        PAYMENT_METHOD,
        &payment,
        &[presence("Please select a payment method")],
    );

    errors
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{AddressRef, PaymentMethodRef, ServiceRef};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn complete() -> BookingDraft {
        BookingDraft {
            selected_service: Some(ServiceRef::new(1, "Hair colouring", dec!(250))),
            selected_date: NaiveDate::from_ymd_opt(2025, 6, 3),
            selected_time: Some("14:00".to_string()),
            selected_address: Some(AddressRef {
                id: 9,
                title: "Office".to_string(),
                address: "Tahlia St".to_string(),
            }),
            payment_method: Some(PaymentMethodRef::cash()),
            ..BookingDraft::default()
        }
    }

    #[test]
    fn complete_draft_passes() {
        assert!(validate_for_submit(&complete(), today()).is_valid());
    }

    #[test]
    fn empty_draft_reports_every_field() {
        let errors = validate_for_submit(&BookingDraft::default(), today());

        assert_eq!(errors.get(SERVICE), Some("Please select a service"));
        assert_eq!(errors.get(DATE), Some("Please select a date"));
        assert_eq!(errors.get(TIME), Some("Please select a time"));
        assert_eq!(errors.get(ADDRESS), Some("Please select an address"));
        assert_eq!(errors.get(PAYMENT_METHOD), Some("Please select a payment method"));
    }

    #[test]
    fn past_date_is_rejected() {
        let draft = BookingDraft {
            selected_date: NaiveDate::from_ymd_opt(2025, 5, 20),
            ..complete()
        };

        let errors = validate_for_submit(&draft, today());

        assert_eq!(errors.get(DATE), Some("Date cannot be in the past"));
        assert_eq!(errors.iter().count(), 1);
    }

    #[test]
    fn malformed_time_is_rejected() {
        let draft = BookingDraft {
            selected_time: Some("25:00".to_string()),
            ..complete()
        };

        let errors = validate_for_submit(&draft, today());

        assert_eq!(errors.get(TIME), Some("Please enter a valid time"));
    }
}
