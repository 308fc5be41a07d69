//! Booking form completion percentage.
//!
//! | Step           | Condition                                   | Weight |
//! |----------------|---------------------------------------------|--------|
//! | Service        | a service is selected                       | 20     |
//! | Schedule       | both a date and a time are selected         | 20     |
//! | Address        | an address is selected                      | 20     |
//! | Payment        | a payment method is selected                | 20     |
//! | Extras         | special requests or a coupon code are given | 20     |
//!
//! # Example
//!
//! ```
//! use booking_core::BookingDraft;
//! use booking_core::calculations::progress_percentage;
//!
//! let draft = BookingDraft {
//!     special_requests: "Quiet room please".to_string(),
//!     ..BookingDraft::default()
//! };
//!
//! assert_eq!(progress_percentage(&draft), 20);
//! ```

use crate::models::BookingDraft;

const STEP_WEIGHT: u8 = 20;
const MAX_PROGRESS: u8 = 100;

/// Percentage of the booking form that is filled in, in `0..=100`.
///
/// Adding information never lowers the result.
pub fn progress_percentage(draft: &BookingDraft) -> u8 {
    let steps = [
        draft.selected_service.is_some(),
        draft.selected_date.is_some() && draft.has_time(),
        draft.selected_address.is_some(),
        draft.payment_method.is_some(),
        !draft.special_requests.is_empty() || !draft.coupon_code.is_empty(),
    ];

    let progress: u8 = steps
        .iter()
        .filter(|done| **done)
        .map(|_| STEP_WEIGHT)
        .sum();

    progress.min(MAX_PROGRESS)
}
