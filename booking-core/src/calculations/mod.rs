//! Pure calculations over a booking draft.
//!
//! Nothing in here touches the store or the collaborators; every function
//! takes its inputs by reference and returns a fresh value.

pub mod common;
pub mod pricing;
pub mod progress;

pub use pricing::{CartTotals, cart_totals, coupon_base_amount, single_service_total};
pub use progress::progress_percentage;
