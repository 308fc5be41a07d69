//! Booking state store: the single writer of a [`BookingDraft`](crate::BookingDraft).

mod booking_store;
pub mod debounce;
mod patch;

pub use booking_store::BookingStore;
pub use patch::{BookingPatch, DraftUpdate};
