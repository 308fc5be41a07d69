//! Collaborators of the booking flow: coupon validation and booking
//! submission, with repository-backed implementations.

pub mod cache;
mod coupon;
mod submission;

pub use cache::RequestCache;
pub use coupon::{CouponValidator, RepositoryCouponValidator};
pub use submission::{
    BookingConfirmation, BookingSubmission, BookingSubmitter, RepositoryBookingSubmitter,
    SubmissionError,
};
