mod booking;
mod booking_draft;
mod cart;
mod coupon;
mod refs;

pub use booking::{Booking, BookingStatus, CartLine, NewBooking};
pub use booking_draft::BookingDraft;
pub use cart::{Cart, CartError, CartItem};
pub use coupon::{Coupon, CouponError, CouponResult, DiscountType, NewCoupon, normalize_code};
pub use refs::{AddressRef, PaymentMethodRef, ServiceRef};
