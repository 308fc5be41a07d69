//! Cart and price aggregation.
//!
//! The displayed total follows two regimes:
//!
//! | Cart      | Displayed total                         |
//! |-----------|-----------------------------------------|
//! | non-empty | Σ price × quantity over the cart lines  |
//! | empty     | the draft's precomputed `total_price`   |
//!
//! A validated coupon's discount is carried next to the total as auxiliary
//! information. It is not subtracted from the cart subtotal; the single
//! service path folds it in through [`single_service_total`] when the flow
//! writes `total_price`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::non_negative;
use crate::models::{BookingDraft, CouponResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Σ price × quantity over the cart, zero when empty.
    pub subtotal: Decimal,
    /// Discount granted by the applied coupon, zero when none.
    pub discount: Decimal,
    /// What the booking screen shows as the total.
    pub displayed_total: Decimal,
    /// Σ quantity over the cart.
    pub item_count: u64,
}

pub fn cart_totals(draft: &BookingDraft) -> CartTotals {
    let subtotal = draft.cart.subtotal();
    let discount = draft
        .coupon_data
        .as_ref()
        .map_or(Decimal::ZERO, |coupon| coupon.discount_amount);

    let displayed_total = if draft.cart.is_empty() {
        draft.total_price
    } else {
        subtotal
    };

    CartTotals {
        subtotal,
        discount,
        displayed_total,
        item_count: draft.cart.total_items(),
    }
}

/// `max(0, price − discount)` for a single selected service.
pub fn single_service_total(
    price: Decimal,
    coupon: Option<&CouponResult>,
) -> Decimal {
    let discount = coupon.map_or(Decimal::ZERO, |c| c.discount_amount);
    non_negative(price - discount)
}

/// Amount a coupon is validated against and the booking is priced at.
///
/// The cart subtotal when the cart has items, otherwise the selected
/// service's price, otherwise whatever `total_price` holds.
pub fn coupon_base_amount(draft: &BookingDraft) -> Decimal {
    if !draft.cart.is_empty() {
        return draft.cart.subtotal();
    }
    draft
        .selected_service
        .as_ref()
        .map_or(draft.total_price, |service| service.price)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Cart, CartItem, DiscountType, ServiceRef};

    fn cart_of(lines: &[(i64, Decimal, u32)]) -> Cart {
        lines
            .iter()
            .map(|(id, price, qty)| CartItem::new(*id, format!("svc-{id}"), *price, *qty).unwrap())
            .collect()
    }

    fn coupon(discount: Decimal) -> CouponResult {
        CouponResult {
            coupon_id: 1,
            code: "SAVE50".to_string(),
            name: "Save 50".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: dec!(50),
            discount_amount: discount,
        }
    }

    #[test]
    fn cart_total_is_sum_of_lines() {
        let draft = BookingDraft {
            cart: cart_of(&[(1, dec!(10), 2), (2, dec!(5), 3)]),
            ..BookingDraft::default()
        };

        let totals = cart_totals(&draft);

        assert_eq!(totals.subtotal, dec!(35));
        assert_eq!(totals.displayed_total, dec!(35));
        assert_eq!(totals.item_count, 5);
    }

    #[test]
    fn empty_cart_shows_precomputed_total() {
        let draft = BookingDraft {
            total_price: dec!(99),
            ..BookingDraft::default()
        };

        let totals = cart_totals(&draft);

        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.displayed_total, dec!(99));
    }

    #[test]
    fn cart_total_keeps_coupon_discount_separate() {
        let draft = BookingDraft {
            cart: cart_of(&[(1, dec!(150), 2)]),
            coupon_data: Some(coupon(dec!(50))),
            ..BookingDraft::default()
        };

        let totals = cart_totals(&draft);

        assert_eq!(totals.displayed_total, dec!(300));
        assert_eq!(totals.discount, dec!(50));
    }

    #[test]
    fn single_service_total_subtracts_discount() {
        assert_eq!(single_service_total(dec!(250), Some(&coupon(dec!(50)))), dec!(200));
        assert_eq!(single_service_total(dec!(250), None), dec!(250));
    }

    #[test]
    fn single_service_total_never_goes_negative() {
        assert_eq!(single_service_total(dec!(30), Some(&coupon(dec!(50)))), Decimal::ZERO);
    }

    #[test]
    fn base_amount_prefers_cart_then_service_then_total() {
        let mut draft = BookingDraft {
            total_price: dec!(12),
            ..BookingDraft::default()
        };
        assert_eq!(coupon_base_amount(&draft), dec!(12));

        draft.selected_service = Some(ServiceRef::new(4, "Facial", dec!(180)));
        assert_eq!(coupon_base_amount(&draft), dec!(180));

        draft.cart = cart_of(&[(1, dec!(100), 1), (2, dec!(60), 2)]);
        assert_eq!(coupon_base_amount(&draft), dec!(220));
    }
}
