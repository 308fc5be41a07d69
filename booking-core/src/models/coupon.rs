use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::round_half_up;
use crate::db::repository::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => Some(Self::Percentage),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Canonical form of a coupon code as stored and looked up.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CouponError {
    #[error("Invalid coupon code")]
    InvalidCode,

    #[error("Coupon {0} is not active")]
    Inactive(String),

    #[error("Coupon {0} has expired or is not yet valid")]
    Expired(String),

    #[error("Coupon {0} has reached its usage limit")]
    UsageLimitReached(String),

    #[error("Coupon {code} requires a minimum amount of {minimum}")]
    BelowMinimum { code: String, minimum: Decimal },

    #[error("Coupon service error: {0}")]
    Repository(String),
}

impl From<RepositoryError> for CouponError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::InvalidCode,
            other => Self::Repository(other.to_string()),
        }
    }
}

/// A successfully validated coupon together with the discount it grants for
/// the amount it was validated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponResult {
    pub coupon_id: i64,
    pub code: String,
    pub name: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub discount_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub minimum_amount: Decimal,
    pub maximum_discount: Option<Decimal>,
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
}

/// For creating or replacing coupons (no id, usage starts at zero)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub name: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub minimum_amount: Decimal,
    pub maximum_discount: Option<Decimal>,
    pub usage_limit: Option<u32>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
}

impl Coupon {
    /// Whether the coupon can be redeemed at `now`, ignoring the amount.
    pub fn is_valid_at(
        &self,
        now: DateTime<Utc>,
    ) -> bool {
        self.check_redeemable(now).is_ok()
    }

    /// Discount granted on `amount`.
    ///
    /// Percentage coupons take `amount × value / 100`, capped by
    /// `maximum_discount` when set. Fixed coupons take `value`. Either way the
    /// result never exceeds `amount` and is rounded half-up to cents.
    pub fn discount_for(
        &self,
        amount: Decimal,
    ) -> Decimal {
        let amount = amount.max(Decimal::ZERO);
        let raw = match self.discount_type {
            DiscountType::Percentage => {
                let pct = amount * self.discount_value / Decimal::ONE_HUNDRED;
                match self.maximum_discount {
                    Some(cap) => pct.min(cap),
                    None => pct,
                }
            }
            DiscountType::Fixed => self.discount_value,
        };
        round_half_up(raw.min(amount).max(Decimal::ZERO))
    }

    /// Checks eligibility for `amount` at `now` and returns the discount.
    pub fn evaluate(
        &self,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<CouponResult, CouponError> {
        self.check_redeemable(now)?;

        if amount < self.minimum_amount {
            return Err(CouponError::BelowMinimum {
                code: self.code.clone(),
                minimum: self.minimum_amount,
            });
        }

        Ok(CouponResult {
            coupon_id: self.id,
            code: self.code.clone(),
            name: self.name.clone(),
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            discount_amount: self.discount_for(amount),
        })
    }

    fn check_redeemable(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(), CouponError> {
        if !self.is_active {
            return Err(CouponError::Inactive(self.code.clone()));
        }
        if now < self.valid_from || now > self.valid_until {
            return Err(CouponError::Expired(self.code.clone()));
        }
        if self.usage_limit.is_some_and(|limit| self.used_count >= limit) {
            return Err(CouponError::UsageLimitReached(self.code.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn welcome10() -> Coupon {
        Coupon {
            id: 1,
            code: "WELCOME10".to_string(),
            name: "Welcome discount".to_string(),
            description: String::new(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            minimum_amount: dec!(100),
            maximum_discount: Some(dec!(100)),
            usage_limit: Some(100),
            used_count: 0,
            valid_from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            valid_until: Utc.with_ymd_and_hms(2030, 12, 31, 23, 59, 59).unwrap(),
            is_active: true,
        }
    }

    fn save50() -> Coupon {
        Coupon {
            id: 2,
            code: "SAVE50".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: dec!(50),
            minimum_amount: dec!(200),
            maximum_discount: None,
            usage_limit: Some(50),
            ..welcome10()
        }
    }

    #[test]
    fn percentage_discount_is_share_of_amount() {
        assert_eq!(welcome10().discount_for(dec!(250)), dec!(25.00));
    }

    #[test]
    fn percentage_discount_is_capped_by_maximum() {
        assert_eq!(welcome10().discount_for(dec!(5000)), dec!(100));
    }

    #[test]
    fn percentage_discount_rounds_half_up() {
        assert_eq!(welcome10().discount_for(dec!(100.05)), dec!(10.01));
    }

    #[test]
    fn fixed_discount_never_exceeds_amount() {
        assert_eq!(save50().discount_for(dec!(30)), dec!(30));
        assert_eq!(save50().discount_for(dec!(300)), dec!(50));
    }

    #[test]
    fn evaluate_returns_result_for_eligible_amount() {
        let result = welcome10().evaluate(dec!(150), now()).unwrap();

        assert_eq!(result.coupon_id, 1);
        assert_eq!(result.code, "WELCOME10");
        assert_eq!(result.discount_amount, dec!(15.00));
    }

    #[test]
    fn evaluate_rejects_amount_below_minimum() {
        let result = save50().evaluate(dec!(199.99), now());

        assert_eq!(
            result,
            Err(CouponError::BelowMinimum {
                code: "SAVE50".to_string(),
                minimum: dec!(200),
            })
        );
    }

    #[test]
    fn evaluate_rejects_inactive_coupon() {
        let coupon = Coupon {
            is_active: false,
            ..welcome10()
        };

        assert_eq!(
            coupon.evaluate(dec!(150), now()),
            Err(CouponError::Inactive("WELCOME10".to_string()))
        );
    }

    #[test]
    fn evaluate_rejects_expired_coupon() {
        let coupon = Coupon {
            valid_until: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            ..welcome10()
        };

        assert_eq!(
            coupon.evaluate(dec!(150), now()),
            Err(CouponError::Expired("WELCOME10".to_string()))
        );
    }

    #[test]
    fn evaluate_rejects_exhausted_coupon() {
        let coupon = Coupon {
            used_count: 100,
            ..welcome10()
        };

        assert!(!coupon.is_valid_at(now()));
        assert_eq!(
            coupon.evaluate(dec!(150), now()),
            Err(CouponError::UsageLimitReached("WELCOME10".to_string()))
        );
    }

    #[test]
    fn unlimited_coupon_ignores_used_count() {
        let coupon = Coupon {
            usage_limit: None,
            used_count: 10_000,
            ..welcome10()
        };

        assert!(coupon.is_valid_at(now()));
    }

    #[test]
    fn not_found_maps_to_invalid_code() {
        assert_eq!(
            CouponError::from(RepositoryError::NotFound),
            CouponError::InvalidCode
        );
    }

    #[test]
    fn normalize_code_trims_and_uppercases() {
        assert_eq!(normalize_code("  save50 "), "SAVE50");
    }

    #[test]
    fn discount_type_parses_case_insensitively() {
        assert_eq!(DiscountType::parse("Percentage"), Some(DiscountType::Percentage));
        assert_eq!(DiscountType::parse("FIXED"), Some(DiscountType::Fixed));
        assert_eq!(DiscountType::parse("bogo"), None);
    }
}
