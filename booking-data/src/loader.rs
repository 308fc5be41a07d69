use std::collections::HashSet;
use std::io::Read;

use booking_core::{BookingRepository, DiscountType, NewCoupon, RepositoryError, normalize_code};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading coupon data.
#[derive(Debug, Error)]
pub enum CouponLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid discount type '{discount_type}' for coupon {code}")]
    InvalidDiscountType { code: String, discount_type: String },

    #[error("Coupon {code}: {reason}")]
    InvalidRecord { code: String, reason: String },

    #[error("Duplicate coupon code in file: {0}")]
    DuplicateCode(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for CouponLoaderError {
    fn from(err: csv::Error) -> Self {
        CouponLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the coupons CSV file.
///
/// - `code`: Redemption code, matched case-insensitively
/// - `discount_type`: `percentage` or `fixed`
/// - `discount_value`: Percent (e.g. `10`) or currency amount (e.g. `50`)
/// - `minimum_amount`: Smallest booking amount the coupon applies to
/// - `maximum_discount`: Cap on a percentage discount (empty for none)
/// - `usage_limit`: Total redemptions allowed (empty for unlimited)
/// - `valid_from` / `valid_until`: Inclusive `YYYY-MM-DD` dates, in UTC
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CouponRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub minimum_amount: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub maximum_discount: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_u32")]
    pub usage_limit: Option<u32>,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    pub is_active: bool,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn deserialize_optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::seconds(1)
}

impl CouponRecord {
    /// Convert the raw record into a coupon ready for upsert.
    pub fn to_new_coupon(&self) -> Result<NewCoupon, CouponLoaderError> {
        let code = normalize_code(&self.code);
        let invalid = |reason: &str| CouponLoaderError::InvalidRecord {
            code: code.clone(),
            reason: reason.to_string(),
        };

        if code.is_empty() {
            return Err(invalid("code is empty"));
        }

        let discount_type = DiscountType::parse(&self.discount_type).ok_or_else(|| {
            CouponLoaderError::InvalidDiscountType {
                code: code.clone(),
                discount_type: self.discount_type.clone(),
            }
        })?;

        if self.discount_value <= Decimal::ZERO {
            return Err(invalid("discount_value must be positive"));
        }
        if discount_type == DiscountType::Percentage && self.discount_value > Decimal::ONE_HUNDRED {
            return Err(invalid("percentage discount cannot exceed 100"));
        }
        if self.minimum_amount < Decimal::ZERO {
            return Err(invalid("minimum_amount cannot be negative"));
        }
        if self.valid_until < self.valid_from {
            return Err(invalid("valid_until is before valid_from"));
        }

        Ok(NewCoupon {
            code: code.clone(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            discount_type,
            discount_value: self.discount_value,
            minimum_amount: self.minimum_amount,
            maximum_discount: self.maximum_discount,
            usage_limit: self.usage_limit,
            valid_from: start_of_day(self.valid_from),
            valid_until: end_of_day(self.valid_until),
            is_active: self.is_active,
        })
    }
}

/// Loader for coupon definitions from CSV files.
///
/// Records are validated as a whole before anything is written, so a bad row
/// leaves the database untouched.
pub struct CouponLoader;

impl CouponLoader {
    /// Parse coupon records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CouponRecord>, CouponLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: CouponRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Upsert coupon records into the database.
    ///
    /// Existing coupons are updated in place and keep their redemption count,
    /// so loading the same file twice produces the same result.
    pub async fn load<R: BookingRepository + ?Sized>(
        repo: &R,
        records: &[CouponRecord],
    ) -> Result<usize, CouponLoaderError> {
        let mut seen = HashSet::new();
        let mut coupons = Vec::with_capacity(records.len());
        for record in records {
            let coupon = record.to_new_coupon()?;
            if !seen.insert(coupon.code.clone()) {
                return Err(CouponLoaderError::DuplicateCode(coupon.code));
            }
            coupons.push(coupon);
        }

        for coupon in &coupons {
            repo.upsert_coupon(coupon).await?;
        }

        Ok(coupons.len())
    }
}
