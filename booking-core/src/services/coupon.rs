use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::cache::RequestCache;
use crate::config::FlowConfig;
use crate::db::repository::BookingRepository;
use crate::models::{CouponError, CouponResult, normalize_code};

/// Validates a coupon code against the amount it would discount.
#[async_trait]
pub trait CouponValidator: Send + Sync {
    async fn validate(
        &self,
        code: &str,
        amount: Decimal,
    ) -> Result<CouponResult, CouponError>;
}

/// [`CouponValidator`] backed by a [`BookingRepository`].
///
/// Results are cached per `(code, amount)` for the configured TTL, and
/// identical lookups in flight at the same time hit the repository once.
pub struct RepositoryCouponValidator {
    repo: Arc<dyn BookingRepository>,
    cache: RequestCache<(String, Decimal), CouponResult>,
}

impl RepositoryCouponValidator {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        config: &FlowConfig,
    ) -> Self {
        Self {
            repo,
            cache: RequestCache::new(config.coupon_cache_ttl(), config.coupon_cache_capacity),
        }
    }

    /// Forgets cached results, e.g. after coupons were reloaded.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[async_trait]
impl CouponValidator for RepositoryCouponValidator {
    async fn validate(
        &self,
        code: &str,
        amount: Decimal,
    ) -> Result<CouponResult, CouponError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(CouponError::InvalidCode);
        }

        let key = (code.clone(), amount.normalize());
        let repo = &self.repo;
        let result = self
            .cache
            .get_or_try_insert_with(key, || async {
                debug!(%code, %amount, "looking up coupon");
                let coupon = repo.get_coupon_by_code(&code).await?;
                coupon.evaluate(amount, Utc::now())
            })
            .await?;

        info!(code = %result.code, discount = %result.discount_amount, "coupon validated");
        Ok(result)
    }
}
