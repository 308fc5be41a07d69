use std::{fs, path::Path};

use anyhow::{Context, Result};
use booking_core::{AddressRef, CartItem, PaymentMethodRef, ServiceRef};
use chrono::NaiveDate;
use serde::Deserialize;

/// A scripted booking, read from TOML.
///
/// Dates are quoted strings (`"2026-10-21"`) and times use `HH:MM`.
/// Either `service` or at least one `[[cart]]` entry is needed; with a cart
/// the first item becomes the booked service.
///
/// ```toml
/// date = "2026-10-21"
/// time = "10:00"
/// coupon = "WELCOME10"
///
/// [service]
/// id = 1
/// name = "Haircut"
/// price = "120"
///
/// [address]
/// id = 7
/// title = "Home"
/// address = "12 King Fahd Rd, Riyadh"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookingRequest {
    #[serde(default)]
    pub service: Option<ServiceRef>,
    pub date: NaiveDate,
    pub time: String,
    pub address: AddressRef,
    #[serde(default = "PaymentMethodRef::cash")]
    pub payment_method: PaymentMethodRef,
    #[serde(default)]
    pub coupon: Option<String>,
    #[serde(default)]
    pub special_requests: String,
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

impl BookingRequest {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid booking request")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to open: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Failed to parse booking request: {}", path.display()))
    }

    /// The coupon code, if one was given and is not blank.
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}
