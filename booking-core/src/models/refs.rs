use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CartItem;

const DEFAULT_DURATION_MINUTES: u32 = 60;

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

/// A salon service as handed over by the service picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
}

impl ServiceRef {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

impl From<&CartItem> for ServiceRef {
    fn from(item: &CartItem) -> Self {
        Self::new(item.id, item.name.clone(), item.price())
    }
}

/// A saved customer address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRef {
    pub id: i64,
    pub title: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodRef {
    pub id: String,
    pub name: String,
}

impl PaymentMethodRef {
    /// Cash on arrival, the only method the salon accepts today.
    pub fn cash() -> Self {
        Self {
            id: "cash".to_string(),
            name: "Cash".to_string(),
        }
    }
}
