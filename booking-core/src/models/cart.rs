//! Cart of services collected before booking.
//!
//! A [`Cart`] keeps its items in insertion order and holds at most one entry
//! per service id; adding the same service again bumps the quantity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ServiceRef;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart item price must be non-negative, got {0}")]
    NegativePrice(Decimal),

    #[error("cart item quantity must be at least 1")]
    ZeroQuantity,
}

#[derive(Deserialize)]
struct RawCartItem {
    id: i64,
    name: String,
    price: Decimal,
    quantity: u32,
}

/// One line of the cart.
///
/// `price` is never negative and `quantity` is never zero; both are checked
/// on construction and on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCartItem")]
pub struct CartItem {
    pub id: i64,
    pub name: String,
    price: Decimal,
    quantity: u32,
}

impl TryFrom<RawCartItem> for CartItem {
    type Error = CartError;

    fn try_from(raw: RawCartItem) -> Result<Self, Self::Error> {
        CartItem::new(raw.id, raw.name, raw.price, raw.quantity)
    }
}

impl CartItem {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
    ) -> Result<Self, CartError> {
        if price < Decimal::ZERO {
            return Err(CartError::NegativePrice(price));
        }
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        Ok(Self {
            id,
            name: name.into(),
            price,
            quantity,
        })
    }

    /// Builds a cart line for a selected service.
    pub fn from_service(
        service: &ServiceRef,
        quantity: u32,
    ) -> Result<Self, CartError> {
        Self::new(service.id, service.name.clone(), service.price, quantity)
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `price × quantity`
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn first(&self) -> Option<&CartItem> {
        self.items.first()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Adds `item` to the cart. If a line with the same id exists its
    /// quantity grows by `item.quantity()`; otherwise the item is appended.
    pub fn add(
        &mut self,
        item: CartItem,
    ) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => self.items.push(item),
        }
    }

    /// Removes the line for `item.id` if present, otherwise appends `item`
    /// with a quantity of one. Returns `true` when the item ends up in the cart.
    pub fn toggle(
        &mut self,
        mut item: CartItem,
    ) -> bool {
        if self.remove(item.id).is_some() {
            return false;
        }
        item.quantity = 1;
        self.items.push(item);
        true
    }

    pub fn remove(
        &mut self,
        id: i64,
    ) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Sets the quantity of the line with `id`. A quantity of zero removes the
    /// line. Returns `false` when no such line exists.
    pub fn update_quantity(
        &mut self,
        id: i64,
        quantity: u32,
    ) -> bool {
        if quantity == 0 {
            return self.remove(id).is_some();
        }
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(
        &self,
        id: i64,
    ) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Quantity held for `id`, zero when the service is not in the cart.
    pub fn quantity_of(
        &self,
        id: i64,
    ) -> u32 {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map_or(0, CartItem::quantity)
    }

    /// Sum of all quantities.
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `price × quantity` over every line.
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        let mut cart = Cart::new();
        for item in iter {
            cart.add(item);
        }
        cart
    }
}
