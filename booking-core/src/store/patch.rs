use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{AddressRef, BookingDraft, Cart, CouponResult, PaymentMethodRef, ServiceRef};

/// A single field assignment on a [`BookingDraft`].
///
/// `Option` payloads clear the field when `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftUpdate {
    Service(Option<ServiceRef>),
    Date(Option<NaiveDate>),
    Time(Option<String>),
    Address(Option<AddressRef>),
    PaymentMethod(Option<PaymentMethodRef>),
    CouponCode(String),
    CouponData(Option<CouponResult>),
    SpecialRequests(String),
    CartItems(Cart),
    TotalPrice(Decimal),
}

impl DraftUpdate {
    pub fn apply_to(
        self,
        draft: &mut BookingDraft,
    ) {
        match self {
            Self::Service(service) => draft.selected_service = service,
            Self::Date(date) => draft.selected_date = date,
            Self::Time(time) => draft.selected_time = time,
            Self::Address(address) => draft.selected_address = address,
            Self::PaymentMethod(method) => draft.payment_method = method,
            Self::CouponCode(code) => draft.coupon_code = code,
            Self::CouponData(data) => draft.coupon_data = data,
            Self::SpecialRequests(text) => draft.special_requests = text,
            Self::CartItems(cart) => draft.cart = cart,
            Self::TotalPrice(price) => draft.total_price = price,
        }
    }

    /// Field name as used in logs and field errors.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Service(_) => "service",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Address(_) => "address",
            Self::PaymentMethod(_) => "payment_method",
            Self::CouponCode(_) => "coupon_code",
            Self::CouponData(_) => "coupon_data",
            Self::SpecialRequests(_) => "special_requests",
            Self::CartItems(_) => "cart_items",
            Self::TotalPrice(_) => "total_price",
        }
    }
}

/// An ordered list of field assignments applied together.
///
/// Fields the patch does not mention are left as they are. When a field is
/// assigned twice the later assignment wins.
///
/// ```
/// use booking_core::{BookingDraft, BookingPatch};
///
/// let mut draft = BookingDraft::default();
/// BookingPatch::new()
///     .time("10:30")
///     .special_requests("Window seat")
///     .apply(&mut draft);
///
/// assert_eq!(draft.selected_time.as_deref(), Some("10:30"));
/// assert_eq!(draft.special_requests, "Window seat");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingPatch {
    updates: Vec<DraftUpdate>,
}

impl BookingPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        update: DraftUpdate,
    ) -> Self {
        self.updates.push(update);
        self
    }

    pub fn service(
        self,
        service: ServiceRef,
    ) -> Self {
        self.with(DraftUpdate::Service(Some(service)))
    }

    pub fn date(
        self,
        date: NaiveDate,
    ) -> Self {
        self.with(DraftUpdate::Date(Some(date)))
    }

    pub fn time(
        self,
        time: impl Into<String>,
    ) -> Self {
        self.with(DraftUpdate::Time(Some(time.into())))
    }

    pub fn address(
        self,
        address: AddressRef,
    ) -> Self {
        self.with(DraftUpdate::Address(Some(address)))
    }

    pub fn payment_method(
        self,
        method: PaymentMethodRef,
    ) -> Self {
        self.with(DraftUpdate::PaymentMethod(Some(method)))
    }

    pub fn coupon_code(
        self,
        code: impl Into<String>,
    ) -> Self {
        self.with(DraftUpdate::CouponCode(code.into()))
    }

    pub fn coupon_data(
        self,
        data: Option<CouponResult>,
    ) -> Self {
        self.with(DraftUpdate::CouponData(data))
    }

    pub fn special_requests(
        self,
        text: impl Into<String>,
    ) -> Self {
        self.with(DraftUpdate::SpecialRequests(text.into()))
    }

    pub fn cart(
        self,
        cart: Cart,
    ) -> Self {
        self.with(DraftUpdate::CartItems(cart))
    }

    pub fn total_price(
        self,
        price: Decimal,
    ) -> Self {
        self.with(DraftUpdate::TotalPrice(price))
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn updates(&self) -> &[DraftUpdate] {
        &self.updates
    }

    /// Names of the fields this patch touches, in order, for logging.
    pub fn fields(&self) -> Vec<&'static str> {
        self.updates.iter().map(DraftUpdate::field).collect()
    }

    pub fn apply(
        self,
        draft: &mut BookingDraft,
    ) {
        for update in self.updates {
            update.apply_to(draft);
        }
    }
}

impl From<DraftUpdate> for BookingPatch {
    fn from(update: DraftUpdate) -> Self {
        Self::new().with(update)
    }
}

impl FromIterator<DraftUpdate> for BookingPatch {
    fn from_iter<I: IntoIterator<Item = DraftUpdate>>(iter: I) -> Self {
        Self {
            updates: iter.into_iter().collect(),
        }
    }
}
