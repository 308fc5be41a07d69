use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::debug;

use super::debounce::Debouncer;
use super::patch::{BookingPatch, DraftUpdate};
use crate::calculations::{CartTotals, cart_totals, progress_percentage, single_service_total};
use crate::config::FlowConfig;
use crate::models::{BookingDraft, Cart, CartItem, ServiceRef};
use crate::validation::{self, FieldErrors, ValidationRule};

/// Owner of one [`BookingDraft`].
///
/// Writes go through [`update`](Self::update), which is debounced, or
/// [`batch_update`](Self::batch_update), which applies at once. Observers
/// can [`subscribe`](Self::subscribe) to every applied change. Once the store
/// is closed (explicitly or by drop) nothing is applied any more, including a
/// debounced patch that was still waiting.
pub struct BookingStore {
    state: Arc<watch::Sender<BookingDraft>>,
    closed: Arc<AtomicBool>,
    debouncer: Debouncer<BookingPatch>,
    errors: FieldErrors,
}

fn touches_cart(patch: &BookingPatch) -> bool {
    patch
        .updates()
        .iter()
        .any(|update| matches!(update, DraftUpdate::CartItems(_)))
}

/// A non-empty cart drives the selected service and the total. When the
/// last item goes, the total falls back to the selected service's price less
/// any applied coupon.
fn sync_cart_selection(
    draft: &mut BookingDraft,
    had_items: bool,
) {
    if let Some(first) = draft.cart.first() {
        draft.selected_service = Some(ServiceRef::from(first));
        draft.total_price = draft.cart.subtotal();
    } else if had_items {
        draft.total_price = draft
            .selected_service
            .as_ref()
            .map_or(Decimal::ZERO, |service| {
                single_service_total(service.price, draft.coupon_data.as_ref())
            });
    }
}

/// Runs `f` against the draft unless the store is closed. Observers are
/// notified only when the draft actually changed.
fn mutate<R>(
    state: &watch::Sender<BookingDraft>,
    closed: &AtomicBool,
    f: impl FnOnce(&mut BookingDraft) -> R,
) -> Option<R> {
    let mut outcome = None;
    state.send_if_modified(|draft| {
        if closed.load(Ordering::Acquire) {
            return false;
        }
        let before = draft.clone();
        outcome = Some(f(draft));
        *draft != before
    });
    outcome
}

fn apply_patch(
    state: &watch::Sender<BookingDraft>,
    closed: &AtomicBool,
    patch: BookingPatch,
) -> bool {
    let fields = patch.fields();
    let sync = touches_cart(&patch);
    let applied = mutate(state, closed, |draft| {
        let had_items = !draft.cart.is_empty();
        patch.apply(draft);
        if sync {
            sync_cart_selection(draft, had_items);
        }
    });
    match applied {
        Some(()) => {
            debug!(?fields, "applied booking patch");
            true
        }
        None => {
            debug!(?fields, "store closed; patch dropped");
            false
        }
    }
}

impl BookingStore {
    /// Creates an empty draft.
    ///
    /// # Panics
    /// When called outside a tokio runtime.
    pub fn new(debounce_window: Duration) -> Self {
        let (sender, _) = watch::channel(BookingDraft::default());
        let state = Arc::new(sender);
        let closed = Arc::new(AtomicBool::new(false));

        let debouncer = {
            let state = state.clone();
            let closed = closed.clone();
            Debouncer::spawn(debounce_window, move |patch| {
                apply_patch(&state, &closed, patch);
            })
        };

        Self {
            state,
            closed,
            debouncer,
            errors: FieldErrors::new(),
        }
    }

    pub fn from_config(config: &FlowConfig) -> Self {
        Self::new(config.debounce())
    }

    // ── writes ──────────────────────────────────────────────────────────

    /// Schedules `patch` for the end of the debounce window.
    ///
    /// A later call within the window replaces this patch entirely; the two
    /// are not merged.
    pub fn update(
        &self,
        patch: BookingPatch,
    ) {
        if !self.debouncer.push(patch) {
            debug!("store closed; debounced patch ignored");
        }
    }

    /// Applies `patch` now. Does not touch a pending debounced patch.
    /// Returns `false` when the store is closed.
    pub fn batch_update(
        &self,
        patch: BookingPatch,
    ) -> bool {
        apply_patch(&self.state, &self.closed, patch)
    }

    /// Applies the pending debounced patch, if any, before returning.
    pub async fn flush(&self) {
        self.debouncer.flush().await;
    }

    /// Discards the pending debounced patch.
    pub fn cancel_pending(&self) {
        self.debouncer.cancel_pending();
    }

    /// Drops pending work, empties the draft and clears field errors.
    pub fn reset(&mut self) {
        self.debouncer.cancel_pending();
        self.errors.clear();
        mutate(&self.state, &self.closed, |draft| *draft = BookingDraft::default());
    }

    /// Stops all further mutation.
    pub fn close(&self) {
        self.debouncer.close();
        // Taking the write lock orders the flag after any in-flight apply.
        self.state.send_if_modified(|_| {
            self.closed.store(true, Ordering::Release);
            false
        });
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // ── cart ────────────────────────────────────────────────────────────

    fn edit_cart<R>(
        &self,
        edit: impl FnOnce(&mut Cart) -> R,
    ) -> Option<R> {
        mutate(&self.state, &self.closed, |draft| {
            let had_items = !draft.cart.is_empty();
            let result = edit(&mut draft.cart);
            sync_cart_selection(draft, had_items);
            result
        })
    }

    pub fn add_to_cart(
        &self,
        item: CartItem,
    ) {
        self.edit_cart(|cart| cart.add(item));
    }

    /// Returns `true` when the item is in the cart afterwards.
    pub fn toggle_cart_item(
        &self,
        item: CartItem,
    ) -> bool {
        self.edit_cart(|cart| cart.toggle(item)).unwrap_or(false)
    }

    pub fn remove_from_cart(
        &self,
        id: i64,
    ) -> bool {
        self.edit_cart(|cart| cart.remove(id).is_some())
            .unwrap_or(false)
    }

    pub fn update_cart_quantity(
        &self,
        id: i64,
        quantity: u32,
    ) -> bool {
        self.edit_cart(|cart| cart.update_quantity(id, quantity))
            .unwrap_or(false)
    }

    pub fn clear_cart(&self) {
        self.edit_cart(Cart::clear);
    }

    // ── reads ───────────────────────────────────────────────────────────

    /// Snapshot of the current draft.
    pub fn draft(&self) -> BookingDraft {
        self.state.borrow().clone()
    }

    pub fn with_draft<R>(
        &self,
        f: impl FnOnce(&BookingDraft) -> R,
    ) -> R {
        let draft = self.state.borrow();
        f(&*draft)
    }

    pub fn subscribe(&self) -> watch::Receiver<BookingDraft> {
        self.state.subscribe()
    }

    pub fn has_required_fields(&self) -> bool {
        self.with_draft(BookingDraft::has_required_fields)
    }

    pub fn can_proceed(&self) -> bool {
        self.with_draft(BookingDraft::can_proceed)
    }

    pub fn progress_percentage(&self) -> u8 {
        self.with_draft(progress_percentage)
    }

    pub fn cart_totals(&self) -> CartTotals {
        self.with_draft(cart_totals)
    }

    // ── field errors ────────────────────────────────────────────────────

    pub fn validate_field(
        &mut self,
        field: &str,
        value: &str,
        rules: &[ValidationRule],
    ) -> bool {
        validation::validate_field(&mut self.errors, field, value, rules)
    }

    /// Overwrites the entries named in `errors`; other fields keep theirs.
    pub fn set_field_errors(
        &mut self,
        errors: FieldErrors,
    ) {
        self.errors.merge(errors);
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// No field currently holds an error.
    pub fn is_form_valid(&self) -> bool {
        self.errors.is_valid()
    }
}

impl Drop for BookingStore {
    fn drop(&mut self) {
        self.close();
    }
}
