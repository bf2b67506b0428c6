//! In-process stand-in for the order backend, used when no `UPSTREAM_URL` is
//! configured and by the tests. It enforces the same status rules the real
//! backend does and keeps stock in step with bookings.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{Upstream, UpstreamError, UpstreamResult};
use crate::lifecycle::{
    self, BookingStatus, QuotationAction, QuotationStatus, TransitionError,
};
use crate::models::booking::{Booking, BookingLine, NewPayment, PaymentTransaction};
use crate::models::order::{DispatchLine, OrderDraft, OrderLine};
use crate::models::product::Product;
use crate::models::quotation::Quotation;
use crate::pricing::round2;

#[derive(Default)]
struct Store {
    products: Vec<Product>,
    quotations: Vec<Quotation>,
    bookings: Vec<Booking>,
    next_id: u64,
    fail_next: Option<String>,
}

impl Store {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn take_failure(&mut self) -> UpstreamResult<()> {
        match self.fail_next.take() {
            Some(message) => Err(UpstreamError::Rejected { status: 500, message }),
            None => Ok(()),
        }
    }

    fn quotation_mut(&mut self, id: &str) -> UpstreamResult<&mut Quotation> {
        self.quotations
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("Quotation {id}")))
    }

    fn booking_mut(&mut self, id: &str) -> UpstreamResult<&mut Booking> {
        self.bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("Booking {id}")))
    }

    /// Takes booked quantities out of stock, all or nothing. Lines naming the
    /// same product count against its stock together.
    fn reserve_stock(&mut self, lines: &[OrderLine]) -> UpstreamResult<()> {
        let mut requested: BTreeMap<&str, u32> = BTreeMap::new();
        for line in lines {
            let total = requested.entry(line.serial_number.as_str()).or_default();
            *total = total.saturating_add(line.quantity);
        }

        for (&serial, &quantity) in &requested {
            let product = self
                .products
                .iter()
                .find(|p| p.serial_number == serial)
                .ok_or_else(|| UpstreamError::NotFound(format!("Product {serial}")))?;
            if product.stock < quantity {
                return Err(rejected(format!(
                    "Insufficient stock for {}: {} available",
                    product.product_name, product.stock
                )));
            }
        }
        for (serial, quantity) in requested {
            if let Some(product) = self.products.iter_mut().find(|p| p.serial_number == serial) {
                product.stock -= quantity;
            }
        }
        Ok(())
    }

    fn insert_booking(
        &mut self,
        draft_lines: Vec<OrderLine>,
        base: &OrderDraft,
    ) -> UpstreamResult<Booking> {
        if draft_lines.is_empty() {
            return Err(rejected("Booking must contain at least one product".to_string()));
        }
        self.reserve_stock(&draft_lines)?;
        let id = self.next_id("bk");
        let booking = Booking {
            order_number: format!("GB-{:04}", self.next_id),
            id,
            customer: base.customer.clone(),
            status: BookingStatus::Booked,
            products: draft_lines
                .into_iter()
                .map(|line| BookingLine { line, dispatched_qty: 0 })
                .collect(),
            charges: base.charges,
            total: round2(base.total),
            amount_paid: 0.0,
            transactions: Vec::new(),
            created_at: Utc::now(),
        };
        self.bookings.insert(0, booking.clone());
        Ok(booking)
    }
}

fn rejected(message: String) -> UpstreamError {
    UpstreamError::Rejected { status: 400, message }
}

fn refused(err: TransitionError) -> UpstreamError {
    UpstreamError::Rejected {
        status: if err.is_state_conflict() { 409 } else { 400 },
        message: err.to_string(),
    }
}

fn placeholder_pdf(kind: &str, id: &str) -> Vec<u8> {
    format!("%PDF-1.4\n% {kind} {id}\n%%EOF\n").into_bytes()
}

#[derive(Default)]
pub struct MemoryUpstream {
    store: Mutex<Store>,
}

impl MemoryUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let upstream = Self::new();
        upstream.lock().products = products;
        upstream
    }

    /// Stocks the store from a JSON array of products in the backend's own
    /// shape, so an offline console has a catalog to sell from.
    pub async fn from_catalog_file(path: &Path) -> UpstreamResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| UpstreamError::Request(format!("{}: {e}", path.display())))?;
        let products: Vec<Product> =
            serde_json::from_str(&raw).map_err(|e| UpstreamError::Parse(e.to_string()))?;
        Ok(Self::with_products(products))
    }

    /// Makes the next call fail with a server error carrying `message`.
    #[cfg(test)]
    pub fn fail_next(&self, message: &str) {
        self.lock().fail_next = Some(message.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        // A poisoned store only means a panicking test; the data is still usable.
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Upstream for MemoryUpstream {
    async fn list_products(&self) -> UpstreamResult<Vec<Product>> {
        let mut store = self.lock();
        store.take_failure()?;
        Ok(store.products.clone())
    }

    async fn set_product_active(
        &self,
        serial_number: &str,
        active: bool,
    ) -> UpstreamResult<Product> {
        let mut store = self.lock();
        store.take_failure()?;
        let product = store
            .products
            .iter_mut()
            .find(|p| p.serial_number == serial_number)
            .ok_or_else(|| UpstreamError::NotFound(format!("Product {serial_number}")))?;
        product.active = active;
        Ok(product.clone())
    }

    async fn list_quotations(&self) -> UpstreamResult<Vec<Quotation>> {
        let mut store = self.lock();
        store.take_failure()?;
        Ok(store.quotations.clone())
    }

    async fn create_quotation(&self, draft: &OrderDraft) -> UpstreamResult<Quotation> {
        let mut store = self.lock();
        store.take_failure()?;
        if draft.products.is_empty() {
            return Err(rejected("Quotation must contain at least one product".to_string()));
        }
        let quotation = Quotation {
            id: store.next_id("qt"),
            customer: draft.customer.clone(),
            status: QuotationStatus::Pending,
            products: draft.products.clone(),
            charges: draft.charges,
            total: round2(draft.total),
            created_at: Utc::now(),
        };
        store.quotations.insert(0, quotation.clone());
        Ok(quotation)
    }

    async fn update_quotation(&self, id: &str, draft: &OrderDraft) -> UpstreamResult<Quotation> {
        let mut store = self.lock();
        store.take_failure()?;
        let quotation = store.quotation_mut(id)?;
        lifecycle::check_quotation(quotation, QuotationAction::Edit).map_err(refused)?;
        quotation.customer = draft.customer.clone();
        quotation.products = draft.products.clone();
        quotation.charges = draft.charges;
        quotation.total = round2(draft.total);
        Ok(quotation.clone())
    }

    async fn book_quotation(&self, id: &str) -> UpstreamResult<Booking> {
        let mut store = self.lock();
        store.take_failure()?;
        let quotation = store.quotation_mut(id)?;
        lifecycle::check_quotation(quotation, QuotationAction::Book).map_err(refused)?;
        let draft = OrderDraft {
            customer: quotation.customer.clone(),
            products: quotation.products.clone(),
            charges: quotation.charges,
            total: quotation.total,
        };
        let booking = store.insert_booking(draft.products.clone(), &draft)?;
        store.quotation_mut(id)?.status = QuotationStatus::Booked;
        Ok(booking)
    }

    async fn cancel_quotation(&self, id: &str) -> UpstreamResult<Quotation> {
        let mut store = self.lock();
        store.take_failure()?;
        let quotation = store.quotation_mut(id)?;
        lifecycle::check_quotation(quotation, QuotationAction::Cancel).map_err(refused)?;
        quotation.status = QuotationStatus::Canceled;
        Ok(quotation.clone())
    }

    async fn quotation_pdf(&self, id: &str) -> UpstreamResult<Vec<u8>> {
        let mut store = self.lock();
        store.take_failure()?;
        store.quotation_mut(id)?;
        Ok(placeholder_pdf("quotation", id))
    }

    async fn list_bookings(&self) -> UpstreamResult<Vec<Booking>> {
        let mut store = self.lock();
        store.take_failure()?;
        Ok(store.bookings.clone())
    }

    async fn create_booking(&self, draft: &OrderDraft) -> UpstreamResult<Booking> {
        let mut store = self.lock();
        store.take_failure()?;
        store.insert_booking(draft.products.clone(), draft)
    }

    async fn record_payment(&self, id: &str, payment: &NewPayment) -> UpstreamResult<Booking> {
        let mut store = self.lock();
        store.take_failure()?;
        let booking = store.booking_mut(id)?;
        lifecycle::validate_payment(booking, payment).map_err(refused)?;

        booking.amount_paid = round2(booking.amount_paid + payment.amount).min(booking.total);
        booking.transactions.push(PaymentTransaction {
            method: payment.method,
            amount: round2(payment.amount),
            admin: payment.admin.trim().to_string(),
            paid_at: Utc::now(),
        });
        if booking.balance() <= 0.0 {
            booking.status = BookingStatus::Paid;
        }
        Ok(booking.clone())
    }

    async fn dispatch_booking(&self, id: &str, lines: &[DispatchLine]) -> UpstreamResult<Booking> {
        let mut store = self.lock();
        store.take_failure()?;
        let booking = store.booking_mut(id)?;
        lifecycle::validate_dispatch(booking, lines).map_err(refused)?;

        for requested in lines {
            if let Some(line) = booking
                .products
                .iter_mut()
                .find(|l| l.line.serial_number == requested.serial_number)
            {
                line.dispatched_qty += requested.quantity;
            }
        }
        booking.status = BookingStatus::Dispatched;
        Ok(booking.clone())
    }

    async fn deliver_booking(&self, id: &str) -> UpstreamResult<Booking> {
        let mut store = self.lock();
        store.take_failure()?;
        let booking = store.booking_mut(id)?;
        lifecycle::validate_delivery(booking).map_err(refused)?;
        booking.status = BookingStatus::Delivered;
        Ok(booking.clone())
    }

    async fn booking_pdf(&self, id: &str) -> UpstreamResult<Vec<u8>> {
        let mut store = self.lock();
        store.take_failure()?;
        store.booking_mut(id)?;
        Ok(placeholder_pdf("invoice", id))
    }
}
