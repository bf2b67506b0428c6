//! The order backend the console talks to. It owns products, quotations and
//! bookings; the console only requests changes and mirrors the results.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::booking::{Booking, NewPayment};
use crate::models::order::{DispatchLine, OrderDraft};
use crate::models::product::Product;
use crate::models::quotation::Quotation;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream request failed: {0}")]
    Request(String),

    /// The backend answered with an error; `message` is what it said.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Failed to parse upstream response: {0}")]
    Parse(String),
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[async_trait]
pub trait Upstream: Send + Sync {
    async fn list_products(&self) -> UpstreamResult<Vec<Product>>;

    async fn set_product_active(
        &self,
        serial_number: &str,
        active: bool,
    ) -> UpstreamResult<Product>;

    async fn list_quotations(&self) -> UpstreamResult<Vec<Quotation>>;

    async fn create_quotation(&self, draft: &OrderDraft) -> UpstreamResult<Quotation>;

    async fn update_quotation(&self, id: &str, draft: &OrderDraft) -> UpstreamResult<Quotation>;

    /// Converts a pending quotation into a booking.
    async fn book_quotation(&self, id: &str) -> UpstreamResult<Booking>;

    async fn cancel_quotation(&self, id: &str) -> UpstreamResult<Quotation>;

    async fn quotation_pdf(&self, id: &str) -> UpstreamResult<Vec<u8>>;

    async fn list_bookings(&self) -> UpstreamResult<Vec<Booking>>;

    async fn create_booking(&self, draft: &OrderDraft) -> UpstreamResult<Booking>;

    async fn record_payment(&self, id: &str, payment: &NewPayment) -> UpstreamResult<Booking>;

    async fn dispatch_booking(&self, id: &str, lines: &[DispatchLine]) -> UpstreamResult<Booking>;

    async fn deliver_booking(&self, id: &str) -> UpstreamResult<Booking>;

    async fn booking_pdf(&self, id: &str) -> UpstreamResult<Vec<u8>>;
}
