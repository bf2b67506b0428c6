use serde::Serialize;

use crate::dtos::booking::BookingResponse;
use crate::lifecycle::QuotationAction;
use crate::models::quotation::Quotation;
use crate::pricing::Totals;

#[derive(Debug, Serialize)]
pub struct QuotationResponse {
    #[serde(flatten)]
    pub quotation: Quotation,
    pub totals: Totals,
    /// Buttons the view should enable.
    pub actions: Vec<QuotationAction>,
}

impl From<Quotation> for QuotationResponse {
    fn from(quotation: Quotation) -> Self {
        Self {
            totals: quotation.totals(),
            actions: quotation.status.actions(),
            quotation,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookQuotationResponse {
    pub quotation: Option<QuotationResponse>,
    pub booking: BookingResponse,
    /// Where the view downloads the invoice from.
    pub invoice_url: String,
}
