use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::QuotationStatus;
use crate::models::customer::Customer;
use crate::models::order::OrderLine;
use crate::pricing::{compute_totals, lenient, ExtraCharges, Totals};
use crate::snapshot::Keyed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: String,
    pub customer: Customer,
    pub status: QuotationStatus,
    pub products: Vec<OrderLine>,
    #[serde(default)]
    pub charges: ExtraCharges,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

impl Quotation {
    pub fn totals(&self) -> Totals {
        compute_totals(&self.products, &self.charges)
    }
}

impl Keyed for Quotation {
    fn key(&self) -> &str {
        &self.id
    }
}
