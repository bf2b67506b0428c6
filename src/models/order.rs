use serde::{Deserialize, Serialize};

use crate::models::customer::Customer;
use crate::pricing::{lenient, ExtraCharges, Priced};

/// One product row of a submitted quotation or booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub serial_number: String,
    pub product_name: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub per: String,
    #[serde(deserialize_with = "lenient::f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub discount: f64,
    #[serde(deserialize_with = "lenient::u32")]
    pub quantity: u32,
}

impl Priced for OrderLine {
    fn unit_price(&self) -> f64 {
        self.price
    }

    fn discount_percent(&self) -> f64 {
        self.discount
    }

    fn quantity(&self) -> f64 {
        self.quantity as f64
    }
}

/// Body sent upstream when a cart is submitted as a quotation or booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer: Customer,
    pub products: Vec<OrderLine>,
    pub charges: ExtraCharges,
    pub total: f64,
}

/// Quantity of one booking line shipped in a single dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchLine {
    pub serial_number: String,
    #[serde(deserialize_with = "lenient::u32")]
    pub quantity: u32,
}
